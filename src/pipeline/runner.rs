//! Pipeline runner - wires the capture loop to the lookup worker.
//!
//! The capture loop runs on the calling thread; the lookup worker gets its
//! own. The run ends at end of stream or when the shutdown flag is set.
//! In both cases the queue is closed, the worker finishes what it is doing,
//! and its thread is joined before returning.

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::coordinator::{Coordinator, TickState};
use super::queue::LookupRequest;
use super::worker::LookupWorker;
use crate::capture::FrameSource;

/// Minimum pause after a frame that could not be read.
const READ_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Counters for one run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub cards_detected: u64,
    pub lookups_queued: u64,
    pub read_errors: u64,
}

/// Pulls frames and ticks the coordinator until the source ends or
/// `shutdown` is set.
pub fn run_capture_loop(
    source: &mut dyn FrameSource,
    coordinator: &mut Coordinator,
    frame_interval: Duration,
    shutdown: &AtomicBool,
) -> RunSummary {
    let mut summary = RunSummary::default();

    while !shutdown.load(Ordering::SeqCst) {
        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("End of stream after {} frames", summary.frames);
                break;
            }
            Err(e) => {
                log::warn!("Skipping unreadable frame: {:#}", e);
                summary.read_errors += 1;
                thread::sleep(frame_interval.max(READ_ERROR_BACKOFF));
                continue;
            }
        };

        summary.frames += 1;
        let index = frame.index;
        let state = coordinator.tick(frame);
        match &state {
            TickState::Idle => {}
            TickState::LookupPending(_) => {
                summary.cards_detected += 1;
                summary.lookups_queued += 1;
            }
            TickState::Suppressed(_) => summary.cards_detected += 1,
        }
        log::debug!("Frame {}: {}", index, state);

        if !frame_interval.is_zero() {
            thread::sleep(frame_interval);
        }
    }

    summary
}

/// Runs the whole pipeline to completion.
///
/// Consumes the coordinator so its end of the queue is dropped once
/// capture stops; the worker then drains what is left and exits.
pub fn run_pipeline(
    mut source: Box<dyn FrameSource>,
    mut coordinator: Coordinator,
    worker: LookupWorker,
    receiver: Receiver<LookupRequest>,
    frame_interval: Duration,
    shutdown: Arc<AtomicBool>,
) -> RunSummary {
    log::info!("Starting pipeline on {}", source.describe());

    let worker_shutdown = shutdown.clone();
    let worker_handle = thread::spawn(move || worker.run(receiver, worker_shutdown));

    let summary = run_capture_loop(source.as_mut(), &mut coordinator, frame_interval, &shutdown);

    // Dropping the coordinator drops the sender and closes the queue
    drop(coordinator);

    log::info!("Waiting for lookup worker to finish...");
    if let Err(e) = worker_handle.join() {
        log::error!("Lookup worker thread panicked: {:?}", e);
    }

    log::info!(
        "Pipeline finished: {} frames, {} cards seen, {} lookups queued, {} unreadable frames",
        summary.frames,
        summary.cards_detected,
        summary.lookups_queued,
        summary.read_errors
    );
    summary
}

/// Sets `shutdown` when a line reading `q` arrives on stdin.
pub fn spawn_quit_listener(shutdown: Arc<AtomicBool>) {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) if line.trim().eq_ignore_ascii_case("q") => {
                    log::info!("Quit requested");
                    shutdown.store(true, Ordering::SeqCst);
                    break;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
    });
}
