//! Capture-side tick: frame → outline → rectified card → name → queue.
//!
//! Every tick ends in one of three states. `Idle` when no card outline
//! was found (or it could not be rectified), `Suppressed` when a card was
//! seen but nothing was queued, `LookupPending` when a name was handed to
//! the lookup thread. Failures inside a tick are logged and never escape it.

use image::RgbImage;
use std::fmt;
use std::sync::mpsc::{SyncSender, TrySendError};
use std::sync::Arc;
use std::time::Instant;

use super::cooldown::DedupeCooldown;
use super::queue::LookupRequest;
use super::state::{FrameSnapshot, SharedState};
use crate::capture::Frame;
use crate::config::ScannerConfig;
use crate::lookup::GameHint;
use crate::ocr::{name_line, TextExtractor};
use crate::vision::{annotate_outline, rectify, CardDetector, Quadrilateral};

/// Why a detected card did not produce a lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum SuppressReason {
    /// OCR produced no usable text (or the engine failed)
    RecognitionEmpty,
    /// Name shorter than the configured minimum
    TextTooShort(String),
    /// Same name as the last lookup, still inside the cooldown window
    Cooldown(String),
    /// Lookup thread is behind; request dropped
    QueueFull(String),
    /// Lookup thread is gone
    QueueClosed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickState {
    Idle,
    Suppressed(SuppressReason),
    LookupPending(String),
}

impl fmt::Display for TickState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickState::Idle => write!(f, "Idle"),
            TickState::Suppressed(SuppressReason::RecognitionEmpty) => write!(f, "Suppressed: no text"),
            TickState::Suppressed(SuppressReason::TextTooShort(t)) => {
                write!(f, "Suppressed: text too short ({:?})", t)
            }
            TickState::Suppressed(SuppressReason::Cooldown(n)) => write!(f, "Suppressed: cooldown ({})", n),
            TickState::Suppressed(SuppressReason::QueueFull(n)) => write!(f, "Suppressed: queue full ({})", n),
            TickState::Suppressed(SuppressReason::QueueClosed) => write!(f, "Suppressed: lookup stopped"),
            TickState::LookupPending(n) => write!(f, "Lookup pending: {}", n),
        }
    }
}

/// Producer half of the pipeline.
pub struct Coordinator {
    detector: CardDetector,
    extractor: TextExtractor,
    cooldown: DedupeCooldown,
    min_text_len: usize,
    hint: GameHint,
    sender: SyncSender<LookupRequest>,
    state: Arc<SharedState>,
}

impl Coordinator {
    pub fn new(
        config: &ScannerConfig,
        hint: GameHint,
        extractor: TextExtractor,
        sender: SyncSender<LookupRequest>,
        state: Arc<SharedState>,
    ) -> Self {
        Self {
            detector: CardDetector::new(config.detector.clone()),
            extractor,
            cooldown: DedupeCooldown::new(config.cooldown()),
            min_text_len: config.min_text_len,
            hint,
            sender,
            state,
        }
    }

    pub fn tick(&mut self, frame: Frame) -> TickState {
        self.tick_at(frame, Instant::now())
    }

    /// Runs one tick with an explicit clock reading for the cooldown.
    pub fn tick_at(&mut self, frame: Frame, now: Instant) -> TickState {
        let quad = self.detector.detect(&frame.image);
        let annotated = quad.as_ref().map(|q| annotate_outline(&frame.image, q));

        let snapshot = Arc::new(FrameSnapshot {
            index: frame.index,
            captured_at: frame.captured_at,
            raw: frame.image,
            annotated,
        });
        self.state.publish_frame(snapshot.clone());

        match quad {
            Some(quad) => self.read_card(&snapshot.raw, snapshot.index, &quad, now),
            None => TickState::Idle,
        }
    }

    /// Rectifies the outlined card, reads its name and queues the lookup.
    fn read_card(&mut self, image: &RgbImage, index: u64, quad: &Quadrilateral, now: Instant) -> TickState {
        let card = match rectify(image, quad) {
            Ok(card) => card,
            Err(e) => {
                log::warn!("Frame {}: rectification failed: {}", index, e);
                return TickState::Idle;
            }
        };

        let text = match self.extractor.extract(&card) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Frame {}: OCR failed: {}", index, e);
                return TickState::Suppressed(SuppressReason::RecognitionEmpty);
            }
        };

        let Some(name) = name_line(&text) else {
            return TickState::Suppressed(SuppressReason::RecognitionEmpty);
        };
        let name = name.to_string();
        log::debug!("Frame {}: read {:?}", index, name);

        if name.chars().count() < self.min_text_len {
            return TickState::Suppressed(SuppressReason::TextTooShort(name));
        }

        if !self.cooldown.should_lookup(&name, now) {
            return TickState::Suppressed(SuppressReason::Cooldown(name));
        }

        match self
            .sender
            .try_send(LookupRequest::new(name.clone(), self.hint, card))
        {
            Ok(()) => {
                self.cooldown.record(&name, now);
                log::info!("Queued lookup: {}", name);
                TickState::LookupPending(name)
            }
            Err(TrySendError::Full(_)) => {
                log::warn!("Lookup queue full, dropping {}", name);
                TickState::Suppressed(SuppressReason::QueueFull(name))
            }
            Err(TrySendError::Disconnected(_)) => TickState::Suppressed(SuppressReason::QueueClosed),
        }
    }
}
