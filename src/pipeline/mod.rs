//! The scanning pipeline.
//!
//! This module provides:
//! - Per-tick detection, recognition and dedup on the capture side (`Coordinator`)
//! - Resolution, publishing and persistence on the lookup side (`LookupWorker`)
//! - The queue between them and the published state readers use
//! - Thread wiring and shutdown (`run_pipeline`)

pub mod cooldown;
pub mod coordinator;
pub mod history;
pub mod queue;
pub mod runner;
pub mod state;
pub mod worker;

pub use coordinator::{Coordinator, SuppressReason, TickState};
pub use history::{History, HistoryEntry};
pub use queue::{create_lookup_queue, LookupRequest};
pub use runner::{run_pipeline, spawn_quit_listener, RunSummary};
pub use state::{CurrentCard, FrameSnapshot, SharedState};
pub use worker::{LookupWorker, Persistence, Resolution};
