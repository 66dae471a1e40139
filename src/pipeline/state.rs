//! Published pipeline state.
//!
//! One writer per slot (capture thread for frames, lookup thread for
//! cards), any number of readers. Slots hold `Arc` snapshots that are
//! swapped whole, so a reader sees either the old value or the new one.

use chrono::{DateTime, Local};
use image::RgbImage;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::history::{History, HistoryEntry};
use crate::lookup::CardRecord;

/// The most recently resolved card.
#[derive(Clone, Debug)]
pub struct CurrentCard {
    pub record: CardRecord,
    /// Recognized text that resolved to this card
    pub query: String,
    pub resolved_at: DateTime<Local>,
}

/// The most recent frame and its outlined copy.
#[derive(Debug)]
pub struct FrameSnapshot {
    pub index: u64,
    pub captured_at: DateTime<Local>,
    pub raw: RgbImage,
    /// Present when a card outline was detected
    pub annotated: Option<RgbImage>,
}

impl FrameSnapshot {
    /// The image a display layer should show.
    pub fn display_image(&self) -> &RgbImage {
        self.annotated.as_ref().unwrap_or(&self.raw)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct SharedState {
    card: Mutex<Option<Arc<CurrentCard>>>,
    frame: Mutex<Option<Arc<FrameSnapshot>>>,
    history: Mutex<History>,
}

impl SharedState {
    pub fn new(history: History) -> Self {
        Self {
            card: Mutex::new(None),
            frame: Mutex::new(None),
            history: Mutex::new(history),
        }
    }

    pub fn current_card(&self) -> Option<Arc<CurrentCard>> {
        lock(&self.card).clone()
    }

    pub fn current_frame(&self) -> Option<Arc<FrameSnapshot>> {
        lock(&self.frame).clone()
    }

    pub fn publish_frame(&self, frame: Arc<FrameSnapshot>) {
        *lock(&self.frame) = Some(frame);
    }

    /// Replaces the current card and appends it to the history.
    pub fn publish_card(&self, card: CurrentCard) -> HistoryEntry {
        let entry = HistoryEntry {
            timestamp: card.resolved_at,
            card: card.record.clone(),
        };

        let mut current = lock(&self.card);
        let mut history = lock(&self.history);
        *current = Some(Arc::new(card));
        history.push(entry.clone());
        entry
    }

    /// Oldest-first copy of the history.
    pub fn history(&self) -> Vec<HistoryEntry> {
        lock(&self.history).to_vec()
    }

    pub fn history_len(&self) -> usize {
        lock(&self.history).len()
    }

    /// Human-readable summary, as a presentation layer would show it.
    pub fn status_line(&self) -> String {
        match self.current_card() {
            Some(card) => format!("{} ({})", card.record.name, card.record.game),
            None => "No card detected".to_string(),
        }
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new(History::new(500))
    }
}
