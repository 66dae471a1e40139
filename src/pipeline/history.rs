use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::lookup::CardRecord;

/// One resolved card, as logged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub card: CardRecord,
}

impl HistoryEntry {
    pub fn new(card: CardRecord) -> Self {
        Self {
            timestamp: Local::now(),
            card,
        }
    }
}

/// Append-only, oldest-first log capped at `retention` entries.
#[derive(Debug)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    retention: usize,
}

impl History {
    pub fn new(retention: usize) -> Self {
        let retention = retention.max(1);
        Self {
            entries: VecDeque::with_capacity(retention.min(1024)),
            retention,
        }
    }

    /// Seeds from previously persisted entries (oldest first).
    pub fn with_entries(retention: usize, entries: impl IntoIterator<Item = HistoryEntry>) -> Self {
        let mut history = Self::new(retention);
        for entry in entries {
            history.push(entry);
        }
        history
    }

    /// Appends an entry; returns the oldest one if it fell off.
    pub fn push(&mut self, entry: HistoryEntry) -> Option<HistoryEntry> {
        self.entries.push_back(entry);
        if self.entries.len() > self.retention {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}
