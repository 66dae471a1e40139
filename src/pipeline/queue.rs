//! Work queue between the capture thread and the lookup thread.
//!
//! A bounded `sync_channel`: the capture side never blocks on a full queue
//! (it drops the request instead), the lookup side blocks while it is empty.

use chrono::{DateTime, Local};
use image::RgbImage;
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use crate::lookup::GameHint;

/// A recognized name waiting to be resolved.
#[derive(Debug, Clone)]
pub struct LookupRequest {
    /// Name line from the recognized text
    pub name: String,
    pub hint: GameHint,
    /// Rectified card the name was read from
    pub card_image: RgbImage,
    pub requested_at: DateTime<Local>,
}

impl LookupRequest {
    pub fn new(name: impl Into<String>, hint: GameHint, card_image: RgbImage) -> Self {
        Self {
            name: name.into(),
            hint,
            card_image,
            requested_at: Local::now(),
        }
    }
}

/// Creates a FIFO queue holding at most `capacity` pending requests.
pub fn create_lookup_queue(capacity: usize) -> (SyncSender<LookupRequest>, Receiver<LookupRequest>) {
    sync_channel(capacity.max(1))
}
