//! On-disk state for external readers.
//!
//! This module provides:
//! - The JSONL resolution log (`HistoryLog`)
//! - The "latest card" slot (`current_card.txt` + `current_card.jpg`)

pub mod current_card;
pub mod history_log;

pub use current_card::{clear_current_card, write_current_card};
pub use history_log::HistoryLog;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub const HISTORY_FILE: &str = "history.jsonl";
pub const CURRENT_CARD_TXT: &str = "current_card.txt";
pub const CURRENT_CARD_IMG: &str = "current_card.jpg";
