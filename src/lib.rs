//! Card Scanner
//!
//! Watches a stream of frames for a trading card, reads its name with
//! Tesseract, looks it up on Scryfall / PokéTCG and keeps the latest card
//! and a history of resolved cards on disk.
//!
//! A presentation layer reads [`pipeline::SharedState`] for the current
//! card, the latest raw and annotated frame, and the history.

pub mod capture;
pub mod config;
pub mod logging;
pub mod lookup;
pub mod notify;
pub mod ocr;
pub mod paths;
pub mod persist;
pub mod pipeline;
pub mod vision;
