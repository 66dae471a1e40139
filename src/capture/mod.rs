//! Frame acquisition.
//!
//! This module provides:
//! - The `Frame` handed to the pipeline once per tick
//! - The pull-style `FrameSource` trait
//! - Directory-of-images and single-image sources (`open_source`)

pub mod sequence;
pub mod still;

pub use sequence::ImageSequenceSource;
pub use still::StillImageSource;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use image::RgbImage;
use std::path::Path;

/// One decoded 8-bit RGB frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position in the stream (0-based)
    pub index: u64,
    pub captured_at: DateTime<Local>,
    pub image: RgbImage,
}

impl Frame {
    pub fn new(index: u64, image: RgbImage) -> Self {
        Self {
            index,
            captured_at: Local::now(),
            image,
        }
    }
}

/// A pull source of frames.
pub trait FrameSource: Send {
    /// Returns the next frame, `Ok(None)` at end of stream.
    ///
    /// An error means this frame could not be read; later calls may succeed.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// Opens a directory as an image sequence, or a file as a still image.
///
/// Failing to open the source is the one fatal pipeline error.
pub fn open_source(path: &Path, looping: bool) -> Result<Box<dyn FrameSource>> {
    if path.is_dir() {
        Ok(Box::new(ImageSequenceSource::open(path, looping)?))
    } else if path.is_file() {
        Ok(Box::new(StillImageSource::open(path, looping)?))
    } else {
        Err(anyhow!("Frame source {} does not exist", path.display()))
    }
}
