use anyhow::{Context, Result};
use image::RgbImage;
use std::path::{Path, PathBuf};

use super::{Frame, FrameSource};

/// A single image, delivered once or (looping) on every pull.
pub struct StillImageSource {
    path: PathBuf,
    image: RgbImage,
    looping: bool,
    next_index: u64,
}

impl StillImageSource {
    pub fn open(path: &Path, looping: bool) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("Failed to open image {}", path.display()))?
            .to_rgb8();
        Ok(Self {
            path: path.to_path_buf(),
            image,
            looping,
            next_index: 0,
        })
    }
}

impl FrameSource for StillImageSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.next_index > 0 && !self.looping {
            return Ok(None);
        }
        let frame = Frame::new(self.next_index, self.image.clone());
        self.next_index += 1;
        Ok(Some(frame))
    }

    fn describe(&self) -> String {
        format!("{} (still)", self.path.display())
    }
}
