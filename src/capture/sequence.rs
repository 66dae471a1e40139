use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::{Frame, FrameSource};

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Plays the images in a directory in file-name order.
pub struct ImageSequenceSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    position: usize,
    looping: bool,
    next_index: u64,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path, looping: bool) -> Result<Self> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .with_context(|| format!("Failed to read frame directory {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_image(path))
            .collect();

        if files.is_empty() {
            return Err(anyhow!("No images found in {}", dir.display()));
        }
        files.sort();

        Ok(Self {
            dir: dir.to_path_buf(),
            files,
            position: 0,
            looping,
            next_index: 0,
        })
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.position >= self.files.len() {
            if !self.looping {
                return Ok(None);
            }
            self.position = 0;
        }

        let path = &self.files[self.position];
        self.position += 1;
        let index = self.next_index;
        self.next_index += 1;

        let image = image::open(path)
            .with_context(|| format!("Failed to decode frame {}", path.display()))?
            .to_rgb8();
        Ok(Some(Frame::new(index, image)))
    }

    fn describe(&self) -> String {
        format!("{} ({} images)", self.dir.display(), self.files.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    fn write_frames(dir: &Path, names: &[&str]) {
        for (i, name) in names.iter().enumerate() {
            RgbImage::from_pixel(4, 4, Rgb([i as u8 * 10, 0, 0]))
                .save(dir.join(name))
                .unwrap();
        }
    }

    #[test]
    fn test_plays_in_name_order_then_ends() {
        let dir = tempdir().unwrap();
        // Written out of order on purpose
        write_frames(dir.path(), &["b.png", "a.png"]);
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut source = ImageSequenceSource::open(dir.path(), false).unwrap();
        assert!(source.describe().contains("2 images"));

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.image.get_pixel(0, 0)[0], 10); // a.png
        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.index, 1);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_looping_restarts() {
        let dir = tempdir().unwrap();
        write_frames(dir.path(), &["only.png"]);

        let mut source = ImageSequenceSource::open(dir.path(), true).unwrap();
        for expected in 0..3 {
            assert_eq!(source.next_frame().unwrap().unwrap().index, expected);
        }
    }

    #[test]
    fn test_empty_directory_fails_to_open() {
        let dir = tempdir().unwrap();
        assert!(ImageSequenceSource::open(dir.path(), false).is_err());
    }

    #[test]
    fn test_corrupt_frame_is_error_not_end() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"not a png").unwrap();
        write_frames(dir.path(), &["b.png"]);

        let mut source = ImageSequenceSource::open(dir.path(), false).unwrap();
        assert!(source.next_frame().is_err());
        assert!(source.next_frame().unwrap().is_some());
    }
}
