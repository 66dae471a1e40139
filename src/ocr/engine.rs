use image::GrayImage;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;
use thiserror::Error;

use super::setup::TesseractPaths;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR engine not found: {0}")]
    EngineNotFound(String),
    #[error("OCR I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write OCR input image: {0}")]
    Image(#[from] image::ImageError),
    #[error("Tesseract failed: {0}")]
    EngineFailed(String),
}

/// Layout assumption passed to the recognizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageSegMode {
    /// A single text line (title band)
    SingleLine,
    /// A uniform block of text (whole card)
    Block,
}

impl PageSegMode {
    /// Tesseract `--psm` value.
    pub fn psm(&self) -> &'static str {
        match self {
            PageSegMode::SingleLine => "7",
            PageSegMode::Block => "6",
        }
    }
}

/// Recognizes text in a preprocessed (binarized) image.
pub trait OcrEngine: Send {
    fn recognize(&self, image: &GrayImage, mode: PageSegMode) -> Result<String, OcrError>;
}

/// Runs the `tesseract` command-line tool.
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata: Option<PathBuf>,
    language: String,
}

impl TesseractEngine {
    pub fn new(paths: TesseractPaths, language: impl Into<String>) -> Self {
        Self {
            executable: paths.executable,
            tessdata: paths.tessdata,
            language: language.into(),
        }
    }

    fn command(&self, input: &std::path::Path, mode: PageSegMode) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(input).arg("stdout");
        if let Some(tessdata) = &self.tessdata {
            cmd.arg("--tessdata-dir").arg(tessdata);
        }
        cmd.arg("-l").arg(&self.language).arg("--psm").arg(mode.psm());
        cmd
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image: &GrayImage, mode: PageSegMode) -> Result<String, OcrError> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        image.save(temp_input.path())?;

        let output = self.command(temp_input.path(), mode).output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::EngineFailed(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
