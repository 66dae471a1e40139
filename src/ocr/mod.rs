pub mod engine;
pub mod preprocess;
pub mod setup;

pub use engine::{OcrEngine, OcrError, PageSegMode, TesseractEngine};
pub use setup::locate_tesseract;

use image::RgbImage;
use regex::Regex;
use std::sync::OnceLock;

use crate::config::OcrConfig;
use preprocess::{crop_name_band, prepare_for_ocr};

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[ \t\x0B\x0C\r]+").expect("valid regex"))
}

/// Collapses runs of horizontal whitespace and drops blank lines.
pub fn clean_text(raw: &str) -> String {
    raw.lines()
        .map(|line| whitespace_regex().replace_all(line.trim(), " ").into_owned())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The first line of cleaned text, which is where the card title lands.
pub fn name_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

/// Two-pass text extraction over a rectified card.
///
/// The title band is tried first with single-line OCR; if that yields
/// nothing, the whole card is read as a block.
pub struct TextExtractor {
    engine: Box<dyn OcrEngine>,
    config: OcrConfig,
}

impl TextExtractor {
    pub fn new(engine: Box<dyn OcrEngine>, config: OcrConfig) -> Self {
        Self { engine, config }
    }

    /// Returns cleaned text, possibly empty. Engine failures propagate.
    pub fn extract(&self, card: &RgbImage) -> Result<String, OcrError> {
        let band = crop_name_band(card, self.config.name_band_ratio, self.config.name_band_min_px);
        let prepared = prepare_for_ocr(&band, self.config.upscale);
        let text = clean_text(&self.engine.recognize(&prepared, PageSegMode::SingleLine)?);
        if !text.is_empty() {
            log::debug!("OCR name band: {:?}", text);
            return Ok(text);
        }

        let prepared = prepare_for_ocr(card, self.config.upscale);
        let text = clean_text(&self.engine.recognize(&prepared, PageSegMode::Block)?);
        log::debug!("OCR full card: {:?}", text);
        Ok(text)
    }
}
