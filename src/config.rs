//! Scanner configuration.
//!
//! Loaded from a JSON file at startup; every field has a default so a
//! partial (or missing) file is fine. Command-line flags override values
//! from the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::lookup::{Game, GameHint};

/// Geometric detector tuning.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Minimum enclosed contour area in pixels
    pub min_area: f64,
    /// Polygon approximation tolerance as a fraction of the contour perimeter
    pub approx_epsilon_ratio: f64,
    /// Gaussian blur sigma (1.1 matches a 5x5 kernel)
    pub blur_sigma: f32,
    /// Canny hysteresis thresholds
    pub canny_low: f32,
    pub canny_high: f32,
    /// Dilation radius (square kernel of side 2r+1)
    pub dilate_radius: u8,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_area: 5000.0,
            approx_epsilon_ratio: 0.02,
            blur_sigma: 1.1,
            canny_low: 50.0,
            canny_high: 150.0,
            dilate_radius: 2,
        }
    }
}

/// Text extraction settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Fraction of the card height holding the title
    pub name_band_ratio: f32,
    /// Lower bound for the title band height in pixels
    pub name_band_min_px: u32,
    /// Upscale factor applied before binarization
    pub upscale: f32,
    /// Tesseract language code
    pub language: String,
    /// Explicit tesseract executable (otherwise searched)
    pub tesseract_path: Option<PathBuf>,
    /// Explicit tessdata directory (otherwise searched)
    pub tessdata_dir: Option<PathBuf>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            name_band_ratio: 0.20,
            name_band_min_px: 20,
            upscale: 2.0,
            language: "eng".to_string(),
            tesseract_path: None,
            tessdata_dir: None,
        }
    }
}

/// Provider transport settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Attempts per provider call (including the first)
    pub max_attempts: u32,
    /// Backoff step; attempt n waits n * step before retrying
    pub backoff_ms: u64,
    /// Per-request timeout
    pub timeout_ms: u64,
    /// PokéTCG API key (falls back to POKEMON_TCG_KEY)
    pub pokemon_api_key: Option<String>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff_ms: 1000,
            timeout_ms: 5000,
            pokemon_api_key: None,
        }
    }
}

impl LookupConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn backoff_step(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Configured key, or the POKEMON_TCG_KEY environment variable.
    pub fn resolved_pokemon_key(&self) -> Option<String> {
        self.pokemon_api_key
            .clone()
            .or_else(|| std::env::var("POKEMON_TCG_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

/// Complete scanner configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Frame directory or single image file
    pub source: Option<PathBuf>,
    /// Delay between captured frames (0 = as fast as possible)
    pub frame_interval_ms: u64,
    /// Restart the source from the beginning at end-of-stream
    pub loop_source: bool,
    /// "auto", "magic" or "pokemon"
    pub game: String,
    /// Provider priority under "auto"
    pub providers: Vec<Game>,
    pub detector: DetectorConfig,
    pub ocr: OcrConfig,
    /// Recognized names shorter than this are not looked up
    pub min_text_len: usize,
    /// Minimum time between lookups of an unchanged name
    pub cooldown_ms: u64,
    /// History entries kept in memory and on disk
    pub history_retention: usize,
    /// Pending lookups buffered between capture and lookup threads
    pub queue_capacity: usize,
    pub lookup: LookupConfig,
    /// Resolution cache lifetime; None keeps entries for the whole run
    pub seen_ttl_secs: Option<u64>,
    /// Optional URL receiving a POST on every resolved card
    pub callback_url: Option<String>,
    /// Root for history, current-card files and logs
    pub output_dir: PathBuf,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            source: None,
            frame_interval_ms: 0,
            loop_source: false,
            game: "auto".to_string(),
            providers: vec![Game::Magic, Game::Pokemon],
            detector: DetectorConfig::default(),
            ocr: OcrConfig::default(),
            min_text_len: 3,
            cooldown_ms: 2000,
            history_retention: 500,
            queue_capacity: 32,
            lookup: LookupConfig::default(),
            seen_ttl_secs: None,
            callback_url: None,
            output_dir: crate::paths::default_output_dir(),
        }
    }
}

impl ScannerConfig {
    /// Reads and parses a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Parses the `game` field.
    pub fn game_hint(&self) -> Result<GameHint> {
        self.game
            .parse()
            .with_context(|| format!("Invalid game setting '{}'", self.game))
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn seen_ttl(&self) -> Option<Duration> {
        self.seen_ttl_secs.map(Duration::from_secs)
    }
}
