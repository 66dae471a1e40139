use std::path::{Path, PathBuf};
use std::process::Command;

use super::engine::OcrError;
use crate::config::OcrConfig;

#[derive(Debug, Clone)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// None lets tesseract use its built-in data location
    pub tessdata: Option<PathBuf>,
}

#[cfg(windows)]
const EXE_NAME: &str = "tesseract.exe";
#[cfg(not(windows))]
const EXE_NAME: &str = "tesseract";

/// Returns the per-user directory for a bundled Tesseract install.
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("card-scanner")
        .join("tesseract")
}

/// Resolves the executable and language data for the configured language.
pub fn locate_tesseract(config: &OcrConfig) -> Result<TesseractPaths, OcrError> {
    let executable = find_tesseract_executable(config.tesseract_path.as_deref())?;
    let tessdata = find_tessdata_dir(config.tessdata_dir.as_deref(), &config.language);

    log::info!(
        "Tesseract: {} (tessdata: {})",
        executable.display(),
        tessdata
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "default".to_string())
    );

    Ok(TesseractPaths { executable, tessdata })
}

/// Finds the Tesseract executable: explicit path, local dir, then PATH.
pub fn find_tesseract_executable(explicit: Option<&Path>) -> Result<PathBuf, OcrError> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(OcrError::EngineNotFound(format!(
            "configured tesseract_path {} does not exist",
            path.display()
        )));
    }

    let local_exe = get_tesseract_dir().join(EXE_NAME);
    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = Command::new("tesseract").arg("--version").output() {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    // Check common install locations
    let common_paths = [
        r"C:\Program Files\Tesseract-OCR\tesseract.exe",
        r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
        "/usr/local/bin/tesseract",
        "/opt/homebrew/bin/tesseract",
    ];
    for path in &common_paths {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    Err(OcrError::EngineNotFound(
        "tesseract not found; install Tesseract-OCR or set ocr.tesseract_path".to_string(),
    ))
}

/// Finds a tessdata directory holding `<language>.traineddata`.
pub fn find_tessdata_dir(explicit: Option<&Path>, language: &str) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let data_file = format!("{}.traineddata", language);
    let mut candidates = vec![get_tesseract_dir().join("tessdata")];

    // TESSDATA_PREFIX may point at the data dir or its parent
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let prefix = PathBuf::from(prefix);
        candidates.push(prefix.join("tessdata"));
        candidates.push(prefix);
    }

    candidates.into_iter().find(|dir| dir.join(&data_file).exists())
}
