use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Default output directory: `<exe_dir>/output/`
pub fn default_output_dir() -> PathBuf {
    get_exe_dir().join("output")
}

/// Default config file: `<exe_dir>/config.json`
pub fn default_config_path() -> PathBuf {
    get_exe_dir().join("config.json")
}

/// Returns the logs directory: `<output>/logs/`
pub fn logs_dir(output_dir: &Path) -> PathBuf {
    output_dir.join("logs")
}

/// Returns the log file path: `<output>/logs/card_scanner.log`
pub fn log_file(output_dir: &Path) -> PathBuf {
    logs_dir(output_dir).join("card_scanner.log")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories(output_dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(output_dir)?;
    std::fs::create_dir_all(logs_dir(output_dir))?;
    Ok(())
}
