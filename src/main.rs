//! Command-line entry point for the card scanner.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use card_scanner::{capture, logging, paths};
use card_scanner::config::ScannerConfig;
use card_scanner::lookup::LookupResolver;
use card_scanner::notify::Notifier;
use card_scanner::ocr::{self, TesseractEngine, TextExtractor};
use card_scanner::persist::{self, HistoryLog, HISTORY_FILE};
use card_scanner::pipeline::{
    create_lookup_queue, run_pipeline, spawn_quit_listener, Coordinator, History, LookupWorker,
    Persistence, SharedState,
};

#[derive(Parser, Debug)]
#[command(name = "card-scanner", version, about = "Recognize trading cards in a frame stream")]
struct Cli {
    /// Config file (default: config.json next to the executable)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of frames or a single image
    #[arg(long)]
    source: Option<PathBuf>,

    /// auto, magic or pokemon
    #[arg(long)]
    game: Option<String>,

    /// URL that receives a POST for every resolved card
    #[arg(long)]
    callback: Option<String>,

    /// Restart the source at end of stream
    #[arg(long = "loop")]
    loop_source: bool,

    /// Output directory for history, current card and logs
    #[arg(long)]
    output: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

/// Loads the config file; a missing default file means defaults.
fn load_config(cli: &Cli) -> Result<(ScannerConfig, String)> {
    match &cli.config {
        Some(path) => Ok((
            ScannerConfig::load(path)?,
            format!("Loaded config from {}", path.display()),
        )),
        None => {
            let path = paths::default_config_path();
            if path.exists() {
                Ok((
                    ScannerConfig::load(&path)?,
                    format!("Loaded config from {}", path.display()),
                ))
            } else {
                Ok((
                    ScannerConfig::default(),
                    format!("No config at {}, using defaults", path.display()),
                ))
            }
        }
    }
}

fn apply_overrides(config: &mut ScannerConfig, cli: &Cli) {
    if let Some(source) = &cli.source {
        config.source = Some(source.clone());
    }
    if let Some(game) = &cli.game {
        config.game = game.clone();
    }
    if let Some(callback) = &cli.callback {
        config.callback_url = Some(callback.clone());
    }
    if let Some(output) = &cli.output {
        config.output_dir = output.clone();
    }
    if cli.loop_source {
        config.loop_source = true;
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, config_note) = load_config(&cli)?;
    apply_overrides(&mut config, &cli);

    paths::ensure_directories(&config.output_dir).with_context(|| {
        format!("Failed to create output directory {}", config.output_dir.display())
    })?;
    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    logging::init(level, &paths::log_file(&config.output_dir));

    log::info!("Card Scanner v{}", env!("CARGO_PKG_VERSION"));
    log::info!("{}", config_note);
    log::info!("Output: {}", config.output_dir.display());

    let hint = config.game_hint()?;

    let source_path = config
        .source
        .clone()
        .ok_or_else(|| anyhow!("No frame source: pass --source or set \"source\" in the config"))?;
    let source = capture::open_source(&source_path, config.loop_source)?;

    // Without an OCR engine no card can ever be read
    let tesseract = ocr::locate_tesseract(&config.ocr).context("OCR engine unavailable")?;
    let engine = TesseractEngine::new(tesseract, config.ocr.language.clone());
    let extractor = TextExtractor::new(Box::new(engine), config.ocr.clone());

    let resolver = LookupResolver::from_config(&config)?;

    let history_path = config.output_dir.join(HISTORY_FILE);
    let history_log = match HistoryLog::open(&history_path, config.history_retention) {
        Ok(log) => Some(log),
        Err(e) => {
            log::warn!("History log {} unavailable, not recording: {}", history_path.display(), e);
            None
        }
    };
    let previous = match &history_log {
        Some(history) => history.load().unwrap_or_else(|e| {
            log::warn!("Could not read previous history: {}", e);
            Vec::new()
        }),
        None => Vec::new(),
    };
    log::info!("History: {} previous entries", previous.len());
    let state = Arc::new(SharedState::new(History::with_entries(
        config.history_retention,
        previous,
    )));

    if let Err(e) = persist::clear_current_card(&config.output_dir) {
        log::warn!("Could not reset current card files: {}", e);
    }

    let (sender, receiver) = create_lookup_queue(config.queue_capacity);
    let coordinator = Coordinator::new(&config, hint, extractor, sender, state.clone());

    let mut worker = LookupWorker::new(resolver, state.clone(), config.cooldown(), config.seen_ttl())
        .with_persistence(Persistence::new(config.output_dir.clone(), history_log));
    if let Some(url) = &config.callback_url {
        log::info!("Callback: {}", url);
        worker = worker.with_notifier(Notifier::new(url.clone(), config.lookup.timeout())?);
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    spawn_quit_listener(shutdown.clone());
    log::info!("Type q + Enter to stop");

    run_pipeline(
        source,
        coordinator,
        worker,
        receiver,
        config.frame_interval(),
        shutdown,
    );

    if let Some(frame) = state.current_frame() {
        log::info!("Last frame: {} (card outlined: {})", frame.index, frame.annotated.is_some());
    }
    log::info!("Last card: {} ({} in history)", state.status_line(), state.history_len());
    Ok(())
}
