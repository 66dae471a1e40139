//! Lookup worker thread.
//!
//! Receives names from the capture thread, resolves them, and publishes
//! found cards to the shared state, the on-disk files and the optional
//! callback. A single worker handles requests strictly in queue order, so
//! the current card is always the last resolution to complete.

use chrono::Local;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::history::HistoryEntry;
use super::queue::LookupRequest;
use super::state::{CurrentCard, SharedState};
use crate::lookup::{CardRecord, GameHint, LookupOutcome, LookupResolver};
use crate::notify::Notifier;
use crate::persist::{write_current_card, HistoryLog};

/// How long the worker waits on an empty queue before rechecking shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Outcomes remembered per name, so a name is sent to the providers once.
///
/// Transport errors are never cached. Without a TTL, entries live for the
/// whole run.
pub struct ResolutionCache {
    entries: HashMap<(GameHint, String), (LookupOutcome, Instant)>,
    ttl: Option<Duration>,
}

impl ResolutionCache {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    fn key(hint: GameHint, name: &str) -> (GameHint, String) {
        (hint, name.trim().to_lowercase())
    }

    pub fn get(&mut self, hint: GameHint, name: &str, now: Instant) -> Option<LookupOutcome> {
        let key = Self::key(hint, name);
        let (outcome, stored_at) = self.entries.get(&key)?;

        if let Some(ttl) = self.ttl {
            if now.saturating_duration_since(*stored_at) >= ttl {
                self.entries.remove(&key);
                return None;
            }
        }
        Some(outcome.clone())
    }

    /// Stores `outcome` and drops every entry whose TTL has run out.
    pub fn insert(&mut self, hint: GameHint, name: &str, outcome: LookupOutcome, now: Instant) {
        if matches!(outcome, LookupOutcome::TransportError { .. }) {
            return;
        }
        if let Some(ttl) = self.ttl {
            self.entries
                .retain(|_, (_, stored_at)| now.saturating_duration_since(*stored_at) < ttl);
        }
        self.entries.insert(Self::key(hint, name), (outcome, now));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// What happened to one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Became the current card and was appended to the history
    Published(String),
    /// Found, but it is the card already shown
    Unchanged(String),
    /// No provider knows the name
    Miss,
    /// Providers failed; nothing published
    TransportError,
}

/// The current-card files plus, when available, `history.jsonl`.
pub struct Persistence {
    dir: PathBuf,
    log: Option<HistoryLog>,
}

impl Persistence {
    pub fn new(dir: PathBuf, log: Option<HistoryLog>) -> Self {
        Self { dir, log }
    }

    /// Appends to the history and overwrites the current-card files.
    /// Either write may fail without stopping the other.
    fn save(&mut self, entry: &HistoryEntry, card_image: &image::RgbImage) {
        if let Some(history) = &mut self.log {
            if let Err(e) = history.append(entry) {
                log::warn!("Failed to append '{}' to history: {}", entry.card.name, e);
            }
        }
        if let Err(e) = write_current_card(&self.dir, &entry.card, card_image) {
            log::warn!("Failed to write current card '{}': {}", entry.card.name, e);
        }
    }
}

pub struct LookupWorker {
    resolver: LookupResolver,
    state: Arc<SharedState>,
    cache: ResolutionCache,
    cooldown: Duration,
    /// Last time a provider call (not a cache hit) found a card
    last_lookup: Option<Instant>,
    persistence: Option<Persistence>,
    notifier: Option<Notifier>,
}

impl LookupWorker {
    pub fn new(
        resolver: LookupResolver,
        state: Arc<SharedState>,
        cooldown: Duration,
        cache_ttl: Option<Duration>,
    ) -> Self {
        Self {
            resolver,
            state,
            cache: ResolutionCache::new(cache_ttl),
            cooldown,
            last_lookup: None,
            persistence: None,
            notifier: None,
        }
    }

    pub fn with_persistence(mut self, persistence: Persistence) -> Self {
        self.persistence = Some(persistence);
        self
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn handle(&mut self, request: LookupRequest) -> Resolution {
        self.handle_at(request, Instant::now())
    }

    /// Resolves one request with an explicit clock reading.
    pub fn handle_at(&mut self, request: LookupRequest, now: Instant) -> Resolution {
        log::debug!(
            "Resolving '{}' (queued {} ms ago)",
            request.name,
            (Local::now() - request.requested_at).num_milliseconds()
        );

        let (outcome, fresh) = match self.cache.get(request.hint, &request.name, now) {
            Some(outcome) => {
                log::debug!("'{}' answered from cache", request.name);
                (outcome, false)
            }
            None => {
                let outcome = self.resolver.resolve(&request.name, request.hint);
                self.cache.insert(request.hint, &request.name, outcome.clone(), now);
                (outcome, true)
            }
        };

        match outcome {
            LookupOutcome::Found(record) => {
                let publish = self.should_publish(&record, fresh, now);
                if fresh {
                    self.last_lookup = Some(now);
                }
                if !publish {
                    log::debug!("'{}' is already the current card", record.name);
                    return Resolution::Unchanged(record.name);
                }
                let name = record.name.clone();
                self.publish(request, record);
                Resolution::Published(name)
            }
            LookupOutcome::NotFound { diagnostic } => {
                log::info!(
                    "No card matches '{}' ({})",
                    request.name,
                    diagnostic.as_deref().unwrap_or("not found")
                );
                Resolution::Miss
            }
            LookupOutcome::TransportError { diagnostic } => {
                log::warn!("Lookup of '{}' failed: {}", request.name, diagnostic);
                Resolution::TransportError
            }
        }
    }

    /// A different card is always shown. The current card is re-appended
    /// only by a fresh provider hit after the cooldown.
    fn should_publish(&self, record: &CardRecord, fresh: bool, now: Instant) -> bool {
        match self.state.current_card() {
            None => true,
            Some(current) if current.record.name != record.name => true,
            Some(_) => {
                fresh
                    && self
                        .last_lookup
                        .is_none_or(|at| now.saturating_duration_since(at) >= self.cooldown)
            }
        }
    }

    fn publish(&mut self, request: LookupRequest, record: CardRecord) {
        log::info!("Resolved '{}' -> {} ({})", request.name, record.name, record.game);

        let entry = self.state.publish_card(CurrentCard {
            record,
            query: request.name.clone(),
            resolved_at: Local::now(),
        });

        if let Some(persistence) = &mut self.persistence {
            persistence.save(&entry, &request.card_image);
        }

        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.send(&request.name, &entry.card) {
                log::warn!("{:#}", e);
            }
        }
    }

    /// Processes requests until the queue closes or `shutdown` is set.
    ///
    /// Blocks on the queue between requests; `shutdown` is checked at
    /// least every `POLL_INTERVAL`.
    pub fn run(mut self, receiver: Receiver<LookupRequest>, shutdown: Arc<AtomicBool>) {
        log::info!("Lookup worker started");

        loop {
            if shutdown.load(Ordering::SeqCst) {
                log::info!("Lookup worker: shutdown requested");
                break;
            }

            match receiver.recv_timeout(POLL_INTERVAL) {
                Ok(request) => {
                    self.handle(request);
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    log::info!("Lookup worker: queue closed");
                    break;
                }
            }
        }

        log::info!(
            "Lookup worker finished ({} names cached)",
            self.cache.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::tests::{record, MockProvider};
    use crate::lookup::{Game, ProviderError, ProviderResult, RetryPolicy};
    use crate::pipeline::queue::create_lookup_queue;
    use crate::persist::CURRENT_CARD_TXT;
    use image::RgbImage;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use tempfile::tempdir;

    const COOLDOWN: Duration = Duration::from_secs(2);

    fn request(name: &str) -> LookupRequest {
        LookupRequest::new(name, GameHint::Auto, RgbImage::new(10, 14))
    }

    fn worker_with(provider: MockProvider) -> (LookupWorker, Arc<AtomicUsize>, Arc<SharedState>) {
        let calls = provider.calls.clone();
        let state = Arc::new(SharedState::default());
        let resolver = LookupResolver::new(vec![Box::new(provider)], RetryPolicy::new(2, Duration::ZERO));
        let worker = LookupWorker::new(resolver, state.clone(), COOLDOWN, None);
        (worker, calls, state)
    }

    fn history_names(state: &SharedState) -> Vec<String> {
        state.history().into_iter().map(|e| e.card.name).collect()
    }

    #[test]
    fn test_black_lotus_becomes_current_card() {
        let (mut worker, _, state) = worker_with(MockProvider::echo(Game::Magic));

        assert_eq!(
            worker.handle(request("Black Lotus")),
            Resolution::Published("Black Lotus".to_string())
        );

        let current = state.current_card().unwrap();
        assert_eq!(current.record.name, "Black Lotus");
        assert_eq!(current.record.game, Game::Magic);
        assert_eq!(history_names(&state), vec!["Black Lotus"]);
    }

    #[test]
    fn test_repeated_name_looked_up_and_logged_once() {
        let (mut worker, calls, state) = worker_with(MockProvider::echo(Game::Magic));
        let start = Instant::now();

        worker.handle_at(request("Black Lotus"), start);
        let second = worker.handle_at(request("Black Lotus"), start + Duration::from_millis(300));

        assert_eq!(second, Resolution::Unchanged("Black Lotus".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.history_len(), 1);
    }

    #[test]
    fn test_different_names_both_resolved() {
        let (mut worker, calls, state) = worker_with(MockProvider::echo(Game::Magic));
        let start = Instant::now();

        worker.handle_at(request("Black Lotus"), start);
        worker.handle_at(request("Mox Pearl"), start + Duration::from_millis(100));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(history_names(&state), vec!["Black Lotus", "Mox Pearl"]);
        assert_eq!(state.current_card().unwrap().record.name, "Mox Pearl");
    }

    #[test]
    fn test_card_shown_again_comes_from_cache() {
        let (mut worker, calls, state) = worker_with(MockProvider::echo(Game::Magic));
        let start = Instant::now();

        worker.handle_at(request("Black Lotus"), start);
        worker.handle_at(request("Mox Pearl"), start + Duration::from_secs(1));
        let again = worker.handle_at(request("black lotus"), start + Duration::from_secs(2));

        assert_eq!(again, Resolution::Published("Black Lotus".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(state.history_len(), 3);
    }

    #[test]
    fn test_same_card_from_new_text_respects_cooldown() {
        // Two OCR readings that resolve to the same card
        let provider = MockProvider::new(
            Game::Magic,
            vec![ProviderResult::Found(record(Game::Magic, "Black Lotus"))],
        );
        let (mut worker, calls, state) = worker_with(provider);
        let start = Instant::now();

        worker.handle_at(request("Black Lotus"), start);
        assert_eq!(
            worker.handle_at(request("Black Lotu5"), start + Duration::from_secs(1)),
            Resolution::Unchanged("Black Lotus".to_string())
        );
        assert_eq!(
            worker.handle_at(request("B1ack Lotus"), start + Duration::from_secs(4)),
            Resolution::Published("Black Lotus".to_string())
        );

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(state.history_len(), 2);
    }

    #[test]
    fn test_miss_leaves_state_and_is_cached() {
        let provider = MockProvider::new(Game::Magic, vec![ProviderResult::NotFound { status: Some(404) }]);
        let (mut worker, calls, state) = worker_with(provider);

        assert_eq!(worker.handle(request("Xyzzy")), Resolution::Miss);
        assert_eq!(worker.handle(request("Xyzzy")), Resolution::Miss);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(state.current_card().is_none());
        assert_eq!(state.history_len(), 0);
    }

    #[test]
    fn test_transport_error_is_retried_on_next_request() {
        let provider = MockProvider::new(
            Game::Magic,
            vec![
                ProviderResult::Failed(ProviderError::Transport("reset".into())),
                ProviderResult::Failed(ProviderError::Transport("reset".into())),
                ProviderResult::Found(record(Game::Magic, "Black Lotus")),
            ],
        );
        let (mut worker, calls, state) = worker_with(provider);

        assert_eq!(worker.handle(request("Black Lotus")), Resolution::TransportError);
        assert!(state.current_card().is_none());

        assert_eq!(
            worker.handle(request("Black Lotus")),
            Resolution::Published("Black Lotus".to_string())
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_cache_ttl_expires_entries() {
        let mut cache = ResolutionCache::new(Some(Duration::from_secs(60)));
        let start = Instant::now();
        cache.insert(GameHint::Auto, "Pikachu", LookupOutcome::NotFound { diagnostic: None }, start);

        assert!(cache.get(GameHint::Auto, "PIKACHU ", start + Duration::from_secs(59)).is_some());
        assert!(cache.get(GameHint::Auto, "Pikachu", start + Duration::from_secs(60)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_insert_sweeps_expired_names() {
        let mut cache = ResolutionCache::new(Some(Duration::from_secs(60)));
        let start = Instant::now();
        cache.insert(GameHint::Auto, "Pikachv", LookupOutcome::NotFound { diagnostic: None }, start);
        cache.insert(GameHint::Auto, "Ch4rmander", LookupOutcome::NotFound { diagnostic: None }, start);
        assert_eq!(cache.len(), 2);

        cache.insert(
            GameHint::Auto,
            "Pikachu",
            LookupOutcome::Found(record(Game::Pokemon, "Pikachu")),
            start + Duration::from_secs(61),
        );

        assert_eq!(cache.len(), 1);
        assert!(cache.get(GameHint::Auto, "pikachu", start + Duration::from_secs(62)).is_some());
    }

    #[test]
    fn test_cache_skips_transport_errors_and_separates_hints() {
        let mut cache = ResolutionCache::new(None);
        let now = Instant::now();
        cache.insert(
            GameHint::Auto,
            "a",
            LookupOutcome::TransportError { diagnostic: "x".into() },
            now,
        );
        cache.insert(GameHint::Auto, "b", LookupOutcome::NotFound { diagnostic: None }, now);

        assert_eq!(cache.len(), 1);
        assert!(cache.get(GameHint::Only(Game::Pokemon), "b", now).is_none());
    }

    #[test]
    fn test_persists_history_and_current_card() {
        let dir = tempdir().unwrap();
        let log = HistoryLog::open(&dir.path().join("history.jsonl"), 10).unwrap();
        let (worker, _, _) = worker_with(MockProvider::echo(Game::Pokemon));
        let mut worker = worker.with_persistence(Persistence::new(dir.path().to_path_buf(), Some(log)));

        worker.handle(request("Pikachu"));

        let history = std::fs::read_to_string(dir.path().join("history.jsonl")).unwrap();
        assert_eq!(history.lines().count(), 1);
        let current = std::fs::read_to_string(dir.path().join(CURRENT_CARD_TXT)).unwrap();
        assert!(current.contains("name: Pikachu"));
    }

    #[test]
    fn test_persistence_failure_still_updates_state() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone");
        let log = HistoryLog::open(&missing.join("history.jsonl"), 10).unwrap();
        let (worker, _, state) = worker_with(MockProvider::echo(Game::Magic));
        let mut worker = worker.with_persistence(Persistence::new(missing, Some(log)));

        assert_eq!(
            worker.handle(request("Black Lotus")),
            Resolution::Published("Black Lotus".to_string())
        );
        assert_eq!(state.current_card().unwrap().record.name, "Black Lotus");
    }

    #[test]
    fn test_history_failure_still_writes_current_card() {
        let dir = tempdir().unwrap();
        let log = HistoryLog::open(&dir.path().join("gone/history.jsonl"), 10).unwrap();
        let (worker, _, _) = worker_with(MockProvider::echo(Game::Magic));
        let mut worker = worker.with_persistence(Persistence::new(dir.path().to_path_buf(), Some(log)));

        worker.handle(request("Black Lotus"));

        assert!(!dir.path().join("gone/history.jsonl").exists());
        let current = std::fs::read_to_string(dir.path().join(CURRENT_CARD_TXT)).unwrap();
        assert!(current.contains("name: Black Lotus"));
    }

    #[test]
    fn test_current_card_written_without_history_log() {
        let dir = tempdir().unwrap();
        let (worker, _, state) = worker_with(MockProvider::echo(Game::Pokemon));
        let mut worker = worker.with_persistence(Persistence::new(dir.path().to_path_buf(), None));

        worker.handle(request("Pikachu"));

        assert!(!dir.path().join("history.jsonl").exists());
        let current = std::fs::read_to_string(dir.path().join(CURRENT_CARD_TXT)).unwrap();
        assert!(current.contains("name: Pikachu"));
        assert_eq!(state.history_len(), 1);
    }

    #[test]
    fn test_worker_exits_when_queue_closes() {
        let (worker, calls, state) = worker_with(MockProvider::echo(Game::Magic));
        let (sender, receiver) = create_lookup_queue(4);
        let shutdown = Arc::new(AtomicBool::new(false));

        let handle = thread::spawn(move || worker.run(receiver, shutdown));

        sender.send(request("Black Lotus")).unwrap();
        sender.send(request("Mox Pearl")).unwrap();
        drop(sender);

        handle.join().expect("Worker thread panicked");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(history_names(&state), vec!["Black Lotus", "Mox Pearl"]);
    }

    #[test]
    fn test_worker_exits_on_shutdown_flag() {
        let (worker, _, _) = worker_with(MockProvider::echo(Game::Magic));
        let (_sender, receiver) = create_lookup_queue(4);
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();

        let handle = thread::spawn(move || worker.run(receiver, flag));
        shutdown.store(true, Ordering::SeqCst);

        // Sender is still alive, so only the flag can end the loop
        handle.join().expect("Worker thread panicked");
    }
}
