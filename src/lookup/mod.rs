//! Card name resolution against external game databases.
//!
//! This module provides:
//! - The common record and result types (`types`)
//! - Bounded retry for provider calls (`retry`)
//! - One provider per supported game (`scryfall`, `pokemon`)
//! - The priority-order resolver (`LookupResolver`)

pub mod pokemon;
pub mod retry;
pub mod scryfall;
pub mod types;

pub use retry::RetryPolicy;
pub use types::{CardRecord, Game, GameHint, LookupOutcome, ProviderError, ProviderResult};

use anyhow::{Context, Result};
use reqwest::blocking::Client;

use crate::config::ScannerConfig;
use pokemon::PokemonProvider;
use scryfall::ScryfallProvider;

/// A name-based fuzzy search against one game's card database.
pub trait CardProvider: Send {
    fn game(&self) -> Game;
    fn search(&self, name: &str) -> ProviderResult;
}

/// Queries providers in priority order and combines their results.
pub struct LookupResolver {
    providers: Vec<Box<dyn CardProvider>>,
    retry: RetryPolicy,
}

impl LookupResolver {
    pub fn new(providers: Vec<Box<dyn CardProvider>>, retry: RetryPolicy) -> Self {
        Self { providers, retry }
    }

    /// Builds the HTTP providers listed in the config, in that order.
    pub fn from_config(config: &ScannerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.lookup.timeout())
            .user_agent(concat!("card-scanner/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let mut providers: Vec<Box<dyn CardProvider>> = Vec::new();
        for game in &config.providers {
            if providers.iter().any(|p| p.game() == *game) {
                continue;
            }
            let provider: Box<dyn CardProvider> = match game {
                Game::Magic => Box::new(ScryfallProvider::new(client.clone())),
                Game::Pokemon => Box::new(PokemonProvider::new(
                    client.clone(),
                    config.lookup.resolved_pokemon_key(),
                )),
            };
            providers.push(provider);
        }

        Ok(Self::new(providers, RetryPolicy::from_config(&config.lookup)))
    }

    /// Resolves `text` to a card.
    ///
    /// With a specific hint only that game's provider is asked. Under
    /// `Auto` the first provider to find a match wins. A failed provider
    /// is reported as a transport error only when no other provider
    /// matched.
    pub fn resolve(&self, text: &str, hint: GameHint) -> LookupOutcome {
        let name = text.trim();
        if name.is_empty() {
            return LookupOutcome::NotFound {
                diagnostic: Some("empty name".to_string()),
            };
        }

        let mut misses = Vec::new();
        let mut failures = Vec::new();
        let mut consulted = 0;

        for provider in &self.providers {
            let game = provider.game();
            if let GameHint::Only(wanted) = hint {
                if wanted != game {
                    continue;
                }
            }
            consulted += 1;

            match self.retry.run(game.as_str(), || provider.search(name)) {
                ProviderResult::Found(record) => {
                    log::info!("{} lookup '{}' -> {}", game, name, record.name);
                    return LookupOutcome::Found(record);
                }
                ProviderResult::NotFound { status } => {
                    log::debug!("{} lookup '{}': no match", game, name);
                    misses.push(match status {
                        Some(code) => format!("{}: not found (HTTP {})", game, code),
                        None => format!("{}: not found", game),
                    });
                }
                ProviderResult::Failed(err) => {
                    log::warn!("{} lookup '{}' failed: {}", game, name, err);
                    failures.push(format!("{}: {}", game, err));
                }
            }
        }

        if consulted == 0 {
            return LookupOutcome::NotFound {
                diagnostic: Some("no provider configured for this game".to_string()),
            };
        }

        if !failures.is_empty() {
            failures.extend(misses);
            return LookupOutcome::TransportError {
                diagnostic: failures.join("; "),
            };
        }

        LookupOutcome::NotFound {
            diagnostic: Some(misses.join("; ")),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    pub(crate) fn record(game: Game, name: &str) -> CardRecord {
        CardRecord {
            game,
            name: name.to_string(),
            type_line: String::new(),
            set_name: String::new(),
            image_url: String::new(),
            stats: String::new(),
            rarity: String::new(),
            url: String::new(),
        }
    }

    /// Replays scripted results (repeating the last) and counts calls.
    pub(crate) struct MockProvider {
        game: Game,
        script: Mutex<VecDeque<ProviderResult>>,
        pub calls: Arc<AtomicUsize>,
    }

    impl MockProvider {
        pub(crate) fn new(game: Game, script: Vec<ProviderResult>) -> Self {
            Self {
                game,
                script: Mutex::new(script.into()),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Finds every name it is asked about.
        pub(crate) fn echo(game: Game) -> Self {
            Self::new(game, vec![])
        }
    }

    impl CardProvider for MockProvider {
        fn game(&self) -> Game {
            self.game
        }

        fn search(&self, name: &str) -> ProviderResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            match script.len() {
                0 => ProviderResult::Found(record(self.game, name)),
                1 => script[0].clone(),
                _ => script.pop_front().unwrap(),
            }
        }
    }

    fn no_wait() -> RetryPolicy {
        RetryPolicy::new(2, Duration::ZERO)
    }

    fn found(outcome: LookupOutcome) -> CardRecord {
        match outcome {
            LookupOutcome::Found(record) => record,
            other => panic!("expected a match, got {:?}", other),
        }
    }

    #[test]
    fn test_auto_falls_through_to_second_provider() {
        let magic = MockProvider::new(Game::Magic, vec![ProviderResult::NotFound { status: Some(404) }]);
        let pokemon = MockProvider::echo(Game::Pokemon);
        let magic_calls = magic.calls.clone();
        let resolver = LookupResolver::new(vec![Box::new(magic), Box::new(pokemon)], no_wait());

        let outcome = resolver.resolve("Pikachu", GameHint::Auto);

        let card = found(outcome);
        assert_eq!(card.game, Game::Pokemon);
        assert_eq!(card.name, "Pikachu");
        assert_eq!(magic_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_first_match_wins() {
        let magic = MockProvider::echo(Game::Magic);
        let pokemon = MockProvider::echo(Game::Pokemon);
        let pokemon_calls = pokemon.calls.clone();
        let resolver = LookupResolver::new(vec![Box::new(magic), Box::new(pokemon)], no_wait());

        let outcome = resolver.resolve("Black Lotus", GameHint::Auto);

        assert_eq!(found(outcome).game, Game::Magic);
        assert_eq!(pokemon_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_hint_queries_only_that_provider() {
        let magic = MockProvider::echo(Game::Magic);
        let pokemon = MockProvider::echo(Game::Pokemon);
        let magic_calls = magic.calls.clone();
        let resolver = LookupResolver::new(vec![Box::new(magic), Box::new(pokemon)], no_wait());

        let outcome = resolver.resolve("Pikachu", GameHint::Only(Game::Pokemon));

        assert_eq!(found(outcome).game, Game::Pokemon);
        assert_eq!(magic_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_all_not_found() {
        let magic = MockProvider::new(Game::Magic, vec![ProviderResult::NotFound { status: Some(404) }]);
        let pokemon = MockProvider::new(Game::Pokemon, vec![ProviderResult::NotFound { status: None }]);
        let resolver = LookupResolver::new(vec![Box::new(magic), Box::new(pokemon)], no_wait());

        let outcome = resolver.resolve("Xyzzy", GameHint::Auto);

        assert!(matches!(outcome, LookupOutcome::NotFound { .. }));
    }

    #[test]
    fn test_transport_failures_stop_at_retry_bound() {
        let failing = MockProvider::new(
            Game::Magic,
            vec![
                ProviderResult::Failed(ProviderError::Transport("reset".into())),
                ProviderResult::Failed(ProviderError::Transport("reset".into())),
                ProviderResult::Failed(ProviderError::Transport("reset".into())),
            ],
        );
        let calls = failing.calls.clone();
        let resolver = LookupResolver::new(vec![Box::new(failing)], no_wait());

        let outcome = resolver.resolve("Black Lotus", GameHint::Auto);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        match outcome {
            LookupOutcome::TransportError { diagnostic } => {
                assert!(diagnostic.contains("transport error"), "{}", diagnostic)
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_then_miss_reports_transport_error() {
        let magic = MockProvider::new(Game::Magic, vec![ProviderResult::Failed(ProviderError::HttpStatus(500))]);
        let pokemon = MockProvider::new(Game::Pokemon, vec![ProviderResult::NotFound { status: None }]);
        let resolver = LookupResolver::new(vec![Box::new(magic), Box::new(pokemon)], no_wait());

        assert!(matches!(
            resolver.resolve("Pikachu", GameHint::Auto),
            LookupOutcome::TransportError { .. }
        ));
    }

    #[test]
    fn test_empty_name_skips_providers() {
        let magic = MockProvider::echo(Game::Magic);
        let calls = magic.calls.clone();
        let resolver = LookupResolver::new(vec![Box::new(magic)], no_wait());

        assert_eq!(
            resolver.resolve("   ", GameHint::Auto),
            LookupOutcome::NotFound {
                diagnostic: Some("empty name".to_string())
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_from_config_respects_provider_order() {
        let config = ScannerConfig {
            providers: vec![Game::Pokemon, Game::Magic, Game::Pokemon],
            ..Default::default()
        };
        let resolver = LookupResolver::from_config(&config).unwrap();
        let games: Vec<Game> = resolver.providers.iter().map(|p| p.game()).collect();
        assert_eq!(games, vec![Game::Pokemon, Game::Magic]);
    }
}
