use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Supported trading-card games, one provider each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Game {
    Magic,
    Pokemon,
}

impl Game {
    pub fn as_str(&self) -> &'static str {
        match self {
            Game::Magic => "magic",
            Game::Pokemon => "pokemon",
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown game '{0}' (expected auto, magic or pokemon)")]
pub struct UnknownGame(pub String);

impl FromStr for Game {
    type Err = UnknownGame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "magic" | "mtg" => Ok(Game::Magic),
            "pokemon" => Ok(Game::Pokemon),
            other => Err(UnknownGame(other.to_string())),
        }
    }
}

/// Which providers a lookup may consult.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameHint {
    /// All configured providers in priority order
    Auto,
    /// Only the provider for this game
    Only(Game),
}

impl FromStr for GameHint {
    type Err = UnknownGame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("auto") {
            return Ok(GameHint::Auto);
        }
        s.parse().map(GameHint::Only)
    }
}

/// Game-agnostic identity of a resolved card.
///
/// Fields a game's schema lacks are empty strings, never absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub game: Game,
    pub name: String,
    pub type_line: String,
    pub set_name: String,
    pub image_url: String,
    /// Power/toughness, HP, ... depending on the game
    pub stats: String,
    #[serde(default)]
    pub rarity: String,
    /// Provider page or card id
    #[serde(default)]
    pub url: String,
}

impl CardRecord {
    /// Labelled fields in display order.
    pub fn fields(&self) -> [(&'static str, &str); 8] {
        [
            ("game", self.game.as_str()),
            ("name", &self.name),
            ("type", &self.type_line),
            ("set", &self.set_name),
            ("stats", &self.stats),
            ("rarity", &self.rarity),
            ("image_url", &self.image_url),
            ("url", &self.url),
        ]
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {0}")]
    HttpStatus(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Worth retrying: connection problems, rate limiting, server errors.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::HttpStatus(code) => *code == 429 || (500..600).contains(code),
            ProviderError::Malformed(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

/// Outcome of one provider call.
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderResult {
    Found(CardRecord),
    /// The provider answered but has no match
    NotFound { status: Option<u16> },
    Failed(ProviderError),
}

impl ProviderResult {
    /// Classifies a non-success HTTP status. 400/404 mean "no match";
    /// anything else is a failure.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 404 => ProviderResult::NotFound {
                status: Some(status),
            },
            _ => ProviderResult::Failed(ProviderError::HttpStatus(status)),
        }
    }
}

/// Combined result of resolving a name across providers.
#[derive(Clone, Debug, PartialEq)]
pub enum LookupOutcome {
    Found(CardRecord),
    /// Every consulted provider answered "no match"
    NotFound { diagnostic: Option<String> },
    /// At least one provider failed and none matched
    TransportError { diagnostic: String },
}
