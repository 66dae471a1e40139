//! Pokémon TCG lookups via the pokemontcg.io v2 card search.

use reqwest::blocking::Client;
use serde::Deserialize;

use super::types::{CardRecord, Game, ProviderError, ProviderResult};
use super::CardProvider;

const CARDS_URL: &str = "https://api.pokemontcg.io/v2/cards";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SetInfo {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Images {
    small: Option<String>,
    large: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PokemonCard {
    id: String,
    name: String,
    supertype: String,
    types: Vec<String>,
    hp: Option<String>,
    rarity: Option<String>,
    set: Option<SetInfo>,
    images: Option<Images>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<PokemonCard>,
}

fn to_record(card: PokemonCard) -> CardRecord {
    let mut type_line = card.types.join(" ");
    if !card.supertype.is_empty() {
        if !type_line.is_empty() {
            type_line.push(' ');
        }
        type_line.push_str(&card.supertype);
    }

    let image_url = card
        .images
        .and_then(|images| images.large.or(images.small))
        .unwrap_or_default();

    CardRecord {
        game: Game::Pokemon,
        name: card.name,
        type_line,
        set_name: card.set.map(|s| s.name).unwrap_or_default(),
        image_url,
        stats: card.hp.map(|hp| format!("HP {}", hp)).unwrap_or_default(),
        rarity: card.rarity.unwrap_or_default(),
        url: card.id,
    }
}

/// Parses a successful search body; the first hit is the match.
pub fn parse_search(body: &str) -> ProviderResult {
    match serde_json::from_str::<SearchResponse>(body) {
        Ok(response) => match response.data.into_iter().next() {
            Some(card) => ProviderResult::Found(to_record(card)),
            None => ProviderResult::NotFound { status: None },
        },
        Err(e) => ProviderResult::Failed(ProviderError::Malformed(e.to_string())),
    }
}

/// Search query matching card names; quotes in OCR output would end the phrase.
pub fn name_query(name: &str) -> String {
    format!("name:\"{}\"", name.replace('"', ""))
}

pub struct PokemonProvider {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl PokemonProvider {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            url: CARDS_URL.to_string(),
            api_key,
        }
    }
}

impl CardProvider for PokemonProvider {
    fn game(&self) -> Game {
        Game::Pokemon
    }

    fn search(&self, name: &str) -> ProviderResult {
        let mut request = self
            .client
            .get(&self.url)
            .query(&[("q", name_query(name).as_str()), ("pageSize", "1")]);
        if let Some(key) = &self.api_key {
            request = request.header("X-Api-Key", key);
        }

        let response = match request.send() {
            Ok(response) => response,
            Err(e) => return ProviderResult::Failed(e.into()),
        };

        let status = response.status();
        if !status.is_success() {
            return ProviderResult::from_status(status.as_u16());
        }

        match response.text() {
            Ok(body) => parse_search(&body),
            Err(e) => ProviderResult::Failed(e.into()),
        }
    }
}
