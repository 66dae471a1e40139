//! Magic: The Gathering lookups via Scryfall's fuzzy named-card endpoint.

use reqwest::blocking::Client;
use serde::Deserialize;

use super::types::{CardRecord, Game, ProviderError, ProviderResult};
use super::CardProvider;

const NAMED_URL: &str = "https://api.scryfall.com/cards/named";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageUris {
    normal: Option<String>,
    large: Option<String>,
    border_crop: Option<String>,
}

impl ImageUris {
    fn best(&self) -> Option<&str> {
        self.normal
            .as_deref()
            .or(self.large.as_deref())
            .or(self.border_crop.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CardFace {
    image_uris: Option<ImageUris>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScryfallCard {
    name: String,
    type_line: Option<String>,
    set_name: Option<String>,
    rarity: Option<String>,
    scryfall_uri: Option<String>,
    power: Option<String>,
    toughness: Option<String>,
    image_uris: Option<ImageUris>,
    /// Double-faced cards carry images per face
    card_faces: Option<Vec<CardFace>>,
}

/// Maps a Scryfall card object to a CardRecord.
fn to_record(card: ScryfallCard) -> CardRecord {
    let image_url = card
        .image_uris
        .as_ref()
        .and_then(ImageUris::best)
        .or_else(|| {
            card.card_faces
                .as_ref()
                .and_then(|faces| faces.first())
                .and_then(|face| face.image_uris.as_ref())
                .and_then(ImageUris::best)
        })
        .unwrap_or_default()
        .to_string();

    let stats = match &card.power {
        Some(power) => format!("{}/{}", power, card.toughness.as_deref().unwrap_or("")),
        None => String::new(),
    };

    CardRecord {
        game: Game::Magic,
        name: card.name,
        type_line: card.type_line.unwrap_or_default(),
        set_name: card.set_name.unwrap_or_default(),
        image_url,
        stats,
        rarity: card.rarity.unwrap_or_default(),
        url: card.scryfall_uri.unwrap_or_default(),
    }
}

/// Parses a successful response body.
pub fn parse_card(body: &str) -> ProviderResult {
    match serde_json::from_str::<ScryfallCard>(body) {
        Ok(card) if card.name.trim().is_empty() => {
            ProviderResult::Failed(ProviderError::Malformed("card without a name".to_string()))
        }
        Ok(card) => ProviderResult::Found(to_record(card)),
        Err(e) => ProviderResult::Failed(ProviderError::Malformed(e.to_string())),
    }
}

pub struct ScryfallProvider {
    client: Client,
    url: String,
}

impl ScryfallProvider {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            url: NAMED_URL.to_string(),
        }
    }
}

impl CardProvider for ScryfallProvider {
    fn game(&self) -> Game {
        Game::Magic
    }

    fn search(&self, name: &str) -> ProviderResult {
        let response = match self
            .client
            .get(&self.url)
            .query(&[("fuzzy", name)])
            .header("Accept", "application/json")
            .send()
        {
            Ok(response) => response,
            Err(e) => return ProviderResult::Failed(e.into()),
        };

        let status = response.status();
        if !status.is_success() {
            return ProviderResult::from_status(status.as_u16());
        }

        match response.text() {
            Ok(body) => parse_card(&body),
            Err(e) => ProviderResult::Failed(e.into()),
        }
    }
}
