//! Push notification to a presentation layer on every resolved card.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local};
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;

use crate::lookup::CardRecord;

#[derive(Debug, Serialize)]
pub struct CardUpdate<'a> {
    pub found: bool,
    /// Canonical name of the resolved card
    pub name: &'a str,
    /// Text the name was resolved from
    pub query: &'a str,
    pub card: &'a CardRecord,
    pub timestamp: DateTime<Local>,
}

pub struct Notifier {
    client: Client,
    url: String,
}

impl Notifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build callback HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// POSTs the card as JSON. Non-2xx responses are errors.
    pub fn send(&self, query: &str, card: &CardRecord) -> Result<()> {
        let update = CardUpdate {
            found: true,
            name: &card.name,
            query,
            card,
            timestamp: Local::now(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&update)
            .send()
            .with_context(|| format!("Callback to {} failed", self.url))?;

        if !response.status().is_success() {
            return Err(anyhow!("Callback to {} returned HTTP {}", self.url, response.status()));
        }
        Ok(())
    }
}
