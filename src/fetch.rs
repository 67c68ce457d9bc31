//! ThingSpeak channel feed client.
//!
//! Fetches recent feed entries from the ThingSpeak channel feeds API
//! (`GET {base_url}/channels/{id}/feeds.json?api_key=...&results=N`).
//! One outbound request per call; no retry, no caching.
//!
//! ## Example
//!
//! ```rust,no_run
//! use thingwatch::fetch::{FeedSource, ThingSpeakClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ThingSpeakClient::builder()
//!         .channel("2943258")
//!         .api_key("MY_READ_KEY")
//!         .build();
//!
//!     let feed = client.fetch(100).await?;
//!     println!("{} entries", feed.feeds.len());
//!
//!     Ok(())
//! }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::FetchError;

/// Default ThingSpeak API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.thingspeak.com";

/// A channel feed response from the ThingSpeak API.
///
/// Deserialized loosely: a missing `feeds` array becomes an empty vector,
/// so an empty or malformed channel never fails at this layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelFeed {
    /// Channel metadata, when the API includes it.
    #[serde(default)]
    pub channel: Option<ChannelInfo>,

    /// Feed entries in provider order (ascending by creation time).
    #[serde(default)]
    pub feeds: Vec<FeedEntry>,
}

/// Channel metadata from the feeds response.
///
/// Only the ID is kept; the pipeline has no use for the rest of the
/// channel object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelInfo {
    #[serde(default)]
    pub id: Option<u64>,
}

/// A single raw feed entry.
///
/// Field values arrive as strings (or null) regardless of their numeric
/// content; typing happens in [`crate::normalize`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedEntry {
    /// Creation timestamp, ISO-8601, normally UTC.
    #[serde(default)]
    pub created_at: String,

    #[serde(default)]
    pub entry_id: Option<u64>,

    /// Humidity reading, as reported.
    #[serde(default)]
    pub field1: Option<String>,

    /// Temperature reading, as reported.
    #[serde(default)]
    pub field2: Option<String>,
}

/// Trait for fetching channel feeds.
///
/// Request handlers depend on this seam rather than on the concrete
/// network client, so tests can substitute canned feeds.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the most recent `results` feed entries.
    async fn fetch(&self, results: u32) -> Result<ChannelFeed, FetchError>;

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}

/// HTTP client for the ThingSpeak channel feeds API.
#[derive(Debug, Clone)]
pub struct ThingSpeakClient {
    client: Client,
    base_url: String,
    channel_id: String,
    api_key: String,
    description: String,
}

impl ThingSpeakClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> ThingSpeakClientBuilder {
        ThingSpeakClientBuilder::default()
    }

    /// The feeds URL this client requests.
    pub fn feeds_url(&self) -> String {
        format!("{}/channels/{}/feeds.json", self.base_url, self.channel_id)
    }

    async fn fetch_feed(&self, results: u32) -> Result<ChannelFeed, FetchError> {
        let results = results.to_string();
        let response = self
            .client
            .get(self.feeds_url())
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("results", results.as_str()),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(FetchError::Auth("invalid read API key".to_string()));
        }

        if !response.status().is_success() {
            return Err(FetchError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let feed: ChannelFeed = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        Ok(feed)
    }
}

#[async_trait]
impl FeedSource for ThingSpeakClient {
    async fn fetch(&self, results: u32) -> Result<ChannelFeed, FetchError> {
        self.fetch_feed(results).await
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for [`ThingSpeakClient`].
#[derive(Debug, Default)]
pub struct ThingSpeakClientBuilder {
    base_url: Option<String>,
    channel_id: Option<String>,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl ThingSpeakClientBuilder {
    /// Set the API endpoint (default: `https://api.thingspeak.com`).
    pub fn endpoint(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the channel ID to read.
    pub fn channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// Set the read API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> ThingSpeakClient {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(10));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let channel_id = self.channel_id.unwrap_or_default();
        let description = format!("thingspeak channel {}", channel_id);

        ThingSpeakClient {
            client,
            base_url,
            channel_id,
            api_key: self.api_key.unwrap_or_default(),
            description,
        }
    }
}
