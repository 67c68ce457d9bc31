//! Service configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file,
//! then `THINGWATCH_*` environment variables, then CLI flag overrides.
//! Channel identity and the read API key are configuration, never embedded
//! literals; startup fails when no key is supplied.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;

/// Default channel read by the dashboard.
pub const DEFAULT_CHANNEL_ID: &str = "2943258";

/// Default listen address for the HTTP server.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";

/// Resolved service settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// ThingSpeak API endpoint.
    pub base_url: String,
    /// Channel to read feeds from.
    pub channel_id: String,
    /// Read API key for the channel.
    pub api_key: String,
    /// How many recent entries to request per fetch.
    pub results: u32,
    /// Local timezone feed timestamps are converted into.
    pub timezone: Tz,
    /// Outbound request timeout, seconds.
    pub timeout_secs: u64,
}

/// CLI-level overrides applied on top of file and environment sources.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen_addr: Option<String>,
    pub channel_id: Option<String>,
    pub api_key: Option<String>,
    pub results: Option<u32>,
    pub timezone: Option<String>,
}

impl Settings {
    /// Load settings from defaults, an optional config file, the
    /// environment, and CLI overrides, in that precedence order.
    pub fn load(config_file: Option<&Path>, overrides: Overrides) -> Result<Self> {
        Self::load_with_env(
            config_file,
            overrides,
            config::Environment::with_prefix("THINGWATCH"),
        )
    }

    /// Load with an explicit environment source, so tests can substitute
    /// a fixed map instead of the process environment.
    fn load_with_env(
        config_file: Option<&Path>,
        overrides: Overrides,
        env: config::Environment,
    ) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("listen_addr", DEFAULT_LISTEN_ADDR)?
            .set_default("base_url", crate::fetch::DEFAULT_BASE_URL)?
            .set_default("channel_id", DEFAULT_CHANNEL_ID)?
            .set_default("api_key", "")?
            .set_default("results", 100_i64)?
            .set_default("timezone", "America/Sao_Paulo")?
            .set_default("timeout_secs", 10_i64)?;

        if let Some(path) = config_file {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder
            .add_source(env)
            .set_override_option("listen_addr", overrides.listen_addr)?
            .set_override_option("channel_id", overrides.channel_id)?
            .set_override_option("api_key", overrides.api_key)?
            .set_override_option("results", overrides.results.map(|r| r as i64))?
            .set_override_option("timezone", overrides.timezone)?;

        let settings: Settings = builder
            .build()
            .context("failed to load configuration")?
            .try_deserialize()
            .context("invalid configuration")?;

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            !self.api_key.is_empty(),
            "no read API key configured; set --api-key, THINGWATCH_API_KEY, \
             or api_key in the config file"
        );
        ensure!(self.results >= 1, "results must be a positive integer");
        ensure!(!self.channel_id.is_empty(), "channel_id must not be empty");
        Ok(())
    }
}
