use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use thingwatch::config::{Overrides, Settings};
use thingwatch::fetch::ThingSpeakClient;
use thingwatch::server::{run_server, AppState};

#[derive(Parser, Debug)]
#[command(name = "thingwatch")]
#[command(about = "Dashboard service for ThingSpeak humidity/temperature telemetry")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (e.g., "0.0.0.0:5000")
    #[arg(short, long)]
    listen_addr: Option<String>,

    /// ThingSpeak channel ID to read
    #[arg(long)]
    channel: Option<String>,

    /// Read API key for the channel
    #[arg(long)]
    api_key: Option<String>,

    /// How many recent entries to request per fetch
    #[arg(short, long)]
    results: Option<u32>,

    /// Local timezone for timestamps (e.g., "America/Sao_Paulo")
    #[arg(short, long)]
    timezone: Option<String>,

    /// Enable debug logging (including per-record drop reasons)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let settings = Settings::load(
        args.config.as_deref(),
        Overrides {
            listen_addr: args.listen_addr,
            channel_id: args.channel,
            api_key: args.api_key,
            results: args.results,
            timezone: args.timezone,
        },
    )?;

    let client = ThingSpeakClient::builder()
        .endpoint(&settings.base_url)
        .channel(&settings.channel_id)
        .api_key(&settings.api_key)
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build();

    let state = Arc::new(AppState {
        source: Arc::new(client),
        results: settings.results,
        timezone: settings.timezone,
    });

    info!(
        channel = %settings.channel_id,
        timezone = %settings.timezone,
        "serving dashboard on http://{}",
        settings.listen_addr
    );

    run_server(settings.listen_addr, state)
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))
}
