//! # thingwatch
//!
//! A dashboard service for ThingSpeak humidity/temperature telemetry.
//!
//! Each `/api/data` request runs a stateless, linear pipeline over the
//! channel's most recent feed entries:
//!
//! ```text
//! ThingSpeak API ──▶ fetch ──▶ normalize ──▶ stats ──▶ JSON response
//!                 (reqwest)  (tz + typing)  (series,     (hyper)
//!                                            summary)
//! ```
//!
//! - **[`fetch`]**: ThingSpeak feeds client ([`ThingSpeakClient`]) behind
//!   the [`FeedSource`] trait, plus the raw serde feed model
//! - **[`normalize`]**: raw entries → complete, timezone-correct
//!   [`SensorRecord`]s; incomplete records are dropped entirely
//! - **[`stats`]**: chart-ready series and current/avg/min/max summaries
//! - **[`server`]**: the dashboard page, `/api/data`, and health endpoints
//! - **[`config`]**: layered settings (defaults, file, environment, flags)
//!
//! ## Usage
//!
//! ```bash
//! thingwatch --api-key MY_READ_KEY --channel 2943258
//! ```
//!
//! ### As a library
//!
//! ```
//! use thingwatch::{normalize, stats};
//! use thingwatch::fetch::ChannelFeed;
//!
//! let feed: ChannelFeed = serde_json::from_str(
//!     r#"{"feeds": [{"created_at": "2024-06-01T10:00:00Z",
//!                    "field1": "55.0", "field2": "23.5"}]}"#,
//! ).unwrap();
//!
//! let records = normalize::normalize(&feed, chrono_tz::America::Sao_Paulo);
//! let (chart, summary) = stats::aggregate(&records);
//! assert_eq!(summary.total_records, 1);
//! assert_eq!(chart.labels[0], "01/06 07:00");
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod server;
pub mod stats;

// Re-export main types for convenience
pub use config::{Overrides, Settings};
pub use error::FetchError;
pub use fetch::{ChannelFeed, FeedEntry, FeedSource, ThingSpeakClient};
pub use normalize::{RecordOutcome, SensorRecord, SkipReason};
pub use server::AppState;
pub use stats::{ChartSeries, MetricStats, StatsSummary};
