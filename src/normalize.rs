//! Feed normalization.
//!
//! Converts raw ThingSpeak feed entries into strictly-typed sensor records:
//! timestamps are reinterpreted from UTC into the configured local timezone
//! and both field values are parsed as floats. Any entry with a malformed
//! timestamp or a missing, non-numeric, or non-finite value is dropped
//! entirely; partial records never survive. Provider order is preserved and duplicate
//! timestamps are kept as separate records.

use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use tracing::debug;

use crate::fetch::{ChannelFeed, FeedEntry};

/// A complete, timezone-correct telemetry record.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorRecord {
    /// Local wall-clock timestamp in the configured timezone.
    pub timestamp: DateTime<Tz>,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Temperature, degrees celsius.
    pub temperature: f64,
}

/// Outcome of classifying a single raw feed entry.
///
/// The drop policy is an explicit branch: an entry either yields a full
/// [`SensorRecord`] or is skipped with a reason.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    Keep(SensorRecord),
    Skip(SkipReason),
}

/// Why a raw feed entry was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `created_at` was absent or unparseable.
    BadTimestamp,
    /// `field1` was null, non-numeric, or non-finite.
    BadHumidity,
    /// `field2` was null, non-numeric, or non-finite.
    BadTemperature,
}

/// Classify a raw feed entry into a record or a skip reason.
pub fn classify(entry: &FeedEntry, tz: Tz) -> RecordOutcome {
    let Some(timestamp) = parse_timestamp(&entry.created_at, tz) else {
        return RecordOutcome::Skip(SkipReason::BadTimestamp);
    };

    let Some(humidity) = parse_value(entry.field1.as_deref()) else {
        return RecordOutcome::Skip(SkipReason::BadHumidity);
    };

    let Some(temperature) = parse_value(entry.field2.as_deref()) else {
        return RecordOutcome::Skip(SkipReason::BadTemperature);
    };

    RecordOutcome::Keep(SensorRecord {
        timestamp,
        humidity,
        temperature,
    })
}

/// Normalize a channel feed into an ordered sequence of sensor records.
///
/// An empty or all-invalid feed yields an empty vector, not an error.
pub fn normalize(feed: &ChannelFeed, tz: Tz) -> Vec<SensorRecord> {
    feed.feeds
        .iter()
        .filter_map(|entry| match classify(entry, tz) {
            RecordOutcome::Keep(record) => Some(record),
            RecordOutcome::Skip(reason) => {
                debug!(
                    ?reason,
                    created_at = %entry.created_at,
                    entry_id = ?entry.entry_id,
                    "dropping feed entry"
                );
                None
            }
        })
        .collect()
}

/// Parse an ISO-8601 timestamp into the target timezone.
///
/// A timestamp without offset information is assumed to be UTC.
fn parse_timestamp(raw: &str, tz: Tz) -> Option<DateTime<Tz>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&tz));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| chrono::Utc.from_utc_datetime(&naive).with_timezone(&tz))
}

/// Parse a field value, rejecting non-finite numbers.
///
/// `"nan"` and `"inf"` parse as valid f64 but would poison every
/// aggregate downstream (and serialize as JSON null), so they are
/// treated as invalid and drop the record.
fn parse_value(raw: Option<&str>) -> Option<f64> {
    raw?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use chrono_tz::America::Sao_Paulo;

    fn entry(created_at: &str, field1: Option<&str>, field2: Option<&str>) -> FeedEntry {
        FeedEntry {
            created_at: created_at.to_string(),
            entry_id: None,
            field1: field1.map(String::from),
            field2: field2.map(String::from),
        }
    }

    fn feed_of(entries: Vec<FeedEntry>) -> ChannelFeed {
        ChannelFeed {
            channel: None,
            feeds: entries,
        }
    }

    #[test]
    fn test_utc_converted_to_local_wall_clock() {
        // Sao Paulo is UTC-3 year-round since DST was abolished.
        let outcome = classify(
            &entry("2024-01-15T12:00:00Z", Some("50.0"), Some("20.0")),
            Sao_Paulo,
        );

        let RecordOutcome::Keep(record) = outcome else {
            panic!("expected record, got {:?}", outcome);
        };
        assert_eq!(record.timestamp.hour(), 9);
        assert_eq!(record.timestamp.format("%d/%m %H:%M").to_string(), "15/01 09:00");
    }

    #[test]
    fn test_naive_timestamp_assumed_utc() {
        let outcome = classify(
            &entry("2024-01-15T12:00:00", Some("50.0"), Some("20.0")),
            Sao_Paulo,
        );

        let RecordOutcome::Keep(record) = outcome else {
            panic!("expected record, got {:?}", outcome);
        };
        assert_eq!(record.timestamp.hour(), 9);
    }

    #[test]
    fn test_bad_timestamp_skipped() {
        let outcome = classify(&entry("not-a-date", Some("50"), Some("20")), Sao_Paulo);
        assert_eq!(outcome, RecordOutcome::Skip(SkipReason::BadTimestamp));
    }

    #[test]
    fn test_null_humidity_skipped() {
        let outcome = classify(&entry("2024-01-15T12:00:00Z", None, Some("20")), Sao_Paulo);
        assert_eq!(outcome, RecordOutcome::Skip(SkipReason::BadHumidity));
    }

    #[test]
    fn test_non_numeric_temperature_skipped() {
        let outcome = classify(
            &entry("2024-01-15T12:00:00Z", Some("50"), Some("warm")),
            Sao_Paulo,
        );
        assert_eq!(outcome, RecordOutcome::Skip(SkipReason::BadTemperature));
    }

    #[test]
    fn test_drop_invariant_excludes_partial_records() {
        let feed = feed_of(vec![
            entry("2024-06-01T10:00:00Z", Some("55.0"), Some("23.5")),
            entry("2024-06-01T10:05:00Z", None, Some("23.9")),
            entry("2024-06-01T10:10:00Z", Some("56.0"), None),
            entry("garbage", Some("57.0"), Some("24.0")),
            entry("2024-06-01T10:20:00Z", Some("x"), Some("24.1")),
        ]);

        let records = normalize(&feed, Sao_Paulo);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].humidity, 55.0);
        assert_eq!(records[0].temperature, 23.5);
    }

    #[test]
    fn test_order_preserved() {
        let feed = feed_of(vec![
            entry("2024-06-01T10:00:00Z", Some("50"), Some("20")),
            entry("2024-06-01T09:00:00Z", Some("51"), Some("21")),
            entry("2024-06-01T11:00:00Z", Some("52"), Some("22")),
        ]);

        let records = normalize(&feed, Sao_Paulo);
        let humidity: Vec<f64> = records.iter().map(|r| r.humidity).collect();
        // No sorting: provider order is kept even when timestamps regress.
        assert_eq!(humidity, vec![50.0, 51.0, 52.0]);
    }

    #[test]
    fn test_duplicate_timestamps_kept() {
        let feed = feed_of(vec![
            entry("2024-06-01T10:00:00Z", Some("50"), Some("20")),
            entry("2024-06-01T10:00:00Z", Some("51"), Some("21")),
        ]);

        let records = normalize(&feed, Sao_Paulo);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].timestamp, records[1].timestamp);
    }

    #[test]
    fn test_empty_feed_yields_empty_sequence() {
        let records = normalize(&ChannelFeed::default(), Sao_Paulo);
        assert!(records.is_empty());
    }

    #[test]
    fn test_all_invalid_feed_yields_empty_sequence() {
        let feed = feed_of(vec![
            entry("2024-06-01T10:00:00Z", None, None),
            entry("", Some("50"), Some("20")),
        ]);
        assert!(normalize(&feed, Sao_Paulo).is_empty());
    }

    #[test]
    fn test_explicit_offset_respected() {
        // Already-local offset should not be double-shifted.
        let outcome = classify(
            &entry("2024-01-15T09:00:00-03:00", Some("50"), Some("20")),
            Sao_Paulo,
        );

        let RecordOutcome::Keep(record) = outcome else {
            panic!("expected record, got {:?}", outcome);
        };
        assert_eq!(record.timestamp.hour(), 9);
    }

    #[test]
    fn test_nan_value_skipped() {
        let outcome = classify(
            &entry("2024-06-01T10:00:00Z", Some("nan"), Some("23.0")),
            Sao_Paulo,
        );
        assert_eq!(outcome, RecordOutcome::Skip(SkipReason::BadHumidity));
    }

    #[test]
    fn test_infinite_value_skipped() {
        let outcome = classify(
            &entry("2024-06-01T10:00:00Z", Some("55.0"), Some("inf")),
            Sao_Paulo,
        );
        assert_eq!(outcome, RecordOutcome::Skip(SkipReason::BadTemperature));
    }

    #[test]
    fn test_non_finite_records_dropped_from_feed() {
        let feed = feed_of(vec![
            entry("2024-06-01T10:00:00Z", Some("nan"), Some("23.0")),
            entry("2024-06-01T10:05:00Z", Some("55.0"), Some("23.5")),
            entry("2024-06-01T10:10:00Z", Some("-inf"), Some("23.9")),
        ]);

        let records = normalize(&feed, Sao_Paulo);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].humidity, 55.0);
        // Everything that survives is finite, so aggregates stay numeric.
        assert!(records.iter().all(|r| r.humidity.is_finite() && r.temperature.is_finite()));
    }

    #[test]
    fn test_whitespace_tolerated_in_values() {
        let outcome = classify(
            &entry("2024-01-15T12:00:00Z", Some(" 55.5 "), Some("23")),
            Sao_Paulo,
        );

        let RecordOutcome::Keep(record) = outcome else {
            panic!("expected record, got {:?}", outcome);
        };
        assert_eq!(record.humidity, 55.5);
        assert_eq!(record.temperature, 23.0);
    }
}
