//! Chart series and summary statistics.
//!
//! Derives the chart-ready payload (formatted labels plus two index-aligned
//! value arrays) and per-metric summary statistics from a normalized record
//! sequence. Everything here is recomputed per request; nothing persists.

use serde::Serialize;

use crate::normalize::SensorRecord;

/// Label format for chart ticks (`day/month hour:minute`).
pub const LABEL_FORMAT: &str = "%d/%m %H:%M";

/// Format for the summary's last-update timestamp.
pub const LAST_UPDATE_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Chart-ready series: three sequences of equal length, index-aligned
/// with the normalized record order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub humidity_data: Vec<f64>,
    pub temperature_data: Vec<f64>,
}

/// Summary statistics for a single metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricStats {
    /// Value of the most recent (last-ordered) record.
    pub current: f64,
    /// Arithmetic mean over all kept values.
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricStats {
    /// Compute stats over a value sequence; zero-filled when empty.
    fn compute(values: &[f64]) -> Self {
        let Some(&current) = values.last() else {
            return Self::default();
        };

        let sum: f64 = values.iter().sum();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            current,
            avg: sum / values.len() as f64,
            min,
            max,
        }
    }
}

/// Summary of the whole normalized sequence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub humidity: MetricStats,
    pub temperature: MetricStats,
    /// Last record's timestamp, formatted, or `"N/A"` when empty.
    pub last_update: String,
    /// Record count after normalization drops.
    pub total_records: usize,
}

impl Default for StatsSummary {
    fn default() -> Self {
        Self {
            humidity: MetricStats::default(),
            temperature: MetricStats::default(),
            last_update: "N/A".to_string(),
            total_records: 0,
        }
    }
}

/// Derive chart series and summary statistics from normalized records.
///
/// An empty input zero-fills the summary (`last_update = "N/A"`) rather
/// than erroring; the public endpoint guards against reaching this path
/// with empty input, but the behavior is defined and kept here.
pub fn aggregate(records: &[SensorRecord]) -> (ChartSeries, StatsSummary) {
    let Some(last) = records.last() else {
        return (ChartSeries::default(), StatsSummary::default());
    };

    let mut series = ChartSeries {
        labels: Vec::with_capacity(records.len()),
        humidity_data: Vec::with_capacity(records.len()),
        temperature_data: Vec::with_capacity(records.len()),
    };

    for record in records {
        series
            .labels
            .push(record.timestamp.format(LABEL_FORMAT).to_string());
        series.humidity_data.push(record.humidity);
        series.temperature_data.push(record.temperature);
    }

    let summary = StatsSummary {
        humidity: MetricStats::compute(&series.humidity_data),
        temperature: MetricStats::compute(&series.temperature_data),
        last_update: last.timestamp.format(LAST_UPDATE_FORMAT).to_string(),
        total_records: records.len(),
    };

    (series, summary)
}
