//! Yield Aggregator
//!
//! Reduces a hive's weight readings to the "current honey quantity" used
//! for production classification, and flags out-of-range readings.
//!
//! The current quantity is the **historical peak** of the WEIGHT readings,
//! not the latest sample. A hive that was heavy before a harvest keeps
//! reporting its old peak. This is the established behaviour of the
//! production reports and is kept as is; [`YieldSummary::latest_grams`] is
//! available to callers that need recency.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::reading::{IndicatorType, SensorReading};
use crate::config::{Bounds, EngineConfig};
use crate::hive::HiveId;

/// Per-hive view of the weight telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldSummary {
    pub hive: HiveId,
    /// Current honey quantity: the peak weight, 0 without readings
    pub current_grams: f64,
    /// Most recent weight sample, if any
    pub latest_grams: Option<f64>,
    pub latest_at: Option<DateTime<Utc>>,
    /// Number of weight readings considered
    pub samples: usize,
    /// Number of those flagged abnormal
    pub abnormal: usize,
}

/// Aggregates weight readings and classifies abnormal values
#[derive(Debug, Clone)]
pub struct YieldAggregator {
    bounds: HashMap<IndicatorType, Bounds>,
}

impl Default for YieldAggregator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl YieldAggregator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            bounds: config.sensor_bounds.clone(),
        }
    }

    fn weights<'a>(
        hive: HiveId,
        readings: &'a [SensorReading],
    ) -> impl Iterator<Item = &'a SensorReading> + 'a {
        readings
            .iter()
            .filter(move |r| r.hive == hive && r.is_weight() && !r.value.is_nan())
    }

    /// Maximum WEIGHT value among the hive's readings, or 0 if there are none
    ///
    /// Readings for other hives and other indicators are ignored. Abnormal
    /// readings still count.
    pub fn current_honey_quantity(&self, hive: HiveId, readings: &[SensorReading]) -> f64 {
        Self::weights(hive, readings)
            .map(|r| r.value)
            .fold(None, |peak: Option<f64>, v| Some(peak.map_or(v, |p| p.max(v))))
            .unwrap_or(0.0)
    }

    /// Peak, latest and abnormal counts in one pass over the readings
    pub fn summarize(&self, hive: HiveId, readings: &[SensorReading]) -> YieldSummary {
        let mut summary = YieldSummary {
            hive,
            current_grams: 0.0,
            latest_grams: None,
            latest_at: None,
            samples: 0,
            abnormal: 0,
        };
        let mut peak: Option<f64> = None;

        for reading in Self::weights(hive, readings) {
            summary.samples += 1;
            if self.is_abnormal(reading) {
                summary.abnormal += 1;
            }
            peak = Some(peak.map_or(reading.value, |p| p.max(reading.value)));
            if summary.latest_at.map_or(true, |at| reading.timestamp >= at) {
                summary.latest_at = Some(reading.timestamp);
                summary.latest_grams = Some(reading.value);
            }
        }
        summary.current_grams = peak.unwrap_or(0.0);
        summary
    }

    /// Whether a reading falls outside the normal range for its indicator
    ///
    /// Advisory only: abnormal readings are stored and aggregated like any
    /// other. Negative weight is always abnormal.
    pub fn is_abnormal(&self, reading: &SensorReading) -> bool {
        if reading.value.is_nan() {
            return true;
        }
        if reading.indicator == IndicatorType::Weight && reading.value < 0.0 {
            return true;
        }
        self.bounds
            .get(&reading.indicator)
            .map_or(false, |bounds| !bounds.contains(reading.value))
    }
}
