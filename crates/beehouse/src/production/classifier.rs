//! Production Classifier
//!
//! Ranks hives by their current honey quantity against a caller supplied
//! threshold.
//!
//! This module provides:
//! - High production: yield strictly above the threshold, largest first
//! - Low production: yield strictly below the threshold, smallest first

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::error::{HiveError, HiveResult};
use crate::hive::{Hive, HiveId};
use crate::telemetry::{SensorReading, YieldAggregator};

/// Which side of the threshold a ranking selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductionLevel {
    High,
    Low,
}

impl fmt::Display for ProductionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductionLevel::High => write!(f, "high"),
            ProductionLevel::Low => write!(f, "low"),
        }
    }
}

/// A hive together with the yield it was ranked by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HiveYield {
    pub hive_id: HiveId,
    pub name: String,
    /// Current honey quantity in grams
    pub honey_grams: f64,
}

/// Classifies hives into high and low producers
#[derive(Debug, Clone, Default)]
pub struct ProductionClassifier {
    aggregator: YieldAggregator,
}

impl ProductionClassifier {
    pub fn new(aggregator: YieldAggregator) -> Self {
        Self { aggregator }
    }

    pub fn aggregator(&self) -> &YieldAggregator {
        &self.aggregator
    }

    /// Hives whose yield is strictly greater than `threshold`, by descending
    /// yield
    pub fn high_production<'a, I>(&self, hives: I, threshold: f64) -> HiveResult<Vec<HiveYield>>
    where
        I: IntoIterator<Item = (&'a Hive, &'a [SensorReading])>,
    {
        self.classify(hives, threshold, ProductionLevel::High)
    }

    /// Hives whose yield is strictly less than `threshold`, by ascending
    /// yield. Hives without readings count as 0.
    pub fn low_production<'a, I>(&self, hives: I, threshold: f64) -> HiveResult<Vec<HiveYield>>
    where
        I: IntoIterator<Item = (&'a Hive, &'a [SensorReading])>,
    {
        self.classify(hives, threshold, ProductionLevel::Low)
    }

    pub fn classify<'a, I>(
        &self,
        hives: I,
        threshold: f64,
        level: ProductionLevel,
    ) -> HiveResult<Vec<HiveYield>>
    where
        I: IntoIterator<Item = (&'a Hive, &'a [SensorReading])>,
    {
        validate_threshold(threshold)?;

        let mut ranked: Vec<HiveYield> = hives
            .into_iter()
            .map(|(hive, readings)| HiveYield {
                hive_id: hive.id(),
                name: hive.name().to_string(),
                honey_grams: self.aggregator.current_honey_quantity(hive.id(), readings),
            })
            .filter(|entry| match level {
                ProductionLevel::High => entry.honey_grams > threshold,
                ProductionLevel::Low => entry.honey_grams < threshold,
            })
            .collect();

        ranked.sort_by(|a, b| {
            let by_yield = match level {
                ProductionLevel::High => b.honey_grams.total_cmp(&a.honey_grams),
                ProductionLevel::Low => a.honey_grams.total_cmp(&b.honey_grams),
            };
            by_yield.then_with(|| tie_break(a, b))
        });

        tracing::info!(
            level = %level,
            threshold,
            matched = ranked.len(),
            "production classification"
        );
        Ok(ranked)
    }
}

fn tie_break(a: &HiveYield, b: &HiveYield) -> Ordering {
    a.name.cmp(&b.name).then_with(|| a.hive_id.cmp(&b.hive_id))
}

/// Thresholds must be non-negative numbers
pub fn validate_threshold(threshold: f64) -> HiveResult<()> {
    if threshold.is_nan() || threshold < 0.0 {
        return Err(HiveError::invalid(format!(
            "production threshold must be >= 0, got {}",
            threshold
        )));
    }
    Ok(())
}
