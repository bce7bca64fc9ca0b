//! Property-based tests for the yield aggregator

#[cfg(test)]
mod property_tests {
    use crate::hive::HiveId;
    use crate::telemetry::{IndicatorType, SensorReading, YieldAggregator};
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    fn indicator_strategy() -> impl Strategy<Value = IndicatorType> {
        prop_oneof![
            Just(IndicatorType::Weight),
            Just(IndicatorType::TemperatureInside),
            Just(IndicatorType::HumidityInside),
            Just(IndicatorType::BeeMovementIn),
        ]
    }

    fn log_strategy() -> impl Strategy<Value = Vec<(IndicatorType, f64)>> {
        prop::collection::vec((indicator_strategy(), -100.0f64..20_000.0), 0..40)
    }

    fn build(hive: HiveId, entries: &[(IndicatorType, f64)]) -> Vec<SensorReading> {
        let start = Utc::now();
        entries
            .iter()
            .enumerate()
            .map(|(i, (indicator, value))| {
                SensorReading::new(hive, *indicator, *value, "u").at(start + Duration::seconds(i as i64))
            })
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// The current quantity is the maximum weight, or 0 without weights.
        #[test]
        fn property_current_is_max_weight(entries in log_strategy()) {
            let hive = HiveId::new();
            let log = build(hive, &entries);
            let expected = entries
                .iter()
                .filter(|(i, _)| *i == IndicatorType::Weight)
                .map(|(_, v)| *v)
                .reduce(f64::max)
                .unwrap_or(0.0);
            prop_assert_eq!(YieldAggregator::default().current_honey_quantity(hive, &log), expected);
        }

        /// Reading order does not change the result.
        #[test]
        fn property_order_independent(entries in log_strategy()) {
            let hive = HiveId::new();
            let aggregator = YieldAggregator::default();
            let log = build(hive, &entries);
            let mut reversed = log.clone();
            reversed.reverse();
            prop_assert_eq!(
                aggregator.current_honey_quantity(hive, &log),
                aggregator.current_honey_quantity(hive, &reversed)
            );
        }

        /// The summary agrees with the direct query and sees the newest sample.
        #[test]
        fn property_summary_consistent(entries in log_strategy()) {
            let hive = HiveId::new();
            let aggregator = YieldAggregator::default();
            let log = build(hive, &entries);
            let summary = aggregator.summarize(hive, &log);

            prop_assert_eq!(summary.current_grams, aggregator.current_honey_quantity(hive, &log));
            let last_weight = log.iter().filter(|r| r.is_weight()).last().map(|r| r.value);
            prop_assert_eq!(summary.latest_grams, last_weight);
            prop_assert!(summary.abnormal <= summary.samples);
        }
    }
}
