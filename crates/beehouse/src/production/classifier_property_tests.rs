//! Property-based tests for production classification

#[cfg(test)]
mod property_tests {
    use crate::hive::Hive;
    use crate::production::ProductionClassifier;
    use crate::telemetry::SensorReading;
    use proptest::prelude::*;

    fn fleet_strategy() -> impl Strategy<Value = Vec<Vec<f64>>> {
        prop::collection::vec(prop::collection::vec(0.0f64..10_000.0, 0..5), 0..12)
    }

    fn build(fleet: &[Vec<f64>]) -> Vec<(Hive, Vec<SensorReading>)> {
        fleet
            .iter()
            .enumerate()
            .map(|(i, grams)| {
                let hive = Hive::new(format!("hive-{:02}", i)).unwrap();
                let readings = grams.iter().map(|g| SensorReading::weight(hive.id(), *g)).collect();
                (hive, readings)
            })
            .collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// High and low results are disjoint, sorted, and on the right side
        /// of the threshold.
        #[test]
        fn property_partition_and_order(fleet in fleet_strategy(), threshold in 0.0f64..10_000.0) {
            let hives = build(&fleet);
            let input: Vec<_> = hives.iter().map(|(h, r)| (h, r.as_slice())).collect();
            let classifier = ProductionClassifier::default();

            let high = classifier.high_production(input.iter().copied(), threshold).unwrap();
            let low = classifier.low_production(input.iter().copied(), threshold).unwrap();

            prop_assert!(high.iter().all(|e| e.honey_grams > threshold));
            prop_assert!(low.iter().all(|e| e.honey_grams < threshold));
            prop_assert!(high.windows(2).all(|w| w[0].honey_grams >= w[1].honey_grams));
            prop_assert!(low.windows(2).all(|w| w[0].honey_grams <= w[1].honey_grams));
            prop_assert!(high.iter().all(|h| low.iter().all(|l| l.hive_id != h.hive_id)));

            let at_threshold = hives
                .iter()
                .filter(|(h, r)| classifier.aggregator().current_honey_quantity(h.id(), r) == threshold)
                .count();
            prop_assert_eq!(high.len() + low.len() + at_threshold, hives.len());
        }

        /// Any negative threshold is rejected.
        #[test]
        fn property_negative_threshold_rejected(threshold in -1.0e9f64..-1.0e-9) {
            let classifier = ProductionClassifier::default();
            let empty: Vec<(&Hive, &[SensorReading])> = Vec::new();
            prop_assert!(classifier.high_production(empty.clone(), threshold).is_err());
            prop_assert!(classifier.low_production(empty, threshold).is_err());
        }
    }
}
