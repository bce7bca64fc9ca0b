//! Property-based tests for the frame state machine

#[cfg(test)]
mod property_tests {
    use crate::hive::{state_for_weight, Frame, FrameState, FULL_FRAME_GRAMS};
    use proptest::prelude::*;

    fn weight_strategy() -> impl Strategy<Value = f64> {
        prop_oneof![
            Just(0.0),
            Just(FULL_FRAME_GRAMS - 1.0),
            Just(FULL_FRAME_GRAMS),
            0.0f64..10_000.0,
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Applying the same weight twice yields the same state as once.
        #[test]
        fn property_apply_weight_is_idempotent(
            history in prop::collection::vec(weight_strategy(), 0..10),
            grams in weight_strategy()
        ) {
            let mut frame = Frame::new("f");
            for w in history {
                frame.apply_weight(w).unwrap();
            }
            let once = frame.apply_weight(grams).unwrap();
            let snapshot = frame.clone();
            let twice = frame.apply_weight(grams).unwrap();
            prop_assert_eq!(once, twice);
            prop_assert_eq!(frame, snapshot);
        }

        /// Outside damage, state is a pure function of the latest weight.
        #[test]
        fn property_state_follows_latest_weight(
            weights in prop::collection::vec(weight_strategy(), 1..20)
        ) {
            let mut frame = Frame::new("f");
            for w in &weights {
                frame.apply_weight(*w).unwrap();
            }
            let last = *weights.last().unwrap();
            prop_assert_eq!(frame.state(), state_for_weight(last));
            prop_assert_eq!(frame.honey_weight_grams(), last);
        }

        /// Damage survives any weight updates, which are still recorded.
        #[test]
        fn property_damage_is_sticky(
            weights in prop::collection::vec(weight_strategy(), 1..20)
        ) {
            let mut frame = Frame::new("f");
            frame.mark_damaged();
            for w in &weights {
                prop_assert_eq!(frame.apply_weight(*w).unwrap(), FrameState::Damaged);
            }
            let last = *weights.last().unwrap();
            prop_assert_eq!(frame.honey_weight_grams(), last);
            prop_assert_eq!(frame.clear_damage(), state_for_weight(last));
        }

        /// Harvest succeeds exactly when the frame is full.
        #[test]
        fn property_harvest_only_when_full(grams in weight_strategy(), damaged in any::<bool>()) {
            let mut frame = Frame::new("f");
            frame.apply_weight(grams).unwrap();
            if damaged {
                frame.mark_damaged();
            }
            let was_full = frame.state() == FrameState::Full;
            let before = frame.clone();

            match frame.harvest() {
                Ok(harvested) => {
                    prop_assert!(was_full);
                    prop_assert_eq!(harvested, grams);
                    prop_assert_eq!(frame.state(), FrameState::Empty);
                    prop_assert_eq!(frame.honey_weight_grams(), 0.0);
                }
                Err(_) => {
                    prop_assert!(!was_full);
                    prop_assert_eq!(frame, before);
                }
            }
        }
    }
}
