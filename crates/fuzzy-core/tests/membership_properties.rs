use gimbal_control_model::{ActuatorRange, BandFractions, RuleThresholds};
use gimbal_fuzzy_core::actuator::ActuatorAxis;
use gimbal_fuzzy_core::membership::fuzzify;
use gimbal_fuzzy_core::rules::decide;
use gimbal_fuzzy_core::Direction;
use proptest::prelude::*;

fn band_strategy() -> impl Strategy<Value = BandFractions> {
    (0.0f64..0.5, 0.0f64..1.0).prop_map(|(outer, t)| BandFractions {
        outer,
        inner: (outer + (0.5 - outer) * t).min(0.5),
    })
}

fn thresholds_strategy() -> impl Strategy<Value = RuleThresholds> {
    (0.0f64..=1.0, 0.0f64..=1.0).prop_map(|(a, b)| RuleThresholds {
        hold: a.max(b),
        correct: a.min(b),
    })
}

proptest! {
    #[test]
    fn memberships_partition_unity(
        band in band_strategy(),
        extent in 10.0f64..5000.0,
        t in -0.2f64..1.2,
    ) {
        let m = fuzzify(t * extent, extent, band);
        for value in m.as_array() {
            prop_assert!((0.0..=1.0).contains(&value));
        }
        prop_assert!((m.sum() - 1.0).abs() < 1e-9, "sum = {}", m.sum());
    }

    #[test]
    fn at_most_two_adjacent_terms_are_nonzero(
        band in band_strategy(),
        extent in 10.0f64..5000.0,
        t in 0.0f64..=1.0,
    ) {
        let m = fuzzify(t * extent, extent, band);
        prop_assert!(m.exiting_negative == 0.0 || m.exiting_positive == 0.0);
    }

    #[test]
    fn memberships_are_continuous(
        band in band_strategy(),
        extent in 100.0f64..5000.0,
        t in 0.0f64..=1.0,
    ) {
        // Steepest slope is 1 / band width; keep the band wide enough that
        // a tiny step cannot jump far.
        prop_assume!((band.inner - band.outer) * extent > 1.0);
        let x = t * extent;
        let h = 1e-6;
        let a = fuzzify(x, extent, band);
        let b = fuzzify(x + h, extent, band);
        for (lhs, rhs) in a.as_array().iter().zip(b.as_array()) {
            prop_assert!((lhs - rhs).abs() < 1e-5);
        }
    }

    #[test]
    fn center_is_fully_centered(band in band_strategy(), extent in 1.0f64..10_000.0) {
        let m = fuzzify(extent / 2.0, extent, band);
        prop_assert_eq!(m.centered, 1.0);
    }

    #[test]
    fn decide_is_deterministic(
        n in 0.0f64..=1.0,
        c in 0.0f64..=1.0,
        p in 0.0f64..=1.0,
        thresholds in thresholds_strategy(),
    ) {
        let m = gimbal_fuzzy_core::MembershipVector::new(n, c, p);
        prop_assert_eq!(decide(&m, &thresholds), decide(&m, &thresholds));
    }

    #[test]
    fn sweep_never_reverses_more_than_boundaries_crossed(
        band in band_strategy(),
        thresholds in thresholds_strategy(),
    ) {
        let extent = 1920.0;
        let mut reversals = 0;
        let mut last: Option<Direction> = None;
        for i in 0..=3840 {
            let m = fuzzify(i as f64 * 0.5, extent, band);
            if let Some(direction) = decide(&m, &thresholds).direction() {
                if last.is_some_and(|prev| prev != direction) {
                    reversals += 1;
                }
                last = Some(direction);
            }
        }
        prop_assert!(reversals <= 4, "reversals = {}", reversals);
    }

    #[test]
    fn actuator_stays_in_range(
        min in -10.0f64..0.0,
        span in 0.001f64..20.0,
        deltas in proptest::collection::vec(
            prop_oneof![
                -1e6f64..1e6,
                Just(f64::INFINITY),
                Just(f64::NEG_INFINITY),
                Just(f64::MAX),
                Just(0.0),
            ],
            1..64,
        ),
    ) {
        let range = ActuatorRange { min, max: min + span };
        let mut axis = ActuatorAxis::new(range, 0.0).unwrap();
        for delta in deltas {
            let before = axis.position();
            axis.apply_delta(delta);
            prop_assert!(axis.position() >= range.min && axis.position() <= range.max);
            if delta == 0.0 {
                prop_assert_eq!(axis.position(), before);
            }
        }
    }
}
