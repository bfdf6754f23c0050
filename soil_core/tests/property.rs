use proptest::prelude::*;
use soil_core::{Calibration, MoistureLevel, normalize};

prop_compose! {
    fn calibration_strategy()(
        wet in -30_000i32..30_000,
        span in 1i32..40_000,
    ) -> Calibration {
        Calibration::new(wet, wet + span).expect("wet < dry by construction")
    }
}

proptest! {
    #[test]
    fn output_is_always_in_unit_range(cal in calibration_strategy(), raw in any::<i32>()) {
        let v = normalize(raw, &cal).value();
        prop_assert!((0.0..=1.0).contains(&v), "out of range: {v}");
    }

    #[test]
    fn monotonic_non_increasing_in_raw(cal in calibration_strategy(), a in any::<i32>(), b in any::<i32>()) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(normalize(lo, &cal) >= normalize(hi, &cal));
    }

    #[test]
    fn calibration_points_map_to_ends(cal in calibration_strategy()) {
        prop_assert_eq!(normalize(cal.wet_raw(), &cal), MoistureLevel::SATURATED);
        prop_assert_eq!(normalize(cal.dry_raw(), &cal), MoistureLevel::DRY);
    }

    #[test]
    fn normalize_is_deterministic(cal in calibration_strategy(), raw in any::<i32>()) {
        prop_assert_eq!(normalize(raw, &cal), normalize(raw, &cal));
    }
}

#[test]
fn documented_examples() {
    let cal = Calibration::new(8500, 19000).unwrap();
    assert!((normalize(13750, &cal).value() - 0.5).abs() < 1e-12);
    assert_eq!(normalize(5000, &cal), MoistureLevel::SATURATED);
    assert_eq!(normalize(25000, &cal), MoistureLevel::DRY);
}
