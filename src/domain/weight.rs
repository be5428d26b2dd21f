//! Billable weight: the greater of real and volumetric weight.

use super::entities::Dimensions;
use crate::util::ceil2;

/// Standard road/air divisor, cm³ per kg.
pub const DEFAULT_VOLUMETRIC_DIVISOR: f64 = 6000.0;

/// Volumetric weight in kg for the given package, unrounded.
pub fn volumetric_weight(dimensions: &Dimensions, divisor: f64) -> f64 {
    dimensions.volume_cm3() / divisor
}

/// Weight a carrier charges for.
///
/// Without dimensions this is the real weight. Inputs are expected to be validated
/// already (`real_weight_kg > 0`, every side `> 0`, `divisor > 0`). Both weights are
/// rounded up to two decimals, so the result is never below `real_weight_kg`.
pub fn compute_billable_weight(
    real_weight_kg: f64,
    dimensions: Option<&Dimensions>,
    divisor: f64,
) -> f64 {
    // `ceil2` forgives sub-micro noise; `max` keeps the bound exact.
    let real = ceil2(real_weight_kg).max(real_weight_kg);
    match dimensions {
        None => real,
        Some(dimensions) => real.max(ceil2(volumetric_weight(dimensions, divisor))),
    }
}

/// [`compute_billable_weight`] with [`DEFAULT_VOLUMETRIC_DIVISOR`].
pub fn billable_weight(real_weight_kg: f64, dimensions: Option<&Dimensions>) -> f64 {
    compute_billable_weight(real_weight_kg, dimensions, DEFAULT_VOLUMETRIC_DIVISOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_dimensions_returns_real_weight() {
        for weight in [0.05, 1.0, 3.0, 30.0] {
            assert_eq!(billable_weight(weight, None), weight);
        }
    }

    #[test]
    fn fractional_grams_round_up() {
        assert_eq!(billable_weight(12.345, None), 12.35);
        assert_eq!(billable_weight(2.344, None), 2.35);
        assert_eq!(billable_weight(0.004, None), 0.01);
    }

    #[test]
    fn volumetric_weight_rounds_up() {
        // 7 x 7 x 7 cm = 343 cm³ -> 0.0571 kg.
        let cube = Dimensions::new(7.0, 7.0, 7.0);
        assert_eq!(billable_weight(0.05, Some(&cube)), 0.06);
    }

    #[test]
    fn bulky_box_is_charged_by_volume() {
        // Boxed bicycle frame: 100 x 20 x 150 cm = 300000 cm³ -> 50 kg.
        let frame_box = Dimensions::new(100.0, 20.0, 150.0);
        assert_eq!(billable_weight(12.0, Some(&frame_box)), 50.0);
    }

    #[test]
    fn dense_parcel_is_charged_by_real_weight() {
        let small_box = Dimensions::new(10.0, 10.0, 10.0);
        assert_eq!(billable_weight(4.2, Some(&small_box)), 4.2);
    }

    #[test]
    fn billable_never_below_real() {
        let boxes = [
            Dimensions::new(1.0, 1.0, 1.0),
            Dimensions::new(30.0, 20.0, 10.0),
            Dimensions::new(80.0, 60.0, 40.0),
            Dimensions::new(200.0, 100.0, 50.0),
        ];
        for weight in [0.004, 0.1, 0.1 + 0.2, 0.75, 2.0, 2.344, 9.99, 12.345, 45.0] {
            assert!(billable_weight(weight, None) >= weight);
            for dims in &boxes {
                let billable = billable_weight(weight, Some(dims));
                assert!(billable >= weight, "{billable} < {weight}");
                assert!(billable > 0.0);
            }
        }
    }

    #[test]
    fn custom_divisor_is_honoured() {
        let parcel = Dimensions::new(50.0, 40.0, 30.0);
        assert_eq!(compute_billable_weight(1.0, Some(&parcel), 5000.0), 12.0);
        assert_eq!(compute_billable_weight(1.0, Some(&parcel), 6000.0), 10.0);
    }
}
