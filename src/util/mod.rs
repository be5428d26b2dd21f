pub mod version;

/// Rounds to two decimal places (currency and kilograms).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rounds up to the next hundredth. Float noise just above a hundredth
/// (`0.1 + 0.2`) does not bump the result.
pub fn ceil2(value: f64) -> f64 {
    ((value * 100.0) - 1e-6).ceil() / 100.0
}

/// Fixed-precision integer form of a quantity, in hundredths.
pub fn hundredths(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

/// Lowercase ASCII identifier fragment: runs of non-alphanumerics collapse to `-`.
pub fn slug(raw: &str) -> String {
    raw.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_absorbs_float_noise() {
        assert_eq!(round2(0.1 + 0.2), 0.3);
        assert_eq!(hundredths(2.999_999_9), 300);
        assert_eq!(hundredths(3.0), hundredths(3.000_000_1));
    }

    #[test]
    fn ceil_rounds_up_to_the_next_hundredth() {
        assert_eq!(ceil2(2.344), 2.35);
        assert_eq!(ceil2(0.004), 0.01);
        assert_eq!(ceil2(2.34), 2.34);
        assert_eq!(ceil2(0.1 + 0.2), 0.3);
        assert_eq!(ceil2(50.0), 50.0);
    }

    #[test]
    fn slug_collapses_separators() {
        assert_eq!(slug("Frete Estimado"), "frete-estimado");
        assert_eq!(slug("Jadlog"), "jadlog");
        assert_eq!(slug("  .PACKAGE  "), "package");
    }
}
