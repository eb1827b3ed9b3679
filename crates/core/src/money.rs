//! Money rounding.
//!
//! Monetary amounts are `f64` over the backend's numeric columns. All derived
//! amounts are rounded to 2 decimal places at the computation boundary so that
//! stored headers agree with what the UI showed at entry time.

/// Round to 2 decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_float_noise() {
        assert_eq!(round2(0.1 + 0.2), 0.3);
        assert_eq!(round2(2.344), 2.34);
        assert_eq!(round2(2.346), 2.35);
    }

    #[test]
    fn negative_amounts() {
        assert_eq!(round2(-2.344), -2.34);
        assert_eq!(round2(-2.346), -2.35);
    }

    #[test]
    fn integers_pass_through() {
        assert_eq!(round2(10.0), 10.0);
        assert_eq!(round2(0.0), 0.0);
    }
}
