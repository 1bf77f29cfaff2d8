/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Divides, returning 0.0 instead of NaN or infinity when `den` is not positive.
pub fn ratio_or_zero(num: f64, den: f64) -> f64 {
    if den > 0.0 { num / den } else { 0.0 }
}

/// Share of `part` in `total` as a percentage, 0.0 when `total` is zero.
pub fn pct(part: f64, total: f64) -> f64 {
    ratio_or_zero(part, total) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_values() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_ratio_with_zero_denominator() {
        assert_eq!(ratio_or_zero(10.0, 0.0), 0.0);
        assert_eq!(ratio_or_zero(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_pct_normal_values() {
        assert_eq!(pct(50.0, 100.0), 50.0);
        assert_eq!(pct(1.0, 4.0), 25.0);
    }
}
