//! Wald test p-values.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

/// Two-sided 95% normal quantile used for odds-ratio intervals.
pub const Z_95: f64 = 1.96;

/// Two-sided p-value of a Wald z statistic: `2 * (1 - Φ(|z|))`.
pub fn wald_p_value(z: f64) -> f64 {
    if z.is_nan() {
        return f64::NAN;
    }
    match Normal::new(0.0, 1.0) {
        Ok(normal) => (2.0 * (1.0 - normal.cdf(z.abs()))).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

/// Upper-tail p-value of a χ² statistic with `df` degrees of freedom.
pub fn chi_squared_p_value(statistic: f64, df: usize) -> f64 {
    if statistic.is_nan() || df == 0 {
        return f64::NAN;
    }
    match ChiSquared::new(df as f64) {
        Ok(chi2) => (1.0 - chi2.cdf(statistic.max(0.0))).clamp(0.0, 1.0),
        Err(_) => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wald_p_value() {
        assert_relative_eq!(wald_p_value(0.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(wald_p_value(1.959964), 0.05, epsilon = 1e-5);
        assert_relative_eq!(wald_p_value(-1.959964), 0.05, epsilon = 1e-5);
        assert!(wald_p_value(f64::NAN).is_nan());
    }

    #[test]
    fn test_chi_squared_p_value() {
        // 5.991 is the 95th percentile of chi-square with 2 df
        assert_relative_eq!(chi_squared_p_value(5.991465, 2), 0.05, epsilon = 1e-5);
        // With 1 df the test matches the squared Wald z
        assert_relative_eq!(
            chi_squared_p_value(2.5f64.powi(2), 1),
            wald_p_value(2.5),
            epsilon = 1e-9
        );
    }
}
