//! Univariate logistic regression by iteratively reweighted least squares.
//!
//! Each biomarker is fit independently on its own non-missing subset. A fit
//! that fails to converge within the iteration cap, or whose coefficients
//! exceed the stability bound, is reported as unstable rather than retried.

use crate::error::BiomarkerFitError;
use crate::model::DesignMatrix;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Maximum iterations for IRLS convergence.
pub const MAX_ITER: usize = 25;

/// Convergence tolerance for coefficient changes.
const TOL: f64 = 1e-8;

/// Coefficients beyond this magnitude indicate (quasi-)complete separation.
pub const COEF_BOUND: f64 = 15.0;

/// Fitted probabilities are kept inside (EPS, 1 - EPS).
const EPS: f64 = 1e-10;

/// Result of fitting a logistic model to one biomarker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticFit {
    /// Coefficient names from the design matrix.
    pub coefficient_names: Vec<String>,
    /// Estimated coefficients (log-odds scale).
    pub coefficients: Vec<f64>,
    /// Coefficient covariance (inverse Fisher information), row-major.
    /// `None` when the information matrix is singular.
    pub covariance: Option<Vec<Vec<f64>>>,
    /// Log-likelihood at the final coefficients.
    pub log_likelihood: f64,
    /// Number of IRLS iterations performed.
    pub iterations: usize,
    /// Whether the coefficient change fell below tolerance.
    pub converged: bool,
    /// Linear predictor per observation.
    #[serde(skip)]
    pub linear_predictor: Vec<f64>,
}

impl LogisticFit {
    /// Get coefficient by index.
    pub fn coefficient(&self, index: usize) -> Option<f64> {
        self.coefficients.get(index).copied()
    }

    /// Standard error of a coefficient.
    pub fn std_error(&self, index: usize) -> Option<f64> {
        let cov = self.covariance.as_ref()?;
        let v = cov.get(index)?.get(index).copied()?;
        (v >= 0.0).then(|| v.sqrt())
    }

    /// Wald z-statistic for a coefficient.
    pub fn z_statistic(&self, index: usize) -> Option<f64> {
        let coef = self.coefficient(index)?;
        let se = self.std_error(index)?;
        if se > 0.0 {
            Some(coef / se)
        } else {
            None
        }
    }

    /// Joint Wald χ² statistic for all non-intercept coefficients.
    ///
    /// `b' V⁻¹ b` where `b` and `V` are the slope block of the coefficients
    /// and covariance.
    pub fn joint_wald_statistic(&self) -> Option<f64> {
        let cov = self.covariance.as_ref()?;
        let k = self.coefficients.len().checked_sub(1)?;
        if k == 0 {
            return None;
        }
        let b = DVector::from_iterator(k, self.coefficients[1..].iter().copied());
        let v = DMatrix::from_fn(k, k, |i, j| cov[i + 1][j + 1]);
        let v_inv = v.try_inverse()?;
        let stat = (b.transpose() * v_inv * &b)[(0, 0)];
        stat.is_finite().then_some(stat)
    }

    /// Check the fit against the stability policy.
    pub fn check_stability(&self) -> Result<(), BiomarkerFitError> {
        if let Some(&coefficient) = self
            .coefficients
            .iter()
            .skip(1)
            .find(|c| !c.is_finite() || c.abs() > COEF_BOUND)
        {
            return Err(BiomarkerFitError::Separation {
                coefficient,
                bound: COEF_BOUND,
            });
        }
        if !self.converged {
            return Err(BiomarkerFitError::NonConvergence {
                iterations: self.iterations,
            });
        }
        if self.covariance.is_none() {
            return Err(BiomarkerFitError::SingularInformation);
        }
        Ok(())
    }
}

/// Fit a logistic regression of `responders` on the design.
///
/// Starts from the intercept-only solution and iterates weighted least
/// squares on the working response until the relative L1 change in the
/// coefficients drops below tolerance or `MAX_ITER` is reached.
pub fn fit_logistic(design: &DesignMatrix, responders: &[bool]) -> LogisticFit {
    let x = design.matrix();
    let n = x.nrows();
    let p = x.ncols();
    let y = DVector::from_iterator(n, responders.iter().map(|&r| if r { 1.0 } else { 0.0 }));

    let y_mean = (y.sum() / n.max(1) as f64).clamp(EPS, 1.0 - EPS);
    let mut beta = DVector::zeros(p);
    if p > 0 {
        beta[0] = (y_mean / (1.0 - y_mean)).ln();
    }

    let mut converged = false;
    let mut iterations = 0;
    let mut singular = false;

    for iter in 0..MAX_ITER {
        iterations = iter + 1;

        let eta = x * &beta;
        let mu = eta.map(logistic);
        let w = mu.map(|m| m * (1.0 - m));

        // Working response: z = eta + (y - mu) / w
        let z = DVector::from_fn(n, |i, _| eta[i] + (y[i] - mu[i]) / w[i]);

        let (xtwx, xtwz) = weighted_normal_equations(x, &w, &z);
        let beta_new = match xtwx.try_inverse() {
            Some(inv) => inv * xtwz,
            None => {
                singular = true;
                break;
            }
        };

        let delta: f64 = (&beta_new - &beta).iter().map(|d| d.abs()).sum();
        let scale: f64 = beta.iter().map(|b| b.abs()).sum::<f64>().max(1.0);

        beta = beta_new;

        if !beta.iter().all(|b| b.is_finite()) {
            break;
        }
        if delta / scale < TOL {
            converged = true;
            break;
        }
    }

    let eta = x * &beta;
    let mu = eta.map(logistic);
    let w = mu.map(|m| m * (1.0 - m));

    // Covariance from the Fisher information X'WX at the final coefficients.
    let (fisher, _) = weighted_normal_equations(x, &w, &DVector::zeros(n));
    let covariance = if singular {
        None
    } else {
        fisher
            .try_inverse()
            .map(|inv| (0..p).map(|i| (0..p).map(|j| inv[(i, j)]).collect()).collect())
    };

    let log_likelihood = (0..n)
        .map(|i| y[i] * mu[i].ln() + (1.0 - y[i]) * (1.0 - mu[i]).ln())
        .sum();

    LogisticFit {
        coefficient_names: design.coefficient_names().to_vec(),
        coefficients: beta.iter().copied().collect(),
        covariance,
        log_likelihood,
        iterations,
        converged,
        linear_predictor: eta.iter().copied().collect(),
    }
}

/// X'WX and X'Wz.
fn weighted_normal_equations(
    x: &DMatrix<f64>,
    w: &DVector<f64>,
    z: &DVector<f64>,
) -> (DMatrix<f64>, DVector<f64>) {
    let mut xw = x.clone();
    for i in 0..x.nrows() {
        for j in 0..x.ncols() {
            xw[(i, j)] *= w[i];
        }
    }
    let xt_w = xw.transpose();
    (&xt_w * x, xt_w * z)
}

/// Inverse logit, clamped away from 0 and 1.
fn logistic(eta: f64) -> f64 {
    (1.0 / (1.0 + (-eta).exp())).clamp(EPS, 1.0 - EPS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_intercept_only_matches_log_odds() {
        // Binary predictor: within-group log odds are recoverable in closed form.
        // x=0: 3 of 10 respond; x=1: 7 of 10 respond.
        let mut x = vec![0.0; 10];
        x.extend(vec![1.0; 10]);
        let mut y = vec![false; 10];
        for r in y.iter_mut().take(3) {
            *r = true;
        }
        y.extend((0..10).map(|i| i < 7));

        let design = DesignMatrix::continuous("x", &x);
        let fit = fit_logistic(&design, &y);

        assert!(fit.converged);
        let b0 = (0.3f64 / 0.7).ln();
        let b1 = (0.7f64 / 0.3).ln() - b0;
        assert_relative_eq!(fit.coefficients[0], b0, epsilon = 1e-6);
        assert_relative_eq!(fit.coefficients[1], b1, epsilon = 1e-6);

        // SE of a log odds ratio from a 2x2 table: sqrt(1/a + 1/b + 1/c + 1/d)
        let se = (1.0 / 3.0 + 1.0 / 7.0 + 1.0 / 7.0 + 1.0 / 3.0f64).sqrt();
        assert_relative_eq!(fit.std_error(1).unwrap(), se, epsilon = 1e-5);
        assert!(fit.check_stability().is_ok());
    }

    #[test]
    fn test_separated_data_is_unstable() {
        let x: Vec<f64> = (0..40).map(|i| i as f64 / 10.0 - 2.0).collect();
        let y: Vec<bool> = (0..40).map(|i| i >= 20).collect();

        let fit = fit_logistic(&DesignMatrix::continuous("x", &x), &y);
        assert!(fit.check_stability().is_err());
    }

    #[test]
    fn test_categorical_joint_wald_matches_single_z_for_two_levels() {
        let categories = vec!["neg".to_string(), "pos".to_string()];
        let codes: Vec<usize> = (0..40).map(|i| i % 2).collect();
        let y: Vec<bool> = (0..40).map(|i| (i % 2 == 1 && i % 3 != 0) || i % 7 == 0).collect();

        let fit = fit_logistic(&DesignMatrix::categorical("status", &codes, &categories), &y);
        let z = fit.z_statistic(1).unwrap();
        assert_relative_eq!(fit.joint_wald_statistic().unwrap(), z * z, epsilon = 1e-8);
    }

    #[test]
    fn test_linear_predictor_length() {
        let x: Vec<f64> = (0..30).map(|i| ((i * 7) % 11) as f64).collect();
        let y: Vec<bool> = (0..30).map(|i| i % 3 == 0).collect();
        let fit = fit_logistic(&DesignMatrix::continuous("x", &x), &y);
        assert_eq!(fit.linear_predictor.len(), 30);
        assert!(fit.log_likelihood < 0.0);
    }
}
