//! Per-biomarker univariate evaluation.

use crate::data::{CovariateKind, Dataset};
use crate::error::BiomarkerFitError;
use crate::model::{fit_logistic, DesignMatrix, LogisticFit};
use crate::rank::{BiomarkerResult, BiomarkerStatus, Eligibility, OddsRatio};
use crate::stats::{auc, chi_squared_p_value, n_distinct, standardize, wald_p_value, Z_95};
use log::{debug, warn};

/// Minimum non-missing observations for a biomarker to be modeled.
pub const MIN_OBSERVATIONS: usize = 20;

/// Evaluate the covariate at `index` on its non-missing subset.
pub(crate) fn evaluate_biomarker(dataset: &Dataset, index: usize) -> BiomarkerResult {
    let covariate = &dataset.covariates()[index];
    let result = match &covariate.kind {
        CovariateKind::Continuous => {
            let (values, responders) = dataset.numeric_subset(index);
            evaluate_continuous(&covariate.name, &values, &responders)
        }
        CovariateKind::Categorical { categories } => {
            let (codes, responders) = dataset.category_subset(index);
            evaluate_categorical(&covariate.name, &codes, categories, &responders)
        }
    };

    match (&result.status, &result.reason) {
        (BiomarkerStatus::Ok, _) => debug!(
            "{}: n={} OR={:.3} p={:.3e} AUC={:.3}",
            result.name,
            result.n_observations,
            result.odds_ratio.as_ref().map_or(f64::NAN, |o| o.estimate),
            result.p_value.unwrap_or(f64::NAN),
            result.auc.unwrap_or(f64::NAN)
        ),
        (status, Some(reason)) => warn!("{} {}: {}", result.name, status, reason),
        (status, None) => warn!("{} {}", result.name, status),
    }
    result
}

fn evaluate_continuous(name: &str, values: &[f64], responders: &[bool]) -> BiomarkerResult {
    let mut result = BiomarkerResult::empty(name, CovariateKind::Continuous, responders);
    // Zero variance takes precedence over the subset size rules.
    if !values.is_empty() && n_distinct(values) <= 1 {
        return result.skip(BiomarkerFitError::ConstantBiomarker { n: values.len() });
    }
    if let Err(reason) = check_subset(values.len(), responders) {
        return result.skip(reason);
    }
    let z = match standardize(values) {
        Some(z) => z,
        None => {
            return result.skip(BiomarkerFitError::ConstantBiomarker { n: values.len() });
        }
    };

    let fit = fit_logistic(&DesignMatrix::continuous(name, &z), responders);
    result.iterations = Some(fit.iterations);
    result.coefficient = fit.coefficient(1).filter(|c| c.is_finite());

    // Fitted score ordering follows the sign of the slope.
    let sign = match result.coefficient {
        Some(c) if c < 0.0 => -1.0,
        _ => 1.0,
    };
    let scores: Vec<f64> = z.iter().map(|v| sign * v).collect();
    result.auc = auc(&scores, responders);

    if let Err(reason) = fit.check_stability() {
        return result.unstable(reason);
    }

    result.odds_ratio = odds_ratio(&fit, 1, None);
    result.p_value = fit.z_statistic(1).map(wald_p_value);
    result.finish()
}

fn evaluate_categorical(
    name: &str,
    codes: &[usize],
    categories: &[String],
    responders: &[bool],
) -> BiomarkerResult {
    let kind = CovariateKind::Categorical {
        categories: categories.to_vec(),
    };
    let mut result = BiomarkerResult::empty(name, kind, responders);
    let observed_single_level = codes.windows(2).all(|w| w[0] == w[1]);
    if !codes.is_empty() && (categories.len() < 2 || observed_single_level) {
        return result.skip(BiomarkerFitError::ConstantBiomarker { n: codes.len() });
    }
    if let Err(reason) = check_subset(codes.len(), responders) {
        return result.skip(reason);
    }

    // The saturated model's fitted probabilities are the per-category rates.
    let rates = category_rates(codes, categories.len(), responders);
    let scores: Vec<f64> = codes.iter().map(|&c| rates[c]).collect();
    result.auc = auc(&scores, responders);

    let fit = fit_logistic(&DesignMatrix::categorical(name, codes, categories), responders);
    result.iterations = Some(fit.iterations);

    // Contrast reported: the level with the largest coefficient.
    let best = (1..fit.coefficients.len())
        .filter(|&j| fit.coefficients[j].is_finite())
        .fold(None, |best: Option<usize>, j| match best {
            Some(b) if fit.coefficients[b] >= fit.coefficients[j] => Some(b),
            _ => Some(j),
        });
    result.coefficient = best.map(|j| fit.coefficients[j]);

    if let Err(reason) = fit.check_stability() {
        return result.unstable(reason);
    }
    let Some(level) = best else {
        return result.unstable(BiomarkerFitError::SingularInformation);
    };

    let contrast = format!("{} vs {}", categories[level], categories[0]);
    result.odds_ratio = odds_ratio(&fit, level, Some(contrast));
    result.p_value = if categories.len() == 2 {
        fit.z_statistic(1).map(wald_p_value)
    } else {
        fit.joint_wald_statistic()
            .map(|stat| chi_squared_p_value(stat, categories.len() - 1))
    };
    result.finish()
}

/// Size and class-balance preconditions for fitting.
fn check_subset(n: usize, responders: &[bool]) -> Result<(), BiomarkerFitError> {
    if n < MIN_OBSERVATIONS {
        return Err(BiomarkerFitError::InsufficientObservations {
            n,
            min: MIN_OBSERVATIONS,
        });
    }
    let n_resp = responders.iter().filter(|&&r| r).count();
    let n_non = responders.len() - n_resp;
    if n_resp == 0 || n_non == 0 {
        return Err(BiomarkerFitError::SingleOutcomeClass {
            responders: n_resp,
            non_responders: n_non,
        });
    }
    Ok(())
}

/// Responder fraction per category code.
pub(crate) fn category_rates(codes: &[usize], k: usize, responders: &[bool]) -> Vec<f64> {
    let mut n = vec![0usize; k];
    let mut r = vec![0usize; k];
    for (&c, &resp) in codes.iter().zip(responders) {
        n[c] += 1;
        if resp {
            r[c] += 1;
        }
    }
    n.iter()
        .zip(&r)
        .map(|(&n, &r)| if n > 0 { r as f64 / n as f64 } else { f64::NAN })
        .collect()
}

fn odds_ratio(fit: &LogisticFit, index: usize, contrast: Option<String>) -> Option<OddsRatio> {
    let coef = fit.coefficient(index)?;
    let se = fit.std_error(index)?;
    Some(OddsRatio {
        estimate: coef.exp(),
        ci_lower: (coef - Z_95 * se).exp(),
        ci_upper: (coef + Z_95 * se).exp(),
        std_error: se,
        contrast,
    })
}

impl BiomarkerResult {
    fn empty(name: &str, kind: CovariateKind, responders: &[bool]) -> Self {
        let n_responders = responders.iter().filter(|&&r| r).count();
        Self {
            name: name.to_string(),
            kind,
            n_observations: responders.len(),
            n_responders,
            n_non_responders: responders.len() - n_responders,
            coefficient: None,
            odds_ratio: None,
            p_value: None,
            auc: None,
            iterations: None,
            rank: None,
            status: BiomarkerStatus::Ok,
            reason: None,
            eligibility: Eligibility::NotRanked,
        }
    }

    fn skip(mut self, reason: BiomarkerFitError) -> Self {
        self.status = BiomarkerStatus::Skipped;
        self.reason = Some(reason);
        self.coefficient = None;
        self.auc = None;
        self
    }

    fn unstable(mut self, reason: BiomarkerFitError) -> Self {
        self.status = BiomarkerStatus::Unstable;
        self.reason = Some(reason);
        self.odds_ratio = None;
        self.p_value = None;
        self
    }

    fn finish(self) -> Self {
        if self.p_value.is_none() || self.odds_ratio.is_none() {
            return self.unstable(BiomarkerFitError::SingularInformation);
        }
        self
    }
}
