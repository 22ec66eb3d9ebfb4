//! Cutoff optimization for eligible biomarkers.
//!
//! Continuous biomarkers get a Youden-optimal threshold; categorical
//! biomarkers get per-category response rates and an enriched category.
//! A biomarker whose cutoff is undefined is reported with its reason and
//! never reaches criteria selection.

mod categorical;
mod continuous;

pub use categorical::{enriched_category, CategoricalCutoff, CategoryRate};
pub use continuous::{youden_cutoff, ContinuousCutoff, Direction};

use crate::data::{CovariateKind, Dataset};
use crate::error::{CutoffFailure, Result, TrialixError};
use crate::pipeline::CancellationToken;
use crate::rank::{build_pool, BiomarkerResult, RankedBiomarkers};
use crate::select::Criterion;
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Cutoff rule for one biomarker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CutoffRule {
    Continuous(ContinuousCutoff),
    Categorical(CategoricalCutoff),
}

impl CutoffRule {
    /// Sensitivity of the rule against the true outcome.
    pub fn sensitivity(&self) -> f64 {
        match self {
            CutoffRule::Continuous(c) => c.sensitivity,
            CutoffRule::Categorical(c) => c.sensitivity,
        }
    }

    pub fn specificity(&self) -> f64 {
        match self {
            CutoffRule::Continuous(c) => c.specificity,
            CutoffRule::Categorical(c) => c.specificity,
        }
    }
}

/// Cutoff outcome for one eligible biomarker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffResult {
    pub biomarker: String,
    /// Rank carried over from the ranking stage.
    pub rank: Option<usize>,
    /// `None` when the cutoff is undefined.
    pub rule: Option<CutoffRule>,
    pub failure: Option<CutoffFailure>,
}

impl CutoffResult {
    pub fn is_defined(&self) -> bool {
        self.rule.is_some()
    }

    /// The enrollment criterion implied by this cutoff.
    pub fn criterion(&self) -> Option<Criterion> {
        match self.rule.as_ref()? {
            CutoffRule::Continuous(c) => Some(match c.direction {
                Direction::AtLeast => Criterion::at_least(&self.biomarker, c.threshold),
                Direction::Below => Criterion::below(&self.biomarker, c.threshold),
            }),
            CutoffRule::Categorical(c) => Some(Criterion::in_set(
                &self.biomarker,
                [c.enriched_category.clone()],
            )),
        }
    }
}

/// Cutoffs for the eligible biomarkers, in rank order.
///
/// Only constructible from a [`RankedBiomarkers`] value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutoffSet {
    results: Vec<CutoffResult>,
}

impl CutoffSet {
    pub fn results(&self) -> &[CutoffResult] {
        &self.results
    }

    pub fn get(&self, biomarker: &str) -> Option<&CutoffResult> {
        self.results.iter().find(|c| c.biomarker == biomarker)
    }

    /// Cutoffs that produced a rule, in rank order.
    pub fn defined(&self) -> impl Iterator<Item = &CutoffResult> {
        self.results.iter().filter(|c| c.is_defined())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Optimize cutoffs for every eligible biomarker.
pub fn optimize_cutoffs(dataset: &Dataset, ranked: &RankedBiomarkers) -> Result<CutoffSet> {
    optimize_cutoffs_with(dataset, ranked, None, &CancellationToken::new())
}

/// Optimize cutoffs on a worker pool of `threads` workers.
pub fn optimize_cutoffs_with(
    dataset: &Dataset,
    ranked: &RankedBiomarkers,
    threads: Option<usize>,
    cancel: &CancellationToken,
) -> Result<CutoffSet> {
    let eligible: Vec<&BiomarkerResult> = ranked.eligible().collect();
    info!("Optimizing cutoffs for {} eligible biomarker(s)", eligible.len());

    let pool = build_pool(threads)?;
    let results: Vec<Option<Result<CutoffResult>>> = pool.install(|| {
        eligible
            .par_iter()
            .map(|b| {
                if cancel.is_cancelled() {
                    None
                } else {
                    Some(cutoff_for(dataset, b))
                }
            })
            .collect()
    });

    if cancel.is_cancelled() {
        return Err(TrialixError::Cancelled {
            stage: "cutoff optimization",
        });
    }
    let results = results.into_iter().flatten().collect::<Result<Vec<_>>>()?;

    let n_defined = results.iter().filter(|c| c.is_defined()).count();
    info!("Derived {} of {} cutoff(s)", n_defined, results.len());
    Ok(CutoffSet { results })
}

fn cutoff_for(dataset: &Dataset, biomarker: &BiomarkerResult) -> Result<CutoffResult> {
    let index = dataset
        .covariate_index(&biomarker.name)
        .ok_or_else(|| TrialixError::UnknownBiomarker {
            name: biomarker.name.clone(),
            available: dataset
                .covariate_names()
                .into_iter()
                .map(String::from)
                .collect(),
        })?;

    let outcome = match &dataset.covariates()[index].kind {
        CovariateKind::Continuous => {
            let (values, responders) = dataset.numeric_subset(index);
            let direction = if biomarker.is_positive() {
                Direction::AtLeast
            } else {
                Direction::Below
            };
            youden_cutoff(&values, &responders, direction).map(CutoffRule::Continuous)
        }
        CovariateKind::Categorical { categories } => {
            let (codes, responders) = dataset.category_subset(index);
            enriched_category(&codes, categories, &responders).map(CutoffRule::Categorical)
        }
    };

    let (rule, failure) = match outcome {
        Ok(rule) => {
            debug!(
                "{}: sensitivity={:.3} specificity={:.3}",
                biomarker.name,
                rule.sensitivity(),
                rule.specificity()
            );
            (Some(rule), None)
        }
        Err(reason) => {
            warn!("{}: cutoff undefined ({})", biomarker.name, reason);
            (None, Some(reason))
        }
    };

    Ok(CutoffResult {
        biomarker: biomarker.name.clone(),
        rank: biomarker.rank,
        rule,
        failure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criterion_from_continuous_cutoff() {
        let result = CutoffResult {
            biomarker: "tmb".into(),
            rank: Some(1),
            rule: Some(CutoffRule::Continuous(ContinuousCutoff {
                threshold: 10.0,
                direction: Direction::AtLeast,
                sensitivity: 0.7,
                specificity: 0.6,
                youden: 0.3,
                response_rate_above: 0.5,
                response_rate_below: 0.2,
                n_above: 40,
                n_below: 60,
            })),
            failure: None,
        };
        assert_eq!(result.criterion().unwrap().to_string(), "tmb ≥ 10");
    }

    #[test]
    fn test_undefined_cutoff_has_no_criterion() {
        let result = CutoffResult {
            biomarker: "flat".into(),
            rank: Some(2),
            rule: None,
            failure: Some(CutoffFailure::InsufficientDistinctValues { n_distinct: 1 }),
        };
        assert!(!result.is_defined());
        assert!(result.criterion().is_none());
    }
}
