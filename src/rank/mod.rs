//! Biomarker ranking by univariate logistic association.
//!
//! Every candidate covariate is fit independently on its own non-missing
//! subset, then the stable fits are ordered by p-value, AUC and name.
//! Fits run on a bounded worker pool; results are reassembled into the
//! deterministic ranking order before returning.

mod fit;

pub use fit::MIN_OBSERVATIONS;

use crate::data::{CovariateKind, Dataset};
use crate::error::{BiomarkerFitError, Result, TrialixError};
use crate::pipeline::CancellationToken;
use log::info;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Outcome of fitting one biomarker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiomarkerStatus {
    /// Fit converged within the stability bound.
    Ok,
    /// Fit did not converge or hit the separation bound.
    Unstable,
    /// Not modeled (constant, too few observations, one outcome class).
    Skipped,
}

impl fmt::Display for BiomarkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BiomarkerStatus::Ok => "ok",
            BiomarkerStatus::Unstable => "unstable",
            BiomarkerStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Whether a biomarker is passed on to cutoff optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    Eligible,
    /// Status was not ok.
    NotRanked,
    /// AUC below the configured minimum.
    BelowMinAuc,
    /// Passed the AUC filter but fell outside the top-N.
    OutsideTopN,
}

impl Eligibility {
    pub fn is_eligible(self) -> bool {
        matches!(self, Eligibility::Eligible)
    }
}

impl fmt::Display for Eligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Eligibility::Eligible => "eligible",
            Eligibility::NotRanked => "not ranked",
            Eligibility::BelowMinAuc => "AUC below minimum",
            Eligibility::OutsideTopN => "outside top N",
        };
        f.write_str(s)
    }
}

/// Odds ratio with its Wald 95% interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsRatio {
    /// exp(coefficient); per standard deviation for continuous biomarkers.
    pub estimate: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    /// Standard error of the log odds ratio.
    pub std_error: f64,
    /// Level compared against the reference, for categorical biomarkers.
    pub contrast: Option<String>,
}

/// Ranking record for one candidate biomarker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerResult {
    pub name: String,
    pub kind: CovariateKind,
    /// Size of the non-missing subset the model was fit on.
    pub n_observations: usize,
    pub n_responders: usize,
    pub n_non_responders: usize,
    /// Slope on the log-odds scale (largest level for categorical).
    pub coefficient: Option<f64>,
    /// Undefined unless status is ok.
    pub odds_ratio: Option<OddsRatio>,
    pub p_value: Option<f64>,
    pub auc: Option<f64>,
    pub iterations: Option<usize>,
    /// 1-based position among ok biomarkers.
    pub rank: Option<usize>,
    pub status: BiomarkerStatus,
    pub reason: Option<BiomarkerFitError>,
    pub eligibility: Eligibility,
}

impl BiomarkerResult {
    pub fn is_eligible(&self) -> bool {
        self.eligibility.is_eligible()
    }

    /// Direction of association; `true` when higher values favour response.
    pub fn is_positive(&self) -> bool {
        self.coefficient.map_or(true, |c| c >= 0.0)
    }
}

/// Ranking options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankOptions {
    /// Minimum AUC for downstream eligibility.
    pub min_auc: f64,
    /// Cap on the number of eligible biomarkers.
    pub top_n: Option<usize>,
    /// Worker threads; all cores when `None`.
    pub threads: Option<usize>,
    /// Restrict ranking to these covariates.
    pub biomarkers: Option<Vec<String>>,
}

impl RankOptions {
    pub fn new(min_auc: f64) -> Self {
        Self {
            min_auc,
            top_n: None,
            threads: None,
            biomarkers: None,
        }
    }
}

/// Ranked biomarkers, only constructible by [`rank`] and [`rank_with`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedBiomarkers {
    results: Vec<BiomarkerResult>,
    min_auc: f64,
    top_n: Option<usize>,
}

impl RankedBiomarkers {
    /// All results: ranked biomarkers in rank order, then the rest in
    /// column order.
    pub fn results(&self) -> &[BiomarkerResult] {
        &self.results
    }

    /// Eligible biomarkers in rank order.
    pub fn eligible(&self) -> impl Iterator<Item = &BiomarkerResult> {
        self.results.iter().filter(|r| r.is_eligible())
    }

    pub fn n_eligible(&self) -> usize {
        self.eligible().count()
    }

    /// Number of biomarkers with status ok.
    pub fn n_ranked(&self) -> usize {
        self.results.iter().filter(|r| r.rank.is_some()).count()
    }

    pub fn get(&self, name: &str) -> Option<&BiomarkerResult> {
        self.results.iter().find(|r| r.name == name)
    }

    pub fn min_auc(&self) -> f64 {
        self.min_auc
    }

    pub fn top_n(&self) -> Option<usize> {
        self.top_n
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Rank every candidate biomarker of the dataset.
pub fn rank(dataset: &Dataset, min_auc: f64) -> Result<RankedBiomarkers> {
    rank_with(dataset, &RankOptions::new(min_auc), &CancellationToken::new())
}

/// Rank biomarkers with explicit options and a cancellation token.
///
/// A cancelled run returns [`TrialixError::Cancelled`]; partial rankings
/// are discarded.
pub fn rank_with(
    dataset: &Dataset,
    options: &RankOptions,
    cancel: &CancellationToken,
) -> Result<RankedBiomarkers> {
    let indices = select_covariates(dataset, options.biomarkers.as_deref())?;
    info!("Ranking {} candidate biomarker(s)", indices.len());

    let pool = build_pool(options.threads)?;
    let fitted: Vec<Option<BiomarkerResult>> = pool.install(|| {
        indices
            .par_iter()
            .map(|&i| {
                if cancel.is_cancelled() {
                    None
                } else {
                    Some(fit::evaluate_biomarker(dataset, i))
                }
            })
            .collect()
    });

    if cancel.is_cancelled() {
        return Err(TrialixError::Cancelled { stage: "ranking" });
    }
    let results: Vec<BiomarkerResult> = fitted.into_iter().flatten().collect();

    let ranked = order_results(results, options.min_auc, options.top_n);
    info!(
        "Ranked {} biomarker(s); {} eligible (min AUC {:.2})",
        ranked.n_ranked(),
        ranked.n_eligible(),
        options.min_auc
    );
    Ok(ranked)
}

/// Covariate indices to rank, in column order.
fn select_covariates(dataset: &Dataset, names: Option<&[String]>) -> Result<Vec<usize>> {
    let Some(names) = names else {
        return Ok((0..dataset.covariates().len()).collect());
    };
    let mut indices = Vec::with_capacity(names.len());
    for name in names {
        let idx = dataset
            .covariate_index(name)
            .ok_or_else(|| TrialixError::UnknownBiomarker {
                name: name.clone(),
                available: dataset
                    .covariate_names()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            })?;
        if !indices.contains(&idx) {
            indices.push(idx);
        }
    }
    indices.sort_unstable();
    Ok(indices)
}

pub(crate) fn build_pool(threads: Option<usize>) -> Result<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| TrialixError::ThreadPool(e.to_string()))
}

/// Total order over stable fits: p ascending, AUC descending, name.
fn compare_ranked(a: &BiomarkerResult, b: &BiomarkerResult) -> Ordering {
    let p = |r: &BiomarkerResult| r.p_value.unwrap_or(f64::INFINITY);
    let auc = |r: &BiomarkerResult| r.auc.unwrap_or(f64::NEG_INFINITY);
    p(a).total_cmp(&p(b))
        .then_with(|| auc(b).total_cmp(&auc(a)))
        .then_with(|| a.name.cmp(&b.name))
}

fn order_results(
    results: Vec<BiomarkerResult>,
    min_auc: f64,
    top_n: Option<usize>,
) -> RankedBiomarkers {
    let (mut ranked, rest): (Vec<_>, Vec<_>) = results
        .into_iter()
        .partition(|r| r.status == BiomarkerStatus::Ok);
    ranked.sort_by(compare_ranked);

    let mut n_eligible = 0;
    for (i, r) in ranked.iter_mut().enumerate() {
        r.rank = Some(i + 1);
        let passes_auc = r.auc.is_some_and(|auc| auc >= min_auc);
        r.eligibility = if !passes_auc {
            Eligibility::BelowMinAuc
        } else if top_n.is_some_and(|n| n_eligible >= n) {
            Eligibility::OutsideTopN
        } else {
            n_eligible += 1;
            Eligibility::Eligible
        };
    }

    let mut results = ranked;
    results.extend(rest.into_iter().map(|mut r| {
        r.rank = None;
        r.eligibility = Eligibility::NotRanked;
        r
    }));

    RankedBiomarkers {
        results,
        min_auc,
        top_n,
    }
}
