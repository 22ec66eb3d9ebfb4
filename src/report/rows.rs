//! Flat output rows for the ranking and cutoff tables.

use crate::cutoff::{CutoffRule, CutoffSet, Direction};
use crate::impact::{EnrollmentCriteria, Impact};
use crate::pipeline::AnalysisReport;
use crate::rank::{BiomarkerResult, RankedBiomarkers};
use crate::select::{SelectionStatus, SelectionStep};
use serde::{Deserialize, Serialize};

/// One row of the biomarker ranking table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    pub biomarker: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "OR")]
    pub odds_ratio: Option<f64>,
    #[serde(rename = "CI_lower")]
    pub ci_lower: Option<f64>,
    #[serde(rename = "CI_upper")]
    pub ci_upper: Option<f64>,
    pub p_value: Option<f64>,
    #[serde(rename = "AUC")]
    pub auc: Option<f64>,
    pub rank: Option<usize>,
    pub status: String,
    pub reason: Option<String>,
    pub eligible: bool,
    pub eligibility: String,
    pub n_observations: usize,
    /// Level compared for categorical odds ratios.
    pub contrast: Option<String>,
}

impl From<&BiomarkerResult> for RankingRow {
    fn from(r: &BiomarkerResult) -> Self {
        let or = r.odds_ratio.as_ref();
        Self {
            biomarker: r.name.clone(),
            kind: r.kind.name().to_string(),
            odds_ratio: or.map(|o| o.estimate),
            ci_lower: or.map(|o| o.ci_lower),
            ci_upper: or.map(|o| o.ci_upper),
            p_value: r.p_value,
            auc: r.auc,
            rank: r.rank,
            status: r.status.to_string(),
            reason: r.reason.as_ref().map(|e| e.to_string()),
            eligible: r.is_eligible(),
            eligibility: r.eligibility.to_string(),
            n_observations: r.n_observations,
            contrast: or.and_then(|o| o.contrast.clone()),
        }
    }
}

/// Ranking table in output order.
pub fn ranking_rows(ranked: &RankedBiomarkers) -> Vec<RankingRow> {
    ranked.results().iter().map(RankingRow::from).collect()
}

/// One row of the cutoff table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutoffRow {
    pub biomarker: String,
    pub rank: Option<usize>,
    /// `≥`, `<` or `∈`; empty when undefined.
    pub operator: String,
    pub threshold_or_category: Option<String>,
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
    pub youden_index: Option<f64>,
    /// Response rate at or above the threshold, or inside the enriched category.
    pub response_rate_above: Option<f64>,
    /// Response rate below the threshold, or outside the enriched category.
    pub response_rate_below: Option<f64>,
    pub n_above: Option<usize>,
    pub n_below: Option<usize>,
    pub reason: Option<String>,
}

/// Cutoff table in rank order.
///
/// For continuous cutoffs `above`/`below` follow the threshold; for
/// categorical cutoffs they are the enriched category and the rest.
pub fn cutoff_rows(cutoffs: &CutoffSet) -> Vec<CutoffRow> {
    cutoffs
        .results()
        .iter()
        .map(|c| {
            let mut row = CutoffRow {
                biomarker: c.biomarker.clone(),
                rank: c.rank,
                operator: String::new(),
                threshold_or_category: None,
                sensitivity: None,
                specificity: None,
                youden_index: None,
                response_rate_above: None,
                response_rate_below: None,
                n_above: None,
                n_below: None,
                reason: c.failure.as_ref().map(|f| f.to_string()),
            };
            match &c.rule {
                Some(CutoffRule::Continuous(cut)) => {
                    row.operator = match cut.direction {
                        Direction::AtLeast => "≥",
                        Direction::Below => "<",
                    }
                    .to_string();
                    row.threshold_or_category = Some(cut.threshold.to_string());
                    row.sensitivity = Some(cut.sensitivity);
                    row.specificity = Some(cut.specificity);
                    row.youden_index = Some(cut.youden);
                    row.response_rate_above = finite(cut.response_rate_above);
                    row.response_rate_below = finite(cut.response_rate_below);
                    row.n_above = Some(cut.n_above);
                    row.n_below = Some(cut.n_below);
                }
                Some(CutoffRule::Categorical(cut)) => {
                    let n_in = cut
                        .rates
                        .iter()
                        .find(|r| r.category == cut.enriched_category)
                        .map_or(0, |r| r.n);
                    let n_all: usize = cut.rates.iter().map(|r| r.n).sum();
                    row.operator = "∈".to_string();
                    row.threshold_or_category = Some(cut.enriched_category.clone());
                    row.sensitivity = Some(cut.sensitivity);
                    row.specificity = Some(cut.specificity);
                    row.youden_index = Some(cut.sensitivity + cut.specificity - 1.0);
                    row.response_rate_above = finite(cut.response_rate_in);
                    row.response_rate_below = finite(cut.response_rate_out);
                    row.n_above = Some(n_in);
                    row.n_below = Some(n_all - n_in);
                }
                None => {}
            }
            row
        })
        .collect()
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Enrollment-criteria summary written as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaSummary {
    pub criteria: Vec<String>,
    pub status: SelectionStatus,
    pub impact: Impact,
    pub steps: Vec<SelectionStep>,
    pub max_criteria: usize,
    pub min_eligible_fraction: f64,
    pub min_auc: f64,
    pub top_n: usize,
}

impl CriteriaSummary {
    pub fn new(criteria: &EnrollmentCriteria, report: &AnalysisReport) -> Self {
        Self {
            criteria: criteria.criterion_strings(),
            status: criteria.status,
            impact: criteria.impact.clone(),
            steps: criteria.steps.clone(),
            max_criteria: report.config.max_criteria,
            min_eligible_fraction: report.config.min_eligible_fraction,
            min_auc: report.config.min_auc,
            top_n: report.config.top_n,
        }
    }
}

/// Summary of a report's enrollment criteria.
pub fn criteria_summary(report: &AnalysisReport) -> CriteriaSummary {
    CriteriaSummary::new(&report.criteria, report)
}

/// Eligibility of one screened patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningRow {
    pub patient_id: String,
    pub eligible: bool,
}

/// Screening output rows in input order.
pub fn screening_rows(screened: &[(String, bool)]) -> Vec<ScreeningRow> {
    screened
        .iter()
        .map(|(patient_id, eligible)| ScreeningRow {
            patient_id: patient_id.clone(),
            eligible: *eligible,
        })
        .collect()
}
