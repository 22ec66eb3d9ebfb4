//! End-to-end analysis: validate, rank, optimize cutoffs, select criteria,
//! compute impact.
//!
//! Each stage consumes the previous stage's typed result; nothing is shared
//! mutably between stages.

use crate::cutoff::{optimize_cutoffs_with, CutoffSet};
use crate::data::{summarize, Dataset, DatasetSummary, RawTable};
use crate::error::{Result, TrialixError};
use crate::impact::{compute_impact, EnrollmentCriteria};
use crate::pipeline::{AnalysisConfig, CancellationToken};
use crate::rank::{rank_with, RankedBiomarkers};
use crate::select::select_criteria;
use crate::validate::validate_with;
use log::info;
use serde::Serialize;
use std::path::Path;

/// Everything produced by one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub config: AnalysisConfig,
    pub summary: DatasetSummary,
    pub ranking: RankedBiomarkers,
    pub cutoffs: CutoffSet,
    pub criteria: EnrollmentCriteria,
}

/// Run only the validation stage.
pub fn run_validation(table: &RawTable, config: &AnalysisConfig) -> Result<(Dataset, DatasetSummary)> {
    config.validate()?;
    let dataset = validate_with(table, &config.validation_options())?;
    let summary = summarize(&dataset);
    Ok((dataset, summary))
}

/// Run the full analysis on an in-memory table.
pub fn run_analysis(
    table: &RawTable,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> Result<AnalysisReport> {
    let (dataset, summary) = run_validation(table, config)?;
    analyze_dataset(&dataset, summary, config, cancel)
}

/// Run the full analysis on a CSV file.
pub fn run_analysis_csv<P: AsRef<Path>>(
    path: P,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> Result<AnalysisReport> {
    let path = path.as_ref();
    info!("Loading {}", path.display());
    let table = RawTable::from_csv(path)?;
    run_analysis(&table, config, cancel)
}

/// Run the analysis stages on an already validated dataset.
pub fn analyze_dataset(
    dataset: &Dataset,
    summary: DatasetSummary,
    config: &AnalysisConfig,
    cancel: &CancellationToken,
) -> Result<AnalysisReport> {
    config.validate()?;

    let ranking = rank_with(dataset, &config.rank_options(), cancel)?;
    let cutoffs = optimize_cutoffs_with(dataset, &ranking, config.threads, cancel)?;
    if cancel.is_cancelled() {
        return Err(TrialixError::Cancelled {
            stage: "criteria selection",
        });
    }
    let selected = select_criteria(
        dataset,
        &ranking,
        &cutoffs,
        config.max_criteria,
        config.min_eligible_fraction,
    )?;
    let criteria = compute_impact(dataset, selected);

    Ok(AnalysisReport {
        config: config.clone(),
        summary,
        ranking,
        cutoffs,
        criteria,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::RawValue;

    fn table(n: usize) -> RawTable {
        let columns = vec!["patient_id".into(), "response".into(), "marker".into()];
        let rows = (0..n)
            .map(|i| {
                let value = (i % 30) as f64;
                let responder = value >= 18.0 || i % 11 == 0;
                vec![
                    RawValue::Text(format!("P{}", i)),
                    RawValue::Text(if responder { "yes" } else { "no" }.into()),
                    RawValue::Number(value),
                ]
            })
            .collect();
        RawTable::new(columns, rows).unwrap()
    }

    #[test]
    fn test_run_analysis() {
        let config = AnalysisConfig::new("response").threads(2);
        let report = run_analysis(&table(90), &config, &CancellationToken::new()).unwrap();

        assert_eq!(report.summary.n_patients, 90);
        assert_eq!(report.ranking.results()[0].name, "marker");
        assert_eq!(report.cutoffs.len(), 1);
        assert_eq!(report.criteria.criterion_strings(), vec!["marker ≥ 18"]);
        assert!(report.criteria.impact.is_consistent());
    }

    #[test]
    fn test_cancelled_run_returns_error() {
        let token = CancellationToken::new();
        token.cancel();
        let err = run_analysis(&table(90), &AnalysisConfig::new("response"), &token).unwrap_err();
        assert!(matches!(err, TrialixError::Cancelled { stage: "ranking" }));
    }

    #[test]
    fn test_invalid_config_rejected_before_validation() {
        let config = AnalysisConfig::new("response").min_auc(2.0);
        let err = run_analysis(&table(90), &config, &CancellationToken::new()).unwrap_err();
        assert!(matches!(err, TrialixError::InvalidParameter(_)));
    }
}
