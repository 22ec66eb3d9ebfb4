//! Descriptive summary of a validated dataset.

use crate::data::Dataset;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-covariate profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CovariateSummary {
    pub name: String,
    pub kind: String,
    pub n_observed: usize,
    pub n_missing: usize,
    pub n_unparseable: usize,
    /// Vocabulary size for categorical covariates.
    pub n_categories: Option<usize>,
}

/// Dataset-level counts reported by `validate` and `analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub n_patients: usize,
    pub n_responders: usize,
    pub n_non_responders: usize,
    pub response_rate: f64,
    pub n_excluded_missing_outcome: usize,
    pub continuous_biomarkers: Vec<String>,
    pub categorical_biomarkers: Vec<String>,
    pub covariates: Vec<CovariateSummary>,
}

impl DatasetSummary {
    pub fn n_biomarkers(&self) -> usize {
        self.covariates.len()
    }
}

/// Summarize a validated dataset.
pub fn summarize(dataset: &Dataset) -> DatasetSummary {
    let covariates: Vec<CovariateSummary> = dataset
        .covariates()
        .iter()
        .enumerate()
        .map(|(i, c)| CovariateSummary {
            name: c.name.clone(),
            kind: c.kind.name().to_string(),
            n_observed: dataset.n_observed(i),
            n_missing: c.n_missing,
            n_unparseable: c.n_unparseable,
            n_categories: (!c.kind.is_continuous()).then(|| c.kind.categories().len()),
        })
        .collect();

    let (continuous, categorical): (Vec<_>, Vec<_>) = dataset
        .covariates()
        .iter()
        .partition(|c| c.kind.is_continuous());

    DatasetSummary {
        n_patients: dataset.n_patients(),
        n_responders: dataset.n_responders(),
        n_non_responders: dataset.n_non_responders(),
        response_rate: dataset.response_rate(),
        n_excluded_missing_outcome: dataset.n_excluded_missing_outcome(),
        continuous_biomarkers: continuous.into_iter().map(|c| c.name.clone()).collect(),
        categorical_biomarkers: categorical.into_iter().map(|c| c.name.clone()).collect(),
        covariates,
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total patients:         {}", self.n_patients)?;
        writeln!(
            f,
            "Responders:             {} ({:.1}%)",
            self.n_responders,
            self.response_rate * 100.0
        )?;
        writeln!(
            f,
            "Non-responders:         {} ({:.1}%)",
            self.n_non_responders,
            (1.0 - self.response_rate) * 100.0
        )?;
        if self.n_excluded_missing_outcome > 0 {
            writeln!(
                f,
                "Excluded (no outcome):  {}",
                self.n_excluded_missing_outcome
            )?;
        }
        writeln!(f, "Biomarkers:             {}", self.n_biomarkers())?;
        writeln!(f, "  Continuous:           {}", self.continuous_biomarkers.len())?;
        writeln!(f, "  Categorical:          {}", self.categorical_biomarkers.len())?;
        for c in &self.covariates {
            write!(
                f,
                "    {:<20} {:<11} observed={} missing={}",
                c.name, c.kind, c.n_observed, c.n_missing
            )?;
            if c.n_unparseable > 0 {
                write!(f, " unparseable={}", c.n_unparseable)?;
            }
            if let Some(k) = c.n_categories {
                write!(f, " categories={}", k)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
