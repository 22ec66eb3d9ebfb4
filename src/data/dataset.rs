//! Validated, typed patient dataset.
//!
//! A [`Dataset`] is only produced by [`crate::validate::validate`] and is
//! read-only afterwards. Every downstream stage borrows it.

use serde::{Deserialize, Serialize};

/// Canonical binary treatment outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Responder,
    NonResponder,
}

impl Outcome {
    /// 1 for responders, 0 otherwise.
    pub fn as_u8(self) -> u8 {
        match self {
            Outcome::Responder => 1,
            Outcome::NonResponder => 0,
        }
    }

    pub fn is_responder(self) -> bool {
        matches!(self, Outcome::Responder)
    }
}

/// Inferred type of a candidate biomarker column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CovariateKind {
    /// Numeric measurement.
    Continuous,
    /// Finite vocabulary, in first-seen order.
    Categorical { categories: Vec<String> },
}

impl CovariateKind {
    /// Short name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            CovariateKind::Continuous => "continuous",
            CovariateKind::Categorical { .. } => "categorical",
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, CovariateKind::Continuous)
    }

    /// Category vocabulary, empty for continuous columns.
    pub fn categories(&self) -> &[String] {
        match self {
            CovariateKind::Continuous => &[],
            CovariateKind::Categorical { categories } => categories,
        }
    }
}

/// A candidate biomarker column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Covariate {
    pub name: String,
    pub kind: CovariateKind,
    /// Explicit missing markers among retained patients.
    pub n_missing: usize,
    /// Non-numeric entries in a continuous column, treated as missing.
    pub n_unparseable: usize,
}

/// Value of one covariate for one patient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CovariateValue {
    Numeric(f64),
    /// Index into the covariate's category vocabulary.
    Category(usize),
    Missing,
}

impl CovariateValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CovariateValue::Missing)
    }

    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            CovariateValue::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_category(&self) -> Option<usize> {
        match self {
            CovariateValue::Category(c) => Some(*c),
            _ => None,
        }
    }
}

/// One patient with a canonical outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientRecord {
    pub patient_id: String,
    pub outcome: Outcome,
    /// One value per covariate, in [`Dataset::covariates`] order.
    pub values: Vec<CovariateValue>,
}

impl PatientRecord {
    /// Value of the covariate at `index`.
    pub fn value(&self, index: usize) -> CovariateValue {
        self.values.get(index).copied().unwrap_or(CovariateValue::Missing)
    }
}

/// Validated dataset: ordered patients plus typed covariates.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    patient_id_column: String,
    outcome_column: String,
    covariates: Vec<Covariate>,
    records: Vec<PatientRecord>,
    n_excluded_missing_outcome: usize,
}

impl Dataset {
    pub(crate) fn new(
        patient_id_column: String,
        outcome_column: String,
        covariates: Vec<Covariate>,
        records: Vec<PatientRecord>,
        n_excluded_missing_outcome: usize,
    ) -> Self {
        Self {
            patient_id_column,
            outcome_column,
            covariates,
            records,
            n_excluded_missing_outcome,
        }
    }

    pub fn patient_id_column(&self) -> &str {
        &self.patient_id_column
    }

    pub fn outcome_column(&self) -> &str {
        &self.outcome_column
    }

    pub fn covariates(&self) -> &[Covariate] {
        &self.covariates
    }

    pub fn records(&self) -> &[PatientRecord] {
        &self.records
    }

    /// Rows dropped because the outcome was missing.
    pub fn n_excluded_missing_outcome(&self) -> usize {
        self.n_excluded_missing_outcome
    }

    pub fn n_patients(&self) -> usize {
        self.records.len()
    }

    pub fn n_responders(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_responder()).count()
    }

    pub fn n_non_responders(&self) -> usize {
        self.n_patients() - self.n_responders()
    }

    /// Overall responder fraction.
    pub fn response_rate(&self) -> f64 {
        if self.records.is_empty() {
            return f64::NAN;
        }
        self.n_responders() as f64 / self.n_patients() as f64
    }

    /// Position of a covariate by name.
    pub fn covariate_index(&self, name: &str) -> Option<usize> {
        self.covariates.iter().position(|c| c.name == name)
    }

    pub fn covariate(&self, name: &str) -> Option<&Covariate> {
        self.covariates.iter().find(|c| c.name == name)
    }

    /// Covariate names in column order.
    pub fn covariate_names(&self) -> Vec<&str> {
        self.covariates.iter().map(|c| c.name.as_str()).collect()
    }

    /// Non-missing numeric values of a covariate with matching responder flags.
    pub fn numeric_subset(&self, index: usize) -> (Vec<f64>, Vec<bool>) {
        self.records
            .iter()
            .filter_map(|r| {
                r.value(index)
                    .as_numeric()
                    .map(|v| (v, r.outcome.is_responder()))
            })
            .unzip()
    }

    /// Non-missing category codes of a covariate with matching responder flags.
    pub fn category_subset(&self, index: usize) -> (Vec<usize>, Vec<bool>) {
        self.records
            .iter()
            .filter_map(|r| {
                r.value(index)
                    .as_category()
                    .map(|c| (c, r.outcome.is_responder()))
            })
            .unzip()
    }

    /// Number of patients with a usable value for a covariate.
    pub fn n_observed(&self, index: usize) -> usize {
        self.records
            .iter()
            .filter(|r| !r.value(index).is_missing())
            .count()
    }
}
