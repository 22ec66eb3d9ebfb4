//! Error types for the trialix library.
//!
//! Fatal conditions abort the pipeline through [`TrialixError`]. Conditions that
//! only affect one biomarker, one cutoff or one metric are carried as data on the
//! affected record ([`BiomarkerFitError`], [`CutoffFailure`], [`UndefinedMetric`])
//! so sibling computations keep running.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum TrialixError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Data validation failed: {0}")]
    Data(#[from] DataError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown biomarker '{name}'. Available: {available:?}")]
    UnknownBiomarker { name: String, available: Vec<String> },

    #[error("Worker pool error: {0}")]
    ThreadPool(String),

    #[error("Analysis cancelled before {stage} completed")]
    Cancelled { stage: &'static str },

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which minimum-size rule a dataset violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSizeRule {
    TotalPatients,
    Responders,
    NonResponders,
}

impl fmt::Display for SampleSizeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TotalPatients => "patients",
            Self::Responders => "responders",
            Self::NonResponders => "non-responders",
        };
        f.write_str(name)
    }
}

/// Fatal dataset problems. The first violated rule is reported.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Input table has no rows")]
    EmptyTable,

    #[error("Missing required column '{column}'. Available columns: {}{}",
        .available.join(", "),
        .suggestion.as_ref().map(|s| format!(". Did you mean '{}'?", s)).unwrap_or_default())]
    MissingColumn {
        column: String,
        available: Vec<String>,
        suggestion: Option<String>,
    },

    #[error("No biomarker columns found besides '{patient_id_column}' and '{outcome_column}'")]
    NoBiomarkerColumns {
        patient_id_column: String,
        outcome_column: String,
    },

    #[error("Missing patient identifier at row {row}")]
    MissingPatientId { row: usize },

    #[error("Duplicate patient identifier '{patient_id}' at row {row} (first seen at row {first_row})")]
    DuplicatePatientId {
        patient_id: String,
        first_row: usize,
        row: usize,
    },

    #[error("Unrecognized outcome label '{value}' in column '{column}' at row {row} \
             (expected responder/non_responder, 1/0 or yes/no)")]
    UnrecognizedOutcomeLabel {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Insufficient sample size: {observed} {rule} (minimum required: {required})")]
    InsufficientSampleSize {
        rule: SampleSizeRule,
        observed: usize,
        required: usize,
    },
}

/// Why a biomarker could not be ranked.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BiomarkerFitError {
    #[error("ConstantBiomarker: no variation across {n} observations")]
    ConstantBiomarker { n: usize },

    #[error("InsufficientObservations: {n} non-missing values (minimum {min})")]
    InsufficientObservations { n: usize, min: usize },

    #[error("SingleOutcomeClass: {responders} responders and {non_responders} non-responders in subset")]
    SingleOutcomeClass {
        responders: usize,
        non_responders: usize,
    },

    #[error("NonConvergence: fit did not converge within {iterations} iterations")]
    NonConvergence { iterations: usize },

    #[error("Separation: |coefficient| {coefficient:.3} exceeds stability bound {bound}")]
    Separation { coefficient: f64, bound: f64 },

    #[error("SingularInformation: information matrix is not invertible")]
    SingularInformation,
}

/// Why a cutoff could not be derived for a biomarker.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CutoffFailure {
    #[error("InsufficientDistinctValues: {n_distinct} distinct value(s)")]
    InsufficientDistinctValues { n_distinct: usize },

    #[error("SingleOutcomeClass: {responders} responders and {non_responders} non-responders")]
    SingleOutcomeClass {
        responders: usize,
        non_responders: usize,
    },

    #[error("NoQualifyingCategory: no category holds both a responder and a non-responder")]
    NoQualifyingCategory,
}

/// A derived metric whose denominator is zero.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedMetric {
    #[error("undefined: no patient satisfies the criteria (eligible fraction is 0)")]
    ZeroEligible,

    #[error("undefined: every patient satisfies the criteria (no excluded population)")]
    NoExcludedPatients,
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, TrialixError>;
