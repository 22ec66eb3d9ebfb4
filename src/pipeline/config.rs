//! Analysis configuration.

use crate::error::{Result, TrialixError};
use crate::rank::RankOptions;
use crate::validate::{ValidationOptions, DEFAULT_PATIENT_ID_COLUMN};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parameters of one analysis run, serializable to YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Outcome column name.
    pub outcome_column: String,
    /// Patient identifier column name.
    pub patient_id_column: String,
    /// Number of top biomarkers passed to cutoff optimization.
    pub top_n: usize,
    /// Minimum AUC for a biomarker to be eligible.
    pub min_auc: f64,
    /// Maximum number of accepted criteria.
    pub max_criteria: usize,
    /// Minimum fraction of patients that must stay eligible.
    pub min_eligible_fraction: f64,
    /// Restrict the analysis to these biomarkers.
    pub biomarkers: Option<Vec<String>>,
    /// Worker threads; all available cores when unset.
    pub threads: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            outcome_column: "response".to_string(),
            patient_id_column: DEFAULT_PATIENT_ID_COLUMN.to_string(),
            top_n: 5,
            min_auc: 0.6,
            max_criteria: 3,
            min_eligible_fraction: 0.2,
            biomarkers: None,
            threads: None,
        }
    }
}

impl AnalysisConfig {
    /// Default configuration for the given outcome column.
    pub fn new(outcome_column: &str) -> Self {
        Self {
            outcome_column: outcome_column.to_string(),
            ..Self::default()
        }
    }

    pub fn patient_id_column(mut self, column: &str) -> Self {
        self.patient_id_column = column.to_string();
        self
    }

    pub fn top_n(mut self, n: usize) -> Self {
        self.top_n = n;
        self
    }

    pub fn min_auc(mut self, min_auc: f64) -> Self {
        self.min_auc = min_auc;
        self
    }

    pub fn max_criteria(mut self, n: usize) -> Self {
        self.max_criteria = n;
        self
    }

    pub fn min_eligible_fraction(mut self, fraction: f64) -> Self {
        self.min_eligible_fraction = fraction;
        self
    }

    pub fn biomarkers(mut self, names: Vec<String>) -> Self {
        self.biomarkers = Some(names);
        self
    }

    pub fn threads(mut self, n: usize) -> Self {
        self.threads = Some(n);
        self
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(TrialixError::InvalidParameter(msg));
        if self.outcome_column.is_empty() {
            return invalid("outcome_column must not be empty".into());
        }
        if self.patient_id_column == self.outcome_column {
            return invalid(format!(
                "patient_id_column and outcome_column are both '{}'",
                self.outcome_column
            ));
        }
        if self.top_n == 0 {
            return invalid("top_n must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.min_auc) {
            return invalid(format!("min_auc must be in [0, 1], got {}", self.min_auc));
        }
        if self.max_criteria == 0 {
            return invalid("max_criteria must be at least 1".into());
        }
        if !(0.0..=1.0).contains(&self.min_eligible_fraction) {
            return invalid(format!(
                "min_eligible_fraction must be in [0, 1], got {}",
                self.min_eligible_fraction
            ));
        }
        if self.threads == Some(0) {
            return invalid("threads must be at least 1".into());
        }
        if self.biomarkers.as_ref().is_some_and(|b| b.is_empty()) {
            return invalid("biomarkers list must not be empty".into());
        }
        Ok(())
    }

    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(TrialixError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(TrialixError::from)
    }

    /// Load from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Write to a YAML file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    pub fn validation_options(&self) -> ValidationOptions {
        ValidationOptions::new(&self.outcome_column).with_patient_id_column(&self.patient_id_column)
    }

    pub fn rank_options(&self) -> RankOptions {
        RankOptions {
            min_auc: self.min_auc,
            top_n: Some(self.top_n),
            threads: self.threads,
            biomarkers: self.biomarkers.clone(),
        }
    }
}
