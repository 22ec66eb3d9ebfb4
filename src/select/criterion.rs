//! Single enrollment criteria.

use crate::data::{CovariateValue, Dataset, RawValue};
use crate::error::{Result, TrialixError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Comparison applied to one biomarker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Comparison {
    /// `value ≥ threshold`
    AtLeast { threshold: f64 },
    /// `value < threshold`
    Below { threshold: f64 },
    /// Category label in the set.
    InSet { categories: Vec<String> },
}

impl Comparison {
    /// Operator symbol used in rendered criteria.
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::AtLeast { .. } => "≥",
            Comparison::Below { .. } => "<",
            Comparison::InSet { .. } => "∈",
        }
    }
}

/// One inclusion rule on one biomarker. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criterion {
    biomarker: String,
    comparison: Comparison,
}

impl Criterion {
    pub fn at_least(biomarker: &str, threshold: f64) -> Self {
        Self {
            biomarker: biomarker.to_string(),
            comparison: Comparison::AtLeast { threshold },
        }
    }

    pub fn below(biomarker: &str, threshold: f64) -> Self {
        Self {
            biomarker: biomarker.to_string(),
            comparison: Comparison::Below { threshold },
        }
    }

    pub fn in_set<S: Into<String>>(biomarker: &str, categories: impl IntoIterator<Item = S>) -> Self {
        Self {
            biomarker: biomarker.to_string(),
            comparison: Comparison::InSet {
                categories: categories.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn biomarker(&self) -> &str {
        &self.biomarker
    }

    pub fn comparison(&self) -> &Comparison {
        &self.comparison
    }

    /// Whether a numeric measurement satisfies the rule.
    pub fn accepts_number(&self, value: f64) -> bool {
        match &self.comparison {
            Comparison::AtLeast { threshold } => value >= *threshold,
            Comparison::Below { threshold } => value < *threshold,
            Comparison::InSet { .. } => false,
        }
    }

    /// Whether a category label satisfies the rule.
    pub fn accepts_label(&self, label: &str) -> bool {
        match &self.comparison {
            Comparison::InSet { categories } => categories.iter().any(|c| c == label),
            _ => false,
        }
    }

    /// Evaluate an untyped cell. Missing values never satisfy a criterion.
    pub fn accepts_raw(&self, value: &RawValue) -> bool {
        match (&self.comparison, value) {
            (_, RawValue::Missing) => false,
            (Comparison::InSet { .. }, v) => v.label().is_some_and(|l| self.accepts_label(&l)),
            (_, RawValue::Number(x)) => self.accepts_number(*x),
            (_, RawValue::Text(_)) => false,
        }
    }

    /// Per-patient mask over a validated dataset.
    pub fn mask(&self, dataset: &Dataset) -> Result<Vec<bool>> {
        let index = dataset
            .covariate_index(&self.biomarker)
            .ok_or_else(|| TrialixError::UnknownBiomarker {
                name: self.biomarker.clone(),
                available: dataset
                    .covariate_names()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            })?;
        let categories = dataset.covariates()[index].kind.categories();

        Ok(dataset
            .records()
            .iter()
            .map(|r| match r.value(index) {
                CovariateValue::Numeric(x) => self.accepts_number(x),
                CovariateValue::Category(c) => categories
                    .get(c)
                    .is_some_and(|label| self.accepts_label(label)),
                CovariateValue::Missing => false,
            })
            .collect())
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.comparison {
            Comparison::AtLeast { threshold } | Comparison::Below { threshold } => {
                write!(f, "{} {} {}", self.biomarker, self.comparison.symbol(), threshold)
            }
            Comparison::InSet { categories } => {
                write!(f, "{} ∈ {{{}}}", self.biomarker, categories.join(", "))
            }
        }
    }
}
