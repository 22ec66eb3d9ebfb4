//! Synthetic trial data with known biomarker associations.

mod trial;

pub use trial::{generate_trial, SyntheticTrial, SyntheticTrialConfig, OUTCOME_COLUMN};
