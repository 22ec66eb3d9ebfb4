//! Trialix: clinical trial enrichment analysis
//!
//! This library discovers predictive biomarkers in a historical trial and
//! turns them into enrollment criteria for a future trial.
//!
//! # Overview
//!
//! The analysis runs as a sequence of stages, each consuming the previous
//! stage's typed result:
//!
//! - **validate**: Raw table to [`data::Dataset`] (outcome canonicalization, typing, sample-size rules)
//! - **rank**: Per-biomarker logistic regression, odds ratios, p-values and AUC
//! - **cutoff**: Youden-optimal thresholds and enriched categories
//! - **select**: Greedy enrollment criteria under an eligibility constraint
//! - **impact**: Eligible population and response-rate impact
//! - **report**: Tables, CSV/JSON export
//! - **pipeline**: Configuration and end-to-end execution
//!
//! # Example
//!
//! ```no_run
//! use trialix::prelude::*;
//!
//! let config = AnalysisConfig::new("response").top_n(5).min_auc(0.6);
//! let report = run_analysis_csv("trial.csv", &config, &CancellationToken::new()).unwrap();
//!
//! for c in report.criteria.criterion_strings() {
//!     println!("{}", c);
//! }
//! println!("enrichment: {}", report.criteria.impact.enrichment_factor);
//! ```

pub mod benchmark;
pub mod cutoff;
pub mod data;
pub mod error;
pub mod impact;
pub mod model;
pub mod pipeline;
pub mod rank;
pub mod report;
pub mod select;
pub mod stats;
pub mod validate;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::benchmark::{generate_trial, SyntheticTrial, SyntheticTrialConfig};
    pub use crate::cutoff::{
        optimize_cutoffs, CategoricalCutoff, ContinuousCutoff, CutoffResult, CutoffRule, CutoffSet,
        Direction,
    };
    pub use crate::data::{
        Covariate, CovariateKind, CovariateValue, Dataset, DatasetSummary, Outcome, RawTable,
        RawValue,
    };
    pub use crate::error::{
        BiomarkerFitError, CutoffFailure, DataError, Result, SampleSizeRule, TrialixError,
        UndefinedMetric,
    };
    pub use crate::impact::{compute_impact, EnrollmentCriteria, Impact, Metric};
    pub use crate::pipeline::{
        run_analysis, run_analysis_csv, run_validation, AnalysisConfig, AnalysisReport,
        CancellationToken,
    };
    pub use crate::rank::{
        rank, rank_with, BiomarkerResult, BiomarkerStatus, Eligibility, OddsRatio, RankOptions,
        RankedBiomarkers,
    };
    pub use crate::report::{export, ExportFormat};
    pub use crate::select::{select_criteria, Comparison, Criterion, SelectedCriteria, SelectionStatus};
    pub use crate::validate::{validate, validate_with, ValidationOptions};
}
