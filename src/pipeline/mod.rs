//! Pipeline configuration and execution.

mod cancel;
mod config;
mod runner;

pub use cancel::CancellationToken;
pub use config::AnalysisConfig;
pub use runner::{analyze_dataset, run_analysis, run_analysis_csv, run_validation, AnalysisReport};
