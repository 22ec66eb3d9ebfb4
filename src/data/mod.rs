//! Data structures for biomarker enrichment analysis.

mod dataset;
mod summary;
mod table;

pub use dataset::{Covariate, CovariateKind, CovariateValue, Dataset, Outcome, PatientRecord};
pub use summary::{summarize, CovariateSummary, DatasetSummary};
pub use table::{RawTable, RawValue};
