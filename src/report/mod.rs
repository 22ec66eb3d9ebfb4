//! Output tables and renderings of an analysis.
//!
//! The ranking table, the cutoff table and the enrollment-criteria summary
//! are flat, serializable views of the pipeline results. They are written as
//! CSV and JSON, or rendered as plain text for the terminal.

mod export;
mod rows;
mod text;

pub use export::{
    export, to_json, write_csv_rows, ExportFormat, BIOMARKER_RANKINGS_FILE, CRITERIA_FILE,
    ENRICHMENT_SUMMARY_FILE, OPTIMAL_CUTOFFS_FILE,
};
pub use rows::{
    criteria_summary, cutoff_rows, ranking_rows, screening_rows, CriteriaSummary, CutoffRow,
    RankingRow, ScreeningRow,
};
pub use text::{
    format_p_value, render_criteria, render_cutoffs, render_ranking, render_summary,
    significance_stars,
};
