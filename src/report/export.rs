//! Writing analysis results to an output directory.

use crate::error::{Result, TrialixError};
use crate::pipeline::AnalysisReport;
use crate::report::{criteria_summary, cutoff_rows, ranking_rows, render_criteria};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const BIOMARKER_RANKINGS_FILE: &str = "biomarker_rankings.csv";
pub const OPTIMAL_CUTOFFS_FILE: &str = "optimal_cutoffs.csv";
pub const ENRICHMENT_SUMMARY_FILE: &str = "enrichment_summary.json";
pub const CRITERIA_FILE: &str = "recommended_criteria.txt";

/// Which machine-readable files to write. The criteria text is always written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    All,
}

impl ExportFormat {
    fn csv(self) -> bool {
        matches!(self, ExportFormat::Csv | ExportFormat::All)
    }

    fn json(self) -> bool {
        matches!(self, ExportFormat::Json | ExportFormat::All)
    }
}

impl FromStr for ExportFormat {
    type Err = TrialixError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "all" => Ok(ExportFormat::All),
            other => Err(TrialixError::InvalidParameter(format!(
                "Unknown export format '{}'. Expected csv, json or all",
                other
            ))),
        }
    }
}

/// Write a serializable row set as CSV.
pub fn write_csv_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Export a report to `dir`, creating it if needed.
///
/// Returns the written paths in the order they were written.
pub fn export<P: AsRef<Path>>(report: &AnalysisReport, dir: P, format: ExportFormat) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    if format.csv() {
        let path = dir.join(BIOMARKER_RANKINGS_FILE);
        write_csv_rows(BufWriter::new(File::create(&path)?), &ranking_rows(&report.ranking))?;
        written.push(path);

        let path = dir.join(OPTIMAL_CUTOFFS_FILE);
        write_csv_rows(BufWriter::new(File::create(&path)?), &cutoff_rows(&report.cutoffs))?;
        written.push(path);
    }

    if format.json() {
        let path = dir.join(ENRICHMENT_SUMMARY_FILE);
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, &criteria_summary(report))?;
        written.push(path);
    }

    let path = dir.join(CRITERIA_FILE);
    fs::write(&path, render_criteria(&report.criteria))?;
    written.push(path);

    info!("Wrote {} file(s) to {}", written.len(), dir.display());
    Ok(written)
}

/// Full report as pretty-printed JSON.
pub fn to_json(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(TrialixError::from)
}
