//! Raw tabular input as delivered by an ingestion source.

use crate::error::{Result, TrialixError};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Cell contents recognised as an explicit missing marker.
const MISSING_MARKERS: &[&str] = &["", "NA", "na", "N/A", "n/a", "NaN", "nan", "null", "NULL"];

/// A single untyped cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Finite numeric value.
    Number(f64),
    /// Any other non-missing text.
    Text(String),
    /// Explicit missing marker.
    Missing,
}

impl RawValue {
    /// Interpret a textual cell.
    pub fn parse(cell: &str) -> Self {
        let trimmed = cell.trim();
        if MISSING_MARKERS.contains(&trimmed) {
            return RawValue::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => RawValue::Number(v),
            _ => RawValue::Text(trimmed.to_string()),
        }
    }

    /// Check if this is a missing value.
    pub fn is_missing(&self) -> bool {
        matches!(self, RawValue::Missing)
    }

    /// Try to get as a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Textual label of a non-missing value.
    ///
    /// Integral numbers render without a fractional part so that a numeric
    /// code such as `2` keeps the label `"2"`.
    pub fn label(&self) -> Option<String> {
        match self {
            RawValue::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => {
                Some(format!("{}", *v as i64))
            }
            RawValue::Number(v) => Some(v.to_string()),
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Missing => None,
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            RawValue::Number(v)
        } else {
            RawValue::Missing
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::parse(s)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(RawValue::Missing)
    }
}

/// One row per patient, named columns, untyped cells.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    /// Create a table, checking that every row has one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<RawValue>>) -> Result<Self> {
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(TrialixError::InvalidParameter(format!(
                "Row {} has {} cells but the table has {} columns",
                i + 1,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Load a comma-separated file with a header row.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse comma-separated text with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader.headers()?.iter().map(String::from).collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(RawValue::parse).collect());
        }

        Self::new(columns, rows)
    }

    /// Write the table as CSV, missing cells left empty.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row.iter().map(|v| match v {
                RawValue::Number(x) => x.to_string(),
                RawValue::Text(s) => s.clone(),
                RawValue::Missing => String::new(),
            }))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the table to a CSV file.
    pub fn to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_csv(file)
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in input order.
    pub fn rows(&self) -> &[Vec<RawValue>] {
        &self.rows
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Position of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Check if a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_cells() {
        assert_eq!(RawValue::parse("3.5"), RawValue::Number(3.5));
        assert_eq!(RawValue::parse(" NA "), RawValue::Missing);
        assert_eq!(RawValue::parse(""), RawValue::Missing);
        assert_eq!(RawValue::parse("positive"), RawValue::Text("positive".into()));
        assert_eq!(RawValue::parse("inf"), RawValue::Text("inf".into()));
    }

    #[test]
    fn test_label_of_integral_number() {
        assert_eq!(RawValue::Number(2.0).label(), Some("2".to_string()));
        assert_eq!(RawValue::Number(2.5).label(), Some("2.5".to_string()));
        assert_eq!(RawValue::Missing.label(), None);
    }

    #[test]
    fn test_from_reader() {
        let csv = "patient_id,outcome,pdl1\nP1,responder,12.5\nP2,non_responder,\nP3,yes,NA\n";
        let table = RawTable::from_reader(Cursor::new(csv)).unwrap();

        assert_eq!(table.columns(), &["patient_id", "outcome", "pdl1"]);
        assert_eq!(table.n_rows(), 3);
        assert_eq!(table.rows()[0][2], RawValue::Number(12.5));
        assert!(table.rows()[1][2].is_missing());
        assert!(table.rows()[2][2].is_missing());
        assert_eq!(table.column_index("pdl1"), Some(2));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = RawTable::new(
            vec!["a".into(), "b".into()],
            vec![vec![RawValue::Number(1.0)]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_csv_write_and_read_back() {
        let table = RawTable::new(
            vec!["patient_id".into(), "score".into()],
            vec![
                vec!["P1".into(), RawValue::Number(1.5)],
                vec!["P2".into(), RawValue::Missing],
            ],
        )
        .unwrap();

        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();
        let parsed = RawTable::from_reader(Cursor::new(buf)).unwrap();
        assert_eq!(parsed, table);
    }
}
