//! Dataset validation: outcome canonicalization, minimum-size rules and
//! covariate typing.
//!
//! Validation fails on the first violated hard rule. Expected missingness is
//! not an error: rows without an outcome are dropped, and a missing covariate
//! only removes the patient from that covariate's analysis.

mod outcome;
mod typing;

pub use outcome::canonicalize_outcome;
pub use typing::{type_column, CONTINUOUS_NUMERIC_FRACTION};

use crate::data::{Dataset, Outcome, PatientRecord, RawTable, RawValue};
use crate::error::{DataError, SampleSizeRule};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimum number of patients with an outcome.
pub const MIN_PATIENTS: usize = 50;
/// Minimum number of responders.
pub const MIN_RESPONDERS: usize = 10;
/// Minimum number of non-responders.
pub const MIN_NON_RESPONDERS: usize = 10;

/// Default name of the patient identifier column.
pub const DEFAULT_PATIENT_ID_COLUMN: &str = "patient_id";

/// Column roles for validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    pub outcome_column: String,
    pub patient_id_column: String,
}

impl ValidationOptions {
    /// Options with the default patient identifier column.
    pub fn new(outcome_column: &str) -> Self {
        Self {
            outcome_column: outcome_column.to_string(),
            patient_id_column: DEFAULT_PATIENT_ID_COLUMN.to_string(),
        }
    }

    pub fn with_patient_id_column(mut self, column: &str) -> Self {
        self.patient_id_column = column.to_string();
        self
    }
}

/// Validate a raw table using the default patient identifier column.
pub fn validate(table: &RawTable, outcome_column: &str) -> Result<Dataset, DataError> {
    validate_with(table, &ValidationOptions::new(outcome_column))
}

/// Validate a raw table and produce an immutable [`Dataset`].
pub fn validate_with(table: &RawTable, options: &ValidationOptions) -> Result<Dataset, DataError> {
    if table.n_rows() == 0 {
        return Err(DataError::EmptyTable);
    }

    let id_idx = require_column(table, &options.patient_id_column)?;
    let outcome_idx = require_column(table, &options.outcome_column)?;

    let covariate_cols: Vec<usize> = (0..table.columns().len())
        .filter(|&i| i != id_idx && i != outcome_idx)
        .collect();
    if covariate_cols.is_empty() {
        return Err(DataError::NoBiomarkerColumns {
            patient_id_column: options.patient_id_column.clone(),
            outcome_column: options.outcome_column.clone(),
        });
    }

    // Patient identifiers and outcomes, row by row.
    let mut seen_ids: HashMap<String, usize> = HashMap::new();
    let mut retained: Vec<(usize, String, Outcome)> = Vec::with_capacity(table.n_rows());
    let mut n_missing_outcome = 0;

    for (i, row) in table.rows().iter().enumerate() {
        let row_number = i + 1;

        let patient_id = row[id_idx]
            .label()
            .ok_or(DataError::MissingPatientId { row: row_number })?;
        if let Some(&first_row) = seen_ids.get(&patient_id) {
            return Err(DataError::DuplicatePatientId {
                patient_id,
                first_row,
                row: row_number,
            });
        }
        seen_ids.insert(patient_id.clone(), row_number);

        let raw_outcome = &row[outcome_idx];
        if raw_outcome.is_missing() {
            n_missing_outcome += 1;
            continue;
        }
        let outcome = canonicalize_outcome(raw_outcome).ok_or_else(|| {
            DataError::UnrecognizedOutcomeLabel {
                column: options.outcome_column.clone(),
                row: row_number,
                value: raw_outcome.label().unwrap_or_default(),
            }
        })?;
        retained.push((i, patient_id, outcome));
    }

    if n_missing_outcome > 0 {
        warn!(
            "Excluded {} row(s) with a missing '{}' value",
            n_missing_outcome, options.outcome_column
        );
    }

    check_sample_size(&retained)?;

    // Type each covariate over the retained rows only.
    let mut covariates = Vec::with_capacity(covariate_cols.len());
    let mut columns = Vec::with_capacity(covariate_cols.len());
    for &col in &covariate_cols {
        let name = &table.columns()[col];
        let cells: Vec<&RawValue> = retained
            .iter()
            .map(|(row_idx, _, _)| &table.rows()[*row_idx][col])
            .collect();
        let (covariate, values) = type_column(name, &cells);
        debug!(
            "Covariate '{}': {} ({} missing, {} unparseable)",
            covariate.name,
            covariate.kind.name(),
            covariate.n_missing,
            covariate.n_unparseable
        );
        if covariate.n_unparseable > 0 {
            warn!(
                "Covariate '{}': {} non-numeric value(s) treated as missing",
                covariate.name, covariate.n_unparseable
            );
        }
        covariates.push(covariate);
        columns.push(values);
    }

    let records: Vec<PatientRecord> = retained
        .into_iter()
        .enumerate()
        .map(|(k, (_, patient_id, outcome))| PatientRecord {
            patient_id,
            outcome,
            values: columns.iter().map(|col| col[k]).collect(),
        })
        .collect();

    let dataset = Dataset::new(
        options.patient_id_column.clone(),
        options.outcome_column.clone(),
        covariates,
        records,
        n_missing_outcome,
    );

    info!(
        "Validated {} patients ({} responders, {} non-responders), {} biomarker column(s)",
        dataset.n_patients(),
        dataset.n_responders(),
        dataset.n_non_responders(),
        dataset.covariates().len()
    );

    Ok(dataset)
}

fn require_column(table: &RawTable, column: &str) -> Result<usize, DataError> {
    table
        .column_index(column)
        .ok_or_else(|| DataError::MissingColumn {
            column: column.to_string(),
            available: table.columns().to_vec(),
            suggestion: suggest_column(column, table.columns()),
        })
}

/// First available column whose name contains, or is contained in, the target.
fn suggest_column(target: &str, available: &[String]) -> Option<String> {
    let target_lower = target.to_lowercase();
    available
        .iter()
        .find(|c| {
            let c_lower = c.to_lowercase();
            c_lower.contains(&target_lower) || target_lower.contains(&c_lower)
        })
        .cloned()
}

fn check_sample_size(retained: &[(usize, String, Outcome)]) -> Result<(), DataError> {
    let n_patients = retained.len();
    let n_responders = retained.iter().filter(|(_, _, o)| o.is_responder()).count();
    let n_non_responders = n_patients - n_responders;

    let rules = [
        (SampleSizeRule::TotalPatients, n_patients, MIN_PATIENTS),
        (SampleSizeRule::Responders, n_responders, MIN_RESPONDERS),
        (SampleSizeRule::NonResponders, n_non_responders, MIN_NON_RESPONDERS),
    ];
    for (rule, observed, required) in rules {
        if observed < required {
            return Err(DataError::InsufficientSampleSize {
                rule,
                observed,
                required,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CovariateKind, CovariateValue};

    /// `n` patients, the first `n_resp` responders, one numeric and one text covariate.
    fn table(n: usize, n_resp: usize) -> RawTable {
        let columns = vec![
            "patient_id".to_string(),
            "outcome".to_string(),
            "score".to_string(),
            "kras".to_string(),
        ];
        let rows = (0..n)
            .map(|i| {
                vec![
                    RawValue::Text(format!("PT{:03}", i)),
                    RawValue::Text(if i < n_resp { "responder" } else { "non_responder" }.into()),
                    RawValue::Number(i as f64),
                    RawValue::Text(if i % 3 == 0 { "positive" } else { "negative" }.into()),
                ]
            })
            .collect();
        RawTable::new(columns, rows).unwrap()
    }

    #[test]
    fn test_valid_dataset() {
        let ds = validate(&table(60, 20), "outcome").unwrap();

        assert_eq!(ds.n_patients(), 60);
        assert_eq!(ds.n_responders(), 20);
        assert_eq!(ds.covariates().len(), 2);
        assert_eq!(ds.covariates()[0].kind, CovariateKind::Continuous);
        assert_eq!(ds.covariates()[1].kind.categories(), &["positive", "negative"]);
        assert_eq!(ds.records()[3].value(1), CovariateValue::Category(0));
    }

    #[test]
    fn test_insufficient_patients() {
        let err = validate(&table(49, 20), "outcome").unwrap_err();
        assert_eq!(
            err,
            DataError::InsufficientSampleSize {
                rule: SampleSizeRule::TotalPatients,
                observed: 49,
                required: 50
            }
        );
    }

    #[test]
    fn test_insufficient_responders() {
        let err = validate(&table(80, 9), "outcome").unwrap_err();
        assert!(matches!(
            err,
            DataError::InsufficientSampleSize {
                rule: SampleSizeRule::Responders,
                observed: 9,
                ..
            }
        ));
    }

    #[test]
    fn test_insufficient_non_responders() {
        let err = validate(&table(60, 55), "outcome").unwrap_err();
        assert!(matches!(
            err,
            DataError::InsufficientSampleSize {
                rule: SampleSizeRule::NonResponders,
                observed: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_outcome_column_suggests() {
        let err = validate(&table(60, 20), "outcome_status").unwrap_err();
        match err {
            DataError::MissingColumn { column, suggestion, .. } => {
                assert_eq!(column, "outcome_status");
                assert_eq!(suggestion.as_deref(), Some("outcome"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_patient_id_column() {
        let options = ValidationOptions::new("outcome").with_patient_id_column("subject");
        let err = validate_with(&table(60, 20), &options).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { ref column, .. } if column == "subject"));
    }

    #[test]
    fn test_unrecognized_outcome_label() {
        let t = table(60, 20);
        let mut rows = t.rows().to_vec();
        rows[5][1] = RawValue::Text("partial_response".into());
        let t = RawTable::new(t.columns().to_vec(), rows).unwrap();

        let err = validate(&t, "outcome").unwrap_err();
        assert_eq!(
            err,
            DataError::UnrecognizedOutcomeLabel {
                column: "outcome".into(),
                row: 6,
                value: "partial_response".into()
            }
        );
    }

    #[test]
    fn test_missing_outcome_rows_excluded() {
        let t = table(62, 20);
        let mut rows = t.rows().to_vec();
        rows[30][1] = RawValue::Missing;
        rows[31][1] = RawValue::Missing;
        let t = RawTable::new(t.columns().to_vec(), rows).unwrap();

        let ds = validate(&t, "outcome").unwrap();
        assert_eq!(ds.n_patients(), 60);
        assert_eq!(ds.n_excluded_missing_outcome(), 2);
    }

    #[test]
    fn test_missing_outcome_rows_do_not_count_towards_minimum() {
        let t = table(51, 20);
        let mut rows = t.rows().to_vec();
        rows[40][1] = RawValue::Missing;
        rows[41][1] = RawValue::Missing;
        let t = RawTable::new(t.columns().to_vec(), rows).unwrap();

        let err = validate(&t, "outcome").unwrap_err();
        assert!(matches!(
            err,
            DataError::InsufficientSampleSize {
                rule: SampleSizeRule::TotalPatients,
                observed: 49,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_patient_id() {
        let t = table(60, 20);
        let mut rows = t.rows().to_vec();
        rows[10][0] = RawValue::Text("PT002".into());
        let t = RawTable::new(t.columns().to_vec(), rows).unwrap();

        let err = validate(&t, "outcome").unwrap_err();
        assert_eq!(
            err,
            DataError::DuplicatePatientId {
                patient_id: "PT002".into(),
                first_row: 3,
                row: 11
            }
        );
    }

    #[test]
    fn test_no_biomarker_columns() {
        let t = RawTable::new(
            vec!["patient_id".into(), "outcome".into()],
            vec![vec!["P1".into(), "yes".into()]],
        )
        .unwrap();
        assert!(matches!(
            validate(&t, "outcome").unwrap_err(),
            DataError::NoBiomarkerColumns { .. }
        ));
    }

    #[test]
    fn test_empty_table() {
        let t = RawTable::new(vec!["patient_id".into(), "outcome".into()], vec![]).unwrap();
        assert_eq!(validate(&t, "outcome").unwrap_err(), DataError::EmptyTable);
    }

    #[test]
    fn test_missing_covariate_kept_per_biomarker() {
        let t = table(60, 20);
        let mut rows = t.rows().to_vec();
        rows[0][2] = RawValue::Missing;
        let t = RawTable::new(t.columns().to_vec(), rows).unwrap();

        let ds = validate(&t, "outcome").unwrap();
        // The patient stays in the dataset; only the score is missing.
        assert_eq!(ds.n_patients(), 60);
        assert_eq!(ds.n_observed(0), 59);
        assert_eq!(ds.n_observed(1), 60);
        assert_eq!(ds.covariates()[0].n_missing, 1);
    }
}
