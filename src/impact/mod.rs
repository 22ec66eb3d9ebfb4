//! Impact of an enrollment rule on response rate and population size.

mod metric;

pub use metric::Metric;

use crate::data::{Dataset, RawTable};
use crate::error::{DataError, Result, TrialixError, UndefinedMetric};
use crate::select::{Criterion, SelectedCriteria, SelectionStatus, SelectionStep};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// Tolerance for the enriched/excluded weighted-average identity.
pub const CONSISTENCY_TOLERANCE: f64 = 1e-9;

/// Derived impact metrics of an enrollment rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impact {
    pub n_total: usize,
    pub n_eligible: usize,
    pub n_responders_total: usize,
    pub n_responders_eligible: usize,
    /// Eligible patients over all validated patients.
    pub eligible_fraction: f64,
    pub response_rate_unenriched: f64,
    pub response_rate_enriched: Metric,
    /// Response rate among patients failing the rule.
    pub response_rate_excluded: Metric,
    pub enrichment_factor: Metric,
    /// Patients screened per eligible patient, whole-trial denominator.
    pub number_needed_to_screen: Metric,
}

impl Impact {
    /// Compute impact from a per-patient eligibility mask.
    pub fn from_mask(dataset: &Dataset, mask: &[bool]) -> Self {
        let n_total = dataset.n_patients();
        let (mut n_eligible, mut n_resp_eligible, mut n_resp_total) = (0, 0, 0);
        for (record, &eligible) in dataset.records().iter().zip(mask) {
            let resp = record.outcome.is_responder();
            if resp {
                n_resp_total += 1;
            }
            if eligible {
                n_eligible += 1;
                if resp {
                    n_resp_eligible += 1;
                }
            }
        }

        let n_excluded = n_total - n_eligible;
        let eligible_fraction = if n_total > 0 {
            n_eligible as f64 / n_total as f64
        } else {
            0.0
        };
        let response_rate_unenriched = if n_total > 0 {
            n_resp_total as f64 / n_total as f64
        } else {
            f64::NAN
        };

        let response_rate_enriched = if n_eligible > 0 {
            Metric::Defined(n_resp_eligible as f64 / n_eligible as f64)
        } else {
            Metric::Undefined(UndefinedMetric::ZeroEligible)
        };
        let response_rate_excluded = if n_excluded > 0 {
            Metric::Defined((n_resp_total - n_resp_eligible) as f64 / n_excluded as f64)
        } else {
            Metric::Undefined(UndefinedMetric::NoExcludedPatients)
        };
        let enrichment_factor = response_rate_enriched.map(|r| r / response_rate_unenriched);
        let number_needed_to_screen = if n_eligible > 0 {
            Metric::Defined(1.0 / eligible_fraction)
        } else {
            Metric::Undefined(UndefinedMetric::ZeroEligible)
        };

        Self {
            n_total,
            n_eligible,
            n_responders_total: n_resp_total,
            n_responders_eligible: n_resp_eligible,
            eligible_fraction,
            response_rate_unenriched,
            response_rate_enriched,
            response_rate_excluded,
            enrichment_factor,
            number_needed_to_screen,
        }
    }

    /// `f * enriched + (1 - f) * excluded - unenriched`.
    ///
    /// An undefined side carries zero weight, so the residual is always
    /// defined.
    pub fn consistency_residual(&self) -> f64 {
        let f = self.eligible_fraction;
        let enriched = self.response_rate_enriched.value().map_or(0.0, |r| f * r);
        let excluded = self
            .response_rate_excluded
            .value()
            .map_or(0.0, |r| (1.0 - f) * r);
        enriched + excluded - self.response_rate_unenriched
    }

    pub fn is_consistent(&self) -> bool {
        self.consistency_residual().abs() <= CONSISTENCY_TOLERANCE
    }
}

/// Final enrollment rule with its impact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentCriteria {
    /// Criteria in selection order.
    pub criteria: Vec<Criterion>,
    pub status: SelectionStatus,
    pub steps: Vec<SelectionStep>,
    pub impact: Impact,
}

impl EnrollmentCriteria {
    /// Human-readable criterion strings.
    pub fn criterion_strings(&self) -> Vec<String> {
        self.criteria.iter().map(|c| c.to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Whether one patient's raw values satisfy every criterion.
    ///
    /// An empty rule admits everyone.
    pub fn admits(&self, table: &RawTable, row: usize) -> Result<bool> {
        let cells = table.rows().get(row).ok_or_else(|| {
            TrialixError::InvalidParameter(format!("Row {} out of range", row + 1))
        })?;
        for criterion in &self.criteria {
            let col = column_for(table, criterion)?;
            if !criterion.accepts_raw(&cells[col]) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Screen new patients against the rule; no outcome column is needed.
    ///
    /// Returns `(patient_id, eligible)` in table order.
    pub fn screen(&self, table: &RawTable, patient_id_column: &str) -> Result<Vec<(String, bool)>> {
        let id_col = table
            .column_index(patient_id_column)
            .ok_or_else(|| DataError::MissingColumn {
                column: patient_id_column.to_string(),
                available: table.columns().to_vec(),
                suggestion: None,
            })?;
        let cols = self
            .criteria
            .iter()
            .map(|c| column_for(table, c))
            .collect::<Result<Vec<_>>>()?;

        let screened: Vec<(String, bool)> = table
            .rows()
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let id = row[id_col].label().unwrap_or_else(|| format!("row{}", i + 1));
                let eligible = self
                    .criteria
                    .iter()
                    .zip(&cols)
                    .all(|(c, &col)| c.accepts_raw(&row[col]));
                (id, eligible)
            })
            .collect();

        info!(
            "Screened {} patient(s): {} eligible",
            screened.len(),
            screened.iter().filter(|(_, e)| *e).count()
        );
        Ok(screened)
    }
}

fn column_for(table: &RawTable, criterion: &Criterion) -> Result<usize> {
    table
        .column_index(criterion.biomarker())
        .ok_or_else(|| TrialixError::UnknownBiomarker {
            name: criterion.biomarker().to_string(),
            available: table.columns().to_vec(),
        })
}

/// Fill in the impact metrics of the selected criteria.
pub fn compute_impact(dataset: &Dataset, selected: SelectedCriteria) -> EnrollmentCriteria {
    let (criteria, steps, status, mask) = selected.into_parts();
    let impact = Impact::from_mask(dataset, &mask);

    if !impact.is_consistent() {
        warn!(
            "Impact metrics inconsistent: residual {:.3e}",
            impact.consistency_residual()
        );
    }
    info!(
        "Enrollment rule with {} criterion(s): {}/{} eligible ({:.1}%), response rate {} vs {:.3}",
        criteria.len(),
        impact.n_eligible,
        impact.n_total,
        impact.eligible_fraction * 100.0,
        impact.response_rate_enriched,
        impact.response_rate_unenriched
    );

    EnrollmentCriteria {
        criteria,
        status,
        steps,
        impact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Covariate, CovariateKind, CovariateValue, Outcome, PatientRecord};
    use approx::assert_relative_eq;

    /// Ten patients with `score = i`; responders at i in {1, 6, 7, 8, 9}.
    fn dataset() -> Dataset {
        let covariates = vec![Covariate {
            name: "score".into(),
            kind: CovariateKind::Continuous,
            n_missing: 0,
            n_unparseable: 0,
        }];
        let records = (0..10)
            .map(|i| PatientRecord {
                patient_id: format!("P{}", i),
                outcome: if i == 1 || i >= 6 {
                    Outcome::Responder
                } else {
                    Outcome::NonResponder
                },
                values: vec![CovariateValue::Numeric(i as f64)],
            })
            .collect();
        Dataset::new("patient_id".into(), "outcome".into(), covariates, records, 0)
    }

    #[test]
    fn test_impact_metrics() {
        let ds = dataset();
        let mask: Vec<bool> = (0..10).map(|i| i >= 6).collect();
        let impact = Impact::from_mask(&ds, &mask);

        assert_eq!(impact.n_eligible, 4);
        assert_relative_eq!(impact.eligible_fraction, 0.4);
        assert_relative_eq!(impact.response_rate_unenriched, 0.5);
        assert_eq!(impact.response_rate_enriched, Metric::Defined(1.0));
        assert_relative_eq!(impact.response_rate_excluded.value().unwrap(), 1.0 / 6.0);
        assert_relative_eq!(impact.enrichment_factor.value().unwrap(), 2.0);
        assert_relative_eq!(impact.number_needed_to_screen.value().unwrap(), 2.5);
        assert!(impact.is_consistent());
    }

    #[test]
    fn test_zero_eligible_is_undefined() {
        let ds = dataset();
        let impact = Impact::from_mask(&ds, &[false; 10]);

        assert_eq!(impact.eligible_fraction, 0.0);
        assert_eq!(
            impact.response_rate_enriched,
            Metric::Undefined(UndefinedMetric::ZeroEligible)
        );
        assert!(!impact.enrichment_factor.is_defined());
        assert!(!impact.number_needed_to_screen.is_defined());
        assert!(impact.is_consistent());
    }

    #[test]
    fn test_everyone_eligible() {
        let ds = dataset();
        let impact = Impact::from_mask(&ds, &[true; 10]);

        assert_eq!(
            impact.response_rate_excluded,
            Metric::Undefined(UndefinedMetric::NoExcludedPatients)
        );
        assert_eq!(impact.enrichment_factor, Metric::Defined(1.0));
        assert_eq!(impact.number_needed_to_screen, Metric::Defined(1.0));
        assert!(impact.is_consistent());
    }

    #[test]
    fn test_screen_new_patients() {
        let rule = EnrollmentCriteria {
            criteria: vec![
                Criterion::at_least("pdl1_score", 50.0),
                Criterion::in_set("kras_mutation", ["negative"]),
            ],
            status: SelectionStatus::Selected,
            steps: vec![],
            impact: Impact::from_mask(&dataset(), &[true; 10]),
        };
        let table = RawTable::from_reader(std::io::Cursor::new(
            "patient_id,pdl1_score,kras_mutation\nN1,60,negative\nN2,40,negative\nN3,70,positive\nN4,,negative\n",
        ))
        .unwrap();

        let screened = rule.screen(&table, "patient_id").unwrap();
        assert_eq!(
            screened,
            vec![
                ("N1".to_string(), true),
                ("N2".to_string(), false),
                ("N3".to_string(), false),
                ("N4".to_string(), false),
            ]
        );
        assert!(rule.admits(&table, 0).unwrap());
        assert!(!rule.admits(&table, 3).unwrap());
    }

    #[test]
    fn test_screen_requires_biomarker_columns() {
        let rule = EnrollmentCriteria {
            criteria: vec![Criterion::at_least("tmb", 10.0)],
            status: SelectionStatus::Selected,
            steps: vec![],
            impact: Impact::from_mask(&dataset(), &[true; 10]),
        };
        let table =
            RawTable::from_reader(std::io::Cursor::new("patient_id,age\nN1,60\n")).unwrap();
        let err = rule.screen(&table, "patient_id").unwrap_err();
        assert!(matches!(err, TrialixError::UnknownBiomarker { ref name, .. } if name == "tmb"));
    }
}
