//! Greedy construction of a multi-criterion enrollment rule.
//!
//! The first `max_criteria` eligible biomarkers are tried in rank order.
//! Each candidate criterion is
//! AND-combined into the running rule only if the eligible fraction stays at
//! or above the configured minimum; a rejected candidate is never revisited.

mod criterion;

pub use criterion::{Comparison, Criterion};

use crate::cutoff::CutoffSet;
use crate::data::Dataset;
use crate::error::{Result, TrialixError};
use crate::rank::RankedBiomarkers;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How criteria selection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStatus {
    /// At least one criterion was accepted.
    Selected,
    /// Candidates existed but every one violated the eligible-fraction floor.
    ConstraintUnsatisfiable,
    /// No eligible biomarker had a defined cutoff.
    NoEligibleBiomarkers,
}

impl SelectionStatus {
    pub fn is_selected(self) -> bool {
        matches!(self, SelectionStatus::Selected)
    }
}

impl fmt::Display for SelectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SelectionStatus::Selected => "selected",
            SelectionStatus::ConstraintUnsatisfiable => "constraint unsatisfiable",
            SelectionStatus::NoEligibleBiomarkers => "no eligible biomarkers",
        };
        f.write_str(s)
    }
}

/// Decision taken for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDecision {
    Accepted,
    /// Adding it would drop the eligible fraction below the minimum.
    Rejected,
    /// Cutoff undefined; never a candidate.
    NoCutoff,
}

/// One step of the greedy search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionStep {
    pub biomarker: String,
    /// Rendered criterion, absent when the cutoff was undefined.
    pub criterion: Option<String>,
    /// Eligible fraction the running rule would have with this criterion.
    pub eligible_fraction: Option<f64>,
    pub decision: StepDecision,
}

/// Parameters of criteria selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionOptions {
    pub max_criteria: usize,
    pub min_eligible_fraction: f64,
}

/// Accepted criteria in selection order, with the search trace.
///
/// Only constructible by [`select_criteria`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedCriteria {
    criteria: Vec<Criterion>,
    steps: Vec<SelectionStep>,
    status: SelectionStatus,
    options: SelectionOptions,
    #[serde(skip)]
    mask: Vec<bool>,
}

impl SelectedCriteria {
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn steps(&self) -> &[SelectionStep] {
        &self.steps
    }

    pub fn status(&self) -> SelectionStatus {
        self.status
    }

    pub fn options(&self) -> SelectionOptions {
        self.options
    }

    /// Per-patient eligibility under the accepted criteria.
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub(crate) fn into_parts(self) -> (Vec<Criterion>, Vec<SelectionStep>, SelectionStatus, Vec<bool>) {
        (self.criteria, self.steps, self.status, self.mask)
    }
}

/// Combine cutoffs of the ranked, eligible biomarkers into one rule.
///
/// Only the first `max_criteria` eligible biomarkers in rank order are
/// candidates.
pub fn select_criteria(
    dataset: &Dataset,
    ranked: &RankedBiomarkers,
    cutoffs: &CutoffSet,
    max_criteria: usize,
    min_eligible_fraction: f64,
) -> Result<SelectedCriteria> {
    let candidates: Vec<(String, Option<Criterion>)> = ranked
        .eligible()
        .map(|b| {
            let criterion = cutoffs.get(&b.name).and_then(|c| c.criterion());
            (b.name.clone(), criterion)
        })
        .collect();
    select_from_candidates(dataset, &candidates, max_criteria, min_eligible_fraction)
}

/// Greedy pass over `(biomarker, criterion)` candidates in rank order.
fn select_from_candidates(
    dataset: &Dataset,
    candidates: &[(String, Option<Criterion>)],
    max_criteria: usize,
    min_eligible_fraction: f64,
) -> Result<SelectedCriteria> {
    if !(0.0..=1.0).contains(&min_eligible_fraction) {
        return Err(TrialixError::InvalidParameter(format!(
            "min_eligible_fraction must be in [0, 1], got {}",
            min_eligible_fraction
        )));
    }
    let options = SelectionOptions {
        max_criteria,
        min_eligible_fraction,
    };

    let n_total = dataset.n_patients();
    let mut mask = vec![true; n_total];
    let mut criteria: Vec<Criterion> = Vec::new();
    let mut steps: Vec<SelectionStep> = Vec::new();
    let mut n_candidates = 0;

    for (biomarker, criterion) in candidates.iter().take(max_criteria) {
        if criteria.len() >= max_criteria {
            break;
        }
        let criterion = match criterion {
            Some(c) => c.clone(),
            None => {
                steps.push(SelectionStep {
                    biomarker: biomarker.clone(),
                    criterion: None,
                    eligible_fraction: None,
                    decision: StepDecision::NoCutoff,
                });
                continue;
            }
        };
        n_candidates += 1;

        let candidate_mask: Vec<bool> = criterion
            .mask(dataset)?
            .iter()
            .zip(&mask)
            .map(|(&a, &b)| a && b)
            .collect();
        let fraction = fraction_true(&candidate_mask);

        let decision = if fraction >= min_eligible_fraction {
            info!("Accepted '{}' (eligible fraction {:.3})", criterion, fraction);
            mask = candidate_mask;
            StepDecision::Accepted
        } else {
            warn!(
                "Rejected '{}': eligible fraction {:.3} below minimum {:.3}",
                criterion, fraction, min_eligible_fraction
            );
            StepDecision::Rejected
        };

        steps.push(SelectionStep {
            biomarker: biomarker.clone(),
            criterion: Some(criterion.to_string()),
            eligible_fraction: Some(fraction),
            decision,
        });
        if decision == StepDecision::Accepted {
            criteria.push(criterion);
        }
    }

    let status = if !criteria.is_empty() {
        SelectionStatus::Selected
    } else if n_candidates > 0 {
        warn!(
            "No criterion keeps at least {:.1}% of patients eligible; enrolling the unenriched population",
            min_eligible_fraction * 100.0
        );
        SelectionStatus::ConstraintUnsatisfiable
    } else {
        warn!("No eligible biomarker with a defined cutoff; no criteria selected");
        SelectionStatus::NoEligibleBiomarkers
    };

    Ok(SelectedCriteria {
        criteria,
        steps,
        status,
        options,
        mask,
    })
}

fn fraction_true(mask: &[bool]) -> f64 {
    if mask.is_empty() {
        return 0.0;
    }
    mask.iter().filter(|&&m| m).count() as f64 / mask.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Covariate, CovariateKind, CovariateValue, Outcome, PatientRecord};
    use approx::assert_relative_eq;

    /// Twenty patients: `a = i`, `b = i % 10`, `c = i` but missing for i < 4.
    fn dataset() -> Dataset {
        let covariate = |name: &str, n_missing| Covariate {
            name: name.into(),
            kind: CovariateKind::Continuous,
            n_missing,
            n_unparseable: 0,
        };
        let records = (0..20)
            .map(|i| PatientRecord {
                patient_id: format!("P{}", i),
                outcome: if i % 3 == 0 {
                    Outcome::Responder
                } else {
                    Outcome::NonResponder
                },
                values: vec![
                    CovariateValue::Numeric(i as f64),
                    CovariateValue::Numeric((i % 10) as f64),
                    if i < 4 {
                        CovariateValue::Missing
                    } else {
                        CovariateValue::Numeric(i as f64)
                    },
                ],
            })
            .collect();
        Dataset::new(
            "patient_id".into(),
            "outcome".into(),
            vec![covariate("a", 0), covariate("b", 0), covariate("c", 4)],
            records,
            0,
        )
    }

    fn candidate(criterion: Criterion) -> (String, Option<Criterion>) {
        (criterion.biomarker().to_string(), Some(criterion))
    }

    fn decisions(selected: &SelectedCriteria) -> Vec<(&str, StepDecision)> {
        selected
            .steps()
            .iter()
            .map(|s| (s.biomarker.as_str(), s.decision))
            .collect()
    }

    #[test]
    fn test_rejected_top_candidate_not_replaced_outside_window() {
        let ds = dataset();
        let candidates = vec![
            candidate(Criterion::at_least("b", 8.0)),
            candidate(Criterion::at_least("a", 10.0)),
            candidate(Criterion::at_least("c", 0.0)),
        ];
        let selected = select_from_candidates(&ds, &candidates, 1, 0.5).unwrap();

        assert_eq!(decisions(&selected), vec![("b", StepDecision::Rejected)]);
        assert_relative_eq!(selected.steps()[0].eligible_fraction.unwrap(), 0.2);
        assert!(selected.is_empty());
        assert_eq!(selected.status(), SelectionStatus::ConstraintUnsatisfiable);
        assert!(selected.mask().iter().all(|&m| m));
    }

    #[test]
    fn test_rejected_candidate_followed_by_next_in_window() {
        let ds = dataset();
        let candidates = vec![
            candidate(Criterion::at_least("b", 8.0)),
            candidate(Criterion::at_least("a", 10.0)),
            candidate(Criterion::at_least("c", 0.0)),
        ];
        let selected = select_from_candidates(&ds, &candidates, 2, 0.4).unwrap();

        assert_eq!(
            decisions(&selected),
            vec![("b", StepDecision::Rejected), ("a", StepDecision::Accepted)]
        );
        assert_eq!(selected.criteria(), &[Criterion::at_least("a", 10.0)]);
        assert_eq!(selected.status(), SelectionStatus::Selected);
    }

    #[test]
    fn test_stops_at_max_criteria_with_combined_mask() {
        let ds = dataset();
        let candidates = vec![
            candidate(Criterion::at_least("a", 5.0)),
            candidate(Criterion::at_least("b", 2.0)),
            candidate(Criterion::at_least("c", 0.0)),
        ];
        let selected = select_from_candidates(&ds, &candidates, 2, 0.1).unwrap();

        assert_eq!(selected.criteria().len(), 2);
        assert_eq!(selected.steps().len(), 2);
        assert_relative_eq!(selected.steps()[0].eligible_fraction.unwrap(), 0.75);
        // a >= 5 AND b >= 2 keeps 5..=9 and 12..=19
        assert_relative_eq!(selected.steps()[1].eligible_fraction.unwrap(), 0.65);
        let expected: Vec<bool> = (0..20).map(|i| i >= 5 && i % 10 >= 2).collect();
        assert_eq!(selected.mask(), expected.as_slice());
    }

    #[test]
    fn test_missing_value_is_ineligible() {
        let ds = dataset();
        let candidates = vec![candidate(Criterion::at_least("c", 0.0))];
        let selected = select_from_candidates(&ds, &candidates, 3, 0.0).unwrap();

        assert_relative_eq!(selected.steps()[0].eligible_fraction.unwrap(), 0.8);
        assert!(selected.mask()[..4].iter().all(|&m| !m));
        assert!(selected.mask()[4..].iter().all(|&m| m));
    }

    #[test]
    fn test_undefined_cutoff_is_recorded() {
        let ds = dataset();
        let candidates = vec![
            ("b".to_string(), None),
            candidate(Criterion::at_least("a", 10.0)),
        ];
        let selected = select_from_candidates(&ds, &candidates, 2, 0.2).unwrap();

        assert_eq!(
            decisions(&selected),
            vec![("b", StepDecision::NoCutoff), ("a", StepDecision::Accepted)]
        );
        assert!(selected.steps()[0].criterion.is_none());

        let none = select_from_candidates(&ds, &[("b".to_string(), None)], 2, 0.2).unwrap();
        assert_eq!(none.status(), SelectionStatus::NoEligibleBiomarkers);
    }

    #[test]
    fn test_invalid_min_fraction() {
        let err = select_from_candidates(&dataset(), &[], 2, 1.5).unwrap_err();
        assert!(matches!(err, TrialixError::InvalidParameter(_)));
    }

    #[test]
    fn test_fraction_true() {
        assert_eq!(fraction_true(&[true, false, true, true]), 0.75);
        assert_eq!(fraction_true(&[]), 0.0);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(
            SelectionStatus::ConstraintUnsatisfiable.to_string(),
            "constraint unsatisfiable"
        );
        assert!(SelectionStatus::Selected.is_selected());
    }
}
