//! Synthetic oncology trial generation for demos and tests.
//!
//! Outcomes are assigned first, then each biomarker is drawn from an
//! outcome-conditional distribution, so the strength of every association is
//! known in advance.

use crate::data::{RawTable, RawValue};
use crate::error::{Result, TrialixError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Gamma, Normal};
use serde::{Deserialize, Serialize};

/// Configuration for synthetic trial generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticTrialConfig {
    /// Name/identifier for this dataset.
    pub name: String,
    /// Number of patients.
    pub n_patients: usize,
    /// Fraction of responders (rounded to a whole count).
    pub response_rate: f64,
    /// Fraction of patients with one biomarker value blanked out.
    pub missing_fraction: f64,
    /// Extra biomarkers with no association to the outcome.
    pub n_null_biomarkers: usize,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for SyntheticTrialConfig {
    fn default() -> Self {
        Self {
            name: "oncology".to_string(),
            n_patients: 150,
            response_rate: 0.38,
            missing_fraction: 0.05,
            n_null_biomarkers: 0,
            seed: 42,
        }
    }
}

impl SyntheticTrialConfig {
    /// Create a new config with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_patients(mut self, n: usize) -> Self {
        self.n_patients = n;
        self
    }

    pub fn with_response_rate(mut self, rate: f64) -> Self {
        self.response_rate = rate.clamp(0.0, 1.0);
        self
    }

    pub fn with_missing_fraction(mut self, fraction: f64) -> Self {
        self.missing_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn with_null_biomarkers(mut self, n: usize) -> Self {
        self.n_null_biomarkers = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Phase II-sized oncology trial: 150 patients, 38% response.
    pub fn oncology() -> Self {
        Self::new("oncology")
    }

    /// Large trial without missing values, for statistical checks.
    pub fn large(n_patients: usize) -> Self {
        Self::new("large")
            .with_patients(n_patients)
            .with_missing_fraction(0.0)
    }
}

/// A generated trial.
#[derive(Debug, Clone)]
pub struct SyntheticTrial {
    pub config: SyntheticTrialConfig,
    pub table: RawTable,
    pub n_responders: usize,
}

/// Outcome column written by [`generate_trial`].
pub const OUTCOME_COLUMN: &str = "outcome";

/// Generate a synthetic trial.
///
/// Columns: `patient_id`, `outcome`, `age`, `pdl1_score`, `tmb`,
/// `kras_mutation`, `ecog_ps`, then `null_1..null_k`. PD-L1 carries the
/// strongest signal, TMB a moderate one, the rest weak or none.
pub fn generate_trial(config: &SyntheticTrialConfig) -> Result<SyntheticTrial> {
    let n = config.n_patients;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let n_responders = ((n as f64) * config.response_rate).round() as usize;
    let mut outcomes: Vec<bool> = (0..n).map(|i| i < n_responders).collect();
    outcomes.shuffle(&mut rng);

    let param = |e: rand_distr::GammaError| TrialixError::InvalidParameter(e.to_string());
    let pdl1_resp = Gamma::<f64>::new(8.0, 8.0).map_err(param)?;
    let pdl1_non = Gamma::<f64>::new(3.0, 6.0).map_err(param)?;
    let exp_param = |e: rand_distr::ExpError| TrialixError::InvalidParameter(e.to_string());
    let tmb_resp = Exp::<f64>::new(1.0 / 8.0).map_err(exp_param)?;
    let tmb_non = Exp::<f64>::new(1.0 / 5.0).map_err(exp_param)?;
    let normal_param = |e: rand_distr::NormalError| TrialixError::InvalidParameter(e.to_string());
    let age_dist = Normal::<f64>::new(58.0, 12.0).map_err(normal_param)?;
    let null_dist = Normal::<f64>::new(0.0, 1.0).map_err(normal_param)?;

    let mut columns: Vec<String> = [
        "patient_id",
        OUTCOME_COLUMN,
        "age",
        "pdl1_score",
        "tmb",
        "kras_mutation",
        "ecog_ps",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    columns.extend((1..=config.n_null_biomarkers).map(|k| format!("null_{}", k)));

    let mut rows: Vec<Vec<RawValue>> = Vec::with_capacity(n);
    for (i, &responder) in outcomes.iter().enumerate() {
        let age = age_dist.sample(&mut rng).clamp(25.0, 85.0).round() + if responder { 2.0 } else { 0.0 };
        let pdl1 = if responder {
            pdl1_resp.sample(&mut rng)
        } else {
            pdl1_non.sample(&mut rng)
        };
        let tmb = if responder {
            tmb_resp.sample(&mut rng)
        } else {
            tmb_non.sample(&mut rng)
        };
        let kras_positive = rng.gen::<f64>() < if responder { 0.42 } else { 0.31 };
        let ecog_weights: [f64; 3] = if responder { [0.36, 0.5, 0.14] } else { [0.26, 0.5, 0.24] };
        let u = rng.gen::<f64>();
        let ecog = if u < ecog_weights[0] {
            0.0
        } else if u < ecog_weights[0] + ecog_weights[1] {
            1.0
        } else {
            2.0
        };

        let mut row = vec![
            RawValue::Text(format!("PT{:03}", i + 1)),
            RawValue::Text(if responder { "responder" } else { "non_responder" }.to_string()),
            RawValue::Number(age),
            RawValue::Number(round1(pdl1.clamp(0.0, 100.0))),
            RawValue::Number(round1(tmb.clamp(0.5, 30.0))),
            RawValue::Text(if kras_positive { "positive" } else { "negative" }.to_string()),
            RawValue::Number(ecog),
        ];
        row.extend((0..config.n_null_biomarkers).map(|_| RawValue::Number(null_dist.sample(&mut rng))));

        if rng.gen::<f64>() < config.missing_fraction {
            // Blank one of pdl1_score, tmb or kras_mutation.
            let col = 3 + rng.gen_range(0..3);
            row[col] = RawValue::Missing;
        }
        rows.push(row);
    }

    Ok(SyntheticTrial {
        config: config.clone(),
        table: RawTable::new(columns, rows)?,
        n_responders,
    })
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
