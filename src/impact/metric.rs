//! Metrics that may be undefined.

use crate::error::UndefinedMetric;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A derived ratio, or the reason its denominator vanished.
///
/// Undefined values are never coerced to zero or one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Defined(f64),
    Undefined(UndefinedMetric),
}

impl Metric {
    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Defined(v) => Some(v),
            Metric::Undefined(_) => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Metric::Defined(_))
    }

    /// Apply `f` to a defined value, keeping the undefined reason otherwise.
    pub fn map<F: FnOnce(f64) -> f64>(self, f: F) -> Metric {
        match self {
            Metric::Defined(v) => Metric::Defined(f(v)),
            undefined => undefined,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Defined(v) => match f.precision() {
                Some(p) => write!(f, "{:.*}", p, v),
                None => write!(f, "{:.3}", v),
            },
            Metric::Undefined(_) => f.write_str("undefined"),
        }
    }
}
