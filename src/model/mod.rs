//! Logistic regression for single-biomarker response models.

mod design;
mod logistic;

pub use design::{DesignMatrix, INTERCEPT};
pub use logistic::{fit_logistic, LogisticFit, COEF_BOUND, MAX_ITER};
