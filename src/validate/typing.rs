//! Covariate column typing.

use crate::data::{Covariate, CovariateKind, CovariateValue, RawValue};
use std::collections::HashMap;

/// Minimum share of non-missing values that must be numeric for a column
/// to be treated as continuous.
pub const CONTINUOUS_NUMERIC_FRACTION: f64 = 0.95;

/// Infer the kind of a column and convert its cells.
///
/// Continuous columns keep numeric cells and count any text cell as
/// unparseable (treated as missing). Categorical columns build their
/// vocabulary in first-seen order.
pub fn type_column(name: &str, cells: &[&RawValue]) -> (Covariate, Vec<CovariateValue>) {
    let n_missing = cells.iter().filter(|v| v.is_missing()).count();
    let n_present = cells.len() - n_missing;
    let n_numeric = cells.iter().filter(|v| v.as_number().is_some()).count();

    let continuous =
        n_present == 0 || n_numeric as f64 / n_present as f64 >= CONTINUOUS_NUMERIC_FRACTION;

    if continuous {
        let values: Vec<CovariateValue> = cells
            .iter()
            .map(|v| match v {
                RawValue::Number(x) => CovariateValue::Numeric(*x),
                _ => CovariateValue::Missing,
            })
            .collect();
        let covariate = Covariate {
            name: name.to_string(),
            kind: CovariateKind::Continuous,
            n_missing,
            n_unparseable: n_present - n_numeric,
        };
        return (covariate, values);
    }

    let mut categories: Vec<String> = Vec::new();
    let mut lookup: HashMap<String, usize> = HashMap::new();
    let values: Vec<CovariateValue> = cells
        .iter()
        .map(|v| match v.label() {
            Some(label) => {
                let code = *lookup.entry(label.clone()).or_insert_with(|| {
                    categories.push(label);
                    categories.len() - 1
                });
                CovariateValue::Category(code)
            }
            None => CovariateValue::Missing,
        })
        .collect();

    let covariate = Covariate {
        name: name.to_string(),
        kind: CovariateKind::Categorical { categories },
        n_missing,
        n_unparseable: 0,
    };
    (covariate, values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(raw: &[&str]) -> Vec<RawValue> {
        raw.iter().map(|s| RawValue::parse(s)).collect()
    }

    #[test]
    fn test_numeric_column_is_continuous() {
        let raw = cells(&["1.0", "2.5", "NA", "4"]);
        let refs: Vec<&RawValue> = raw.iter().collect();
        let (cov, values) = type_column("score", &refs);

        assert_eq!(cov.kind, CovariateKind::Continuous);
        assert_eq!(cov.n_missing, 1);
        assert_eq!(values[1], CovariateValue::Numeric(2.5));
        assert!(values[2].is_missing());
    }

    #[test]
    fn test_mostly_numeric_column_stays_continuous() {
        // 19 of 20 numeric = 95%
        let mut raw: Vec<String> = (0..19).map(|i| i.to_string()).collect();
        raw.push("low".to_string());
        let raw: Vec<RawValue> = raw.iter().map(|s| RawValue::parse(s)).collect();
        let refs: Vec<&RawValue> = raw.iter().collect();
        let (cov, values) = type_column("score", &refs);

        assert!(cov.kind.is_continuous());
        assert_eq!(cov.n_unparseable, 1);
        assert!(values[19].is_missing());
    }

    #[test]
    fn test_text_column_is_categorical_first_seen_order() {
        let raw = cells(&["positive", "negative", "positive", "", "unknown"]);
        let refs: Vec<&RawValue> = raw.iter().collect();
        let (cov, values) = type_column("kras", &refs);

        assert_eq!(
            cov.kind.categories(),
            &["positive".to_string(), "negative".to_string(), "unknown".to_string()]
        );
        assert_eq!(values[0], CovariateValue::Category(0));
        assert_eq!(values[2], CovariateValue::Category(0));
        assert_eq!(values[4], CovariateValue::Category(2));
        assert!(values[3].is_missing());
    }

    #[test]
    fn test_mixed_column_below_threshold_keeps_numeric_labels() {
        let raw = cells(&["1", "2", "high", "low"]);
        let refs: Vec<&RawValue> = raw.iter().collect();
        let (cov, _) = type_column("grade", &refs);

        assert_eq!(cov.kind.categories(), &["1", "2", "high", "low"]);
    }
}
