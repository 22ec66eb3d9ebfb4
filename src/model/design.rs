//! Design matrices for univariate biomarker models.

use nalgebra::DMatrix;

/// Name of the intercept column.
pub const INTERCEPT: &str = "(Intercept)";

/// A design matrix for a single-biomarker logistic model.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    /// Observations × coefficients.
    matrix: DMatrix<f64>,
    /// Names of the coefficients (columns).
    coefficient_names: Vec<String>,
}

impl DesignMatrix {
    /// Intercept plus one continuous column.
    pub fn continuous(name: &str, values: &[f64]) -> Self {
        let n = values.len();
        let matrix = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { values[i] });
        Self {
            matrix,
            coefficient_names: vec![INTERCEPT.to_string(), name.to_string()],
        }
    }

    /// Intercept plus one indicator per non-reference category.
    ///
    /// The first category is the reference level.
    pub fn categorical(name: &str, codes: &[usize], categories: &[String]) -> Self {
        let n = codes.len();
        let k = categories.len().max(1);
        let matrix = DMatrix::from_fn(n, k, |i, j| {
            if j == 0 || codes[i] == j {
                1.0
            } else {
                0.0
            }
        });
        let mut coefficient_names = vec![INTERCEPT.to_string()];
        coefficient_names.extend(
            categories
                .iter()
                .skip(1)
                .map(|level| format!("{}{}", name, level)),
        );
        Self {
            matrix,
            coefficient_names,
        }
    }

    /// The design matrix.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    /// Coefficient names.
    pub fn coefficient_names(&self) -> &[String] {
        &self.coefficient_names
    }

    /// Number of observations.
    pub fn n_observations(&self) -> usize {
        self.matrix.nrows()
    }

    /// Number of coefficients.
    pub fn n_coefficients(&self) -> usize {
        self.matrix.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuous_design() {
        let d = DesignMatrix::continuous("pdl1", &[0.5, -1.0, 2.0]);
        assert_eq!(d.n_observations(), 3);
        assert_eq!(d.n_coefficients(), 2);
        assert_eq!(d.matrix()[(1, 0)], 1.0);
        assert_eq!(d.matrix()[(1, 1)], -1.0);
        assert_eq!(d.coefficient_names()[1], "pdl1");
    }

    #[test]
    fn test_categorical_design_uses_first_level_as_reference() {
        let categories = vec!["wt".to_string(), "mut".to_string(), "unk".to_string()];
        let d = DesignMatrix::categorical("kras", &[0, 1, 2, 1], &categories);

        assert_eq!(d.n_coefficients(), 3);
        assert_eq!(d.coefficient_names(), &["(Intercept)", "krasmut", "krasunk"]);
        // Reference row has only the intercept.
        assert_eq!(d.matrix().row(0).sum(), 1.0);
        assert_eq!(d.matrix()[(1, 1)], 1.0);
        assert_eq!(d.matrix()[(1, 2)], 0.0);
        assert_eq!(d.matrix()[(2, 2)], 1.0);
    }
}
