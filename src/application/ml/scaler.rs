use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Column-wise z-score scaler.
///
/// Fit on the training matrix only; prediction-time inputs are transformed
/// with the stored parameters and never re-fit, so a new point's scale
/// cannot leak into the model. A scaler belongs to exactly one classifier
/// and is fit together with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Fit scaling parameters on a feature matrix (rows = samples).
    ///
    /// Uses the population (n) standard deviation; a constant column gets a
    /// unit divisor so it scales to zero instead of dividing by zero.
    pub fn fit(matrix: &[Vec<f64>]) -> Self {
        assert!(!matrix.is_empty(), "cannot fit scaler on an empty matrix");
        let n_features = matrix[0].len();

        let mut means = Vec::with_capacity(n_features);
        let mut stds = Vec::with_capacity(n_features);
        for column in 0..n_features {
            let values: Vec<f64> = matrix.iter().map(|row| row[column]).collect();
            let mean = values.iter().mean();
            let std = values.iter().population_std_dev();
            means.push(mean);
            stds.push(if std > 0.0 { std } else { 1.0 });
        }

        Self { means, stds }
    }

    pub fn n_features(&self) -> usize {
        self.means.len()
    }

    /// Transform one feature vector in place of the fitted columns.
    ///
    /// Panics when the vector arity differs from the fitted arity; that is a
    /// programming error, not a data-sufficiency condition.
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        assert_eq!(
            row.len(),
            self.n_features(),
            "feature vector arity differs from fit-time arity"
        );
        row.iter()
            .zip(self.means.iter().zip(self.stds.iter()))
            .map(|(value, (mean, std))| (value - mean) / std)
            .collect()
    }

    pub fn transform(&self, matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
        matrix.iter().map(|row| self.transform_row(row)).collect()
    }
}
