//! Feature Scaler - Z-score normalization
//!
//! Per-feature mean and population standard deviation learned once from the
//! training matrix. The same transform is applied to training rows and to
//! every live reading.

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::logic::features::FEATURE_COUNT;

/// Normalization parameters from training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    pub mean: [f64; FEATURE_COUNT],
    /// Population standard deviation as observed in the data
    pub std_dev: [f64; FEATURE_COUNT],
    /// Divisor actually used; 1.0 where std_dev is zero
    pub scale: [f64; FEATURE_COUNT],
}

impl NormalizationParams {
    /// Fit mean/std over the rows of `matrix` (shape `(n, FEATURE_COUNT)`).
    /// Returns `None` for an empty matrix.
    pub fn fit(matrix: &Array2<f64>) -> Option<Self> {
        if matrix.nrows() == 0 || matrix.ncols() != FEATURE_COUNT {
            return None;
        }

        let mean = matrix.mean_axis(Axis(0))?;
        let std_dev = matrix.std_axis(Axis(0), 0.0);

        let mut params = Self {
            mean: [0.0; FEATURE_COUNT],
            std_dev: [0.0; FEATURE_COUNT],
            scale: [1.0; FEATURE_COUNT],
        };
        for i in 0..FEATURE_COUNT {
            params.mean[i] = mean[i];
            params.std_dev[i] = std_dev[i];
            // Constant feature: keep it centered but unscaled
            params.scale[i] = if std_dev[i] > f64::EPSILON { std_dev[i] } else { 1.0 };
        }

        Some(params)
    }

    /// Normalize one feature array
    pub fn transform(&self, values: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut normalized = [0.0f64; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            normalized[i] = (values[i] - self.mean[i]) / self.scale[i];
        }
        normalized
    }

    /// Normalize every row of a matrix
    pub fn transform_matrix(&self, matrix: &Array2<f64>) -> Array2<f64> {
        let mut out = matrix.clone();
        for mut row in out.rows_mut() {
            for (i, cell) in row.iter_mut().enumerate() {
                *cell = (*cell - self.mean[i]) / self.scale[i];
            }
        }
        out
    }

    /// Map a normalized point back to raw feature units
    pub fn inverse_transform(&self, normalized: ArrayView1<f64>) -> [f64; FEATURE_COUNT] {
        let mut raw = [0.0f64; FEATURE_COUNT];
        for (i, value) in normalized.iter().take(FEATURE_COUNT).enumerate() {
            raw[i] = value * self.scale[i] + self.mean[i];
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    fn sample() -> Array2<f64> {
        array![
            [0.0, 20.0, 0.0, 0.0, 0.1],
            [0.0, 21.0, 0.0, 0.0, 0.1],
            [1.0, 28.0, 1.0, 1.0, 5.0],
            [1.0, 29.0, 1.0, 1.0, 5.2],
        ]
    }

    #[test]
    fn test_fit_mean_and_population_std() {
        let params = NormalizationParams::fit(&sample()).unwrap();

        assert!((params.mean[0] - 0.5).abs() < 1e-12);
        assert!((params.mean[1] - 24.5).abs() < 1e-12);
        // Population std of {0,0,1,1} is 0.5
        assert!((params.std_dev[0] - 0.5).abs() < 1e-12);
        assert_eq!(params.scale, params.std_dev);
    }

    #[test]
    fn test_mean_point_normalizes_to_zero() {
        let params = NormalizationParams::fit(&sample()).unwrap();
        let normalized = params.transform(&params.mean);

        assert!(normalized.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_constant_feature_uses_unit_scale() {
        let matrix = array![
            [0.0, 20.0, 1.0, 0.0, 0.5],
            [1.0, 22.0, 1.0, 0.0, 0.7],
        ];
        let params = NormalizationParams::fit(&matrix).unwrap();

        assert_eq!(params.std_dev[2], 0.0);
        assert_eq!(params.scale[2], 1.0);
        let normalized = params.transform(&[0.0, 21.0, 1.0, 0.0, 0.6]);
        assert!(normalized.iter().all(|v| v.is_finite()));
        assert_eq!(normalized[2], 0.0);
    }

    #[test]
    fn test_matrix_and_row_transforms_agree() {
        let data = sample();
        let params = NormalizationParams::fit(&data).unwrap();
        let matrix = params.transform_matrix(&data);

        for (i, row) in data.rows().into_iter().enumerate() {
            let mut values = [0.0; FEATURE_COUNT];
            for (slot, v) in values.iter_mut().zip(row.iter()) {
                *slot = *v;
            }
            let single = params.transform(&values);
            assert_eq!(single.to_vec(), matrix.row(i).to_vec());
        }
    }

    #[test]
    fn test_inverse_transform() {
        let params = NormalizationParams::fit(&sample()).unwrap();
        let raw = [1.0, 28.0, 1.0, 1.0, 5.0];
        let normalized = Array1::from(params.transform(&raw).to_vec());
        let back = params.inverse_transform(normalized.view());

        for (a, b) in raw.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_matrix() {
        let empty = Array2::<f64>::zeros((0, FEATURE_COUNT));
        assert!(NormalizationParams::fit(&empty).is_none());
    }
}
