//! Per-column min-max feature scaling

use crate::data::{FeatureVector, Record, N_FEATURES};
use crate::error::{DataError, Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const STAGE: &str = "data_preprocessing";

/// Per-column min/max observed on a training batch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub min: FeatureVector,
    pub max: FeatureVector,
}

impl MinMaxScaler {
    /// Fit on a non-empty set of complete feature vectors
    fn fit(rows: &[FeatureVector]) -> Self {
        let mut min = [f64::INFINITY; N_FEATURES];
        let mut max = [f64::NEG_INFINITY; N_FEATURES];
        for row in rows {
            for j in 0..N_FEATURES {
                min[j] = min[j].min(row[j]);
                max[j] = max[j].max(row[j]);
            }
        }
        Self { min, max }
    }

    /// Map a vector into the fitted range. Zero-variance columns map to 0.
    pub fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; N_FEATURES];
        for (j, slot) in out.iter_mut().enumerate() {
            // Halved operands keep `max - min` finite across the whole f64 range.
            let min = self.min[j] / 2.0;
            let span = self.max[j] / 2.0 - min;
            *slot = if span > 0.0 {
                (features[j] / 2.0 - min) / span
            } else {
                0.0
            };
        }
        out
    }
}

/// Scaled feature matrix (n_rows, 4) together with the scaler that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledFeatureMatrix {
    pub features: Array2<f64>,
    pub scaler: MinMaxScaler,
}

impl ScaledFeatureMatrix {
    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.features.nrows()
    }
}

/// Drop incomplete rows and scale each column into [0, 1].
///
/// # Errors
/// `DataError::Empty` if no complete row remains.
pub fn scale(records: &[Record]) -> Result<ScaledFeatureMatrix> {
    let rows: Vec<FeatureVector> = records.iter().filter_map(Record::features).collect();
    let dropped = records.len() - rows.len();
    if dropped > 0 {
        debug!(dropped, "Dropped rows with missing feature values");
    }
    if rows.is_empty() {
        return Err(Error::data(STAGE, DataError::Empty { dropped }));
    }

    let scaler = MinMaxScaler::fit(&rows);
    let scaled: Vec<FeatureVector> = rows.iter().map(|row| scaler.transform(row)).collect();
    let features = Array2::from_shape_fn((scaled.len(), N_FEATURES), |(i, j)| scaled[i][j]);

    info!(rows = rows.len(), dropped, "Scaled feature matrix");

    Ok(ScaledFeatureMatrix { features, scaler })
}
