//! Employee productivity records and CSV loading using Polars

use crate::error::{DataError, Error, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const STAGE: &str = "load_data";

/// Number of numeric features used for clustering
pub const N_FEATURES: usize = 4;

/// Feature columns, in the order they appear in every feature vector
pub const FEATURE_COLUMNS: [&str; N_FEATURES] = [
    "experience_years",
    "hours_per_week",
    "tasks_completed",
    "efficiency_score",
];

/// Fixed-dimension point extracted from a record
pub type FeatureVector = [f64; N_FEATURES];

/// One employee observation. Cells that were empty or non-numeric are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    pub experience_years: Option<f64>,
    pub hours_per_week: Option<f64>,
    pub tasks_completed: Option<f64>,
    pub efficiency_score: Option<f64>,
}

impl Record {
    /// Build a complete record
    pub fn new(
        experience_years: f64,
        hours_per_week: f64,
        tasks_completed: f64,
        efficiency_score: f64,
    ) -> Self {
        Self::from_features([
            experience_years,
            hours_per_week,
            tasks_completed,
            efficiency_score,
        ])
    }

    /// Build a complete record from a feature vector
    pub fn from_features(features: FeatureVector) -> Self {
        Self {
            experience_years: Some(features[0]),
            hours_per_week: Some(features[1]),
            tasks_completed: Some(features[2]),
            efficiency_score: Some(features[3]),
        }
    }

    fn values(&self) -> [Option<f64>; N_FEATURES] {
        [
            self.experience_years,
            self.hours_per_week,
            self.tasks_completed,
            self.efficiency_score,
        ]
    }

    /// Feature vector, or `None` if any feature is missing or not finite
    pub fn features(&self) -> Option<FeatureVector> {
        let values = self.values();
        let mut out = [0.0; N_FEATURES];
        for (slot, value) in out.iter_mut().zip(values) {
            *slot = value.filter(|v| v.is_finite())?;
        }
        Some(out)
    }

    /// Name of the first missing feature, if any
    pub fn missing_column(&self) -> Option<&'static str> {
        self.values()
            .iter()
            .position(|v| !v.is_some_and(f64::is_finite))
            .map(|i| FEATURE_COLUMNS[i])
    }
}

/// Load records from a CSV file.
///
/// Only the four feature columns are read; any other column is ignored.
/// Cells that cannot be read as numbers become missing values.
///
/// # Errors
/// * `DataError::Io` if the file is absent or unreadable
/// * `DataError::MissingColumn` if a feature column is absent
pub fn load_records(path: impl AsRef<Path>) -> Result<Vec<Record>> {
    let path = path.as_ref();
    let io_error = |message: String| {
        Error::data(
            STAGE,
            DataError::Io {
                path: path.to_path_buf(),
                message,
            },
        )
    };

    if !path.is_file() {
        return Err(io_error("file does not exist".to_string()));
    }

    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(None)
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|e| io_error(e.to_string()))?;

    let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(N_FEATURES);
    for name in FEATURE_COLUMNS {
        let series = df
            .column(name)
            .map_err(|_| Error::data(STAGE, DataError::MissingColumn(name)))?;
        let values = series
            .cast(&DataType::Float64)
            .and_then(|s| s.f64().map(|ca| ca.into_iter().collect::<Vec<_>>()))
            .map_err(|e| io_error(format!("column `{name}`: {e}")))?;
        columns.push(values);
    }

    let records: Vec<Record> = (0..df.height())
        .map(|i| Record {
            experience_years: columns[0][i],
            hours_per_week: columns[1][i],
            tasks_completed: columns[2][i],
            efficiency_score: columns[3][i],
        })
        .collect();

    let incomplete = records.iter().filter(|r| r.features().is_none()).count();
    info!(path = %path.display(), rows = records.len(), "Loaded dataset");
    debug!(incomplete, "Rows with missing feature values");

    Ok(records)
}
