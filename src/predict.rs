//! Cluster assignment for new records against a stored model

use crate::data::{FeatureVector, Record};
use crate::error::{DataError, Error, Result};
use crate::store::{ModelArtifact, ModelStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

const STAGE: &str = "predict";

/// Feature space in which records are compared to centroids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeatureSpace {
    /// Apply the artifact's training scaler before distance computation
    #[default]
    Scaled,
    /// Compare raw, unscaled feature values
    Raw,
}

impl fmt::Display for FeatureSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scaled => write!(f, "scaled"),
            Self::Raw => write!(f, "raw"),
        }
    }
}

impl FromStr for FeatureSpace {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "scaled" => Ok(Self::Scaled),
            "raw" => Ok(Self::Raw),
            other => Err(format!("invalid feature space `{other}`, expected scaled or raw")),
        }
    }
}

/// Borrowed view of a loaded artifact that labels records
#[derive(Debug)]
pub struct Predictor<'a> {
    artifact: &'a ModelArtifact,
    space: FeatureSpace,
}

impl<'a> Predictor<'a> {
    pub fn new(artifact: &'a ModelArtifact, space: FeatureSpace) -> Self {
        if space == FeatureSpace::Scaled && artifact.scaler.is_none() {
            warn!("Model artifact has no scaler; predicting on raw features");
        }
        Self { artifact, space }
    }

    /// Number of clusters in the underlying model
    pub fn n_clusters(&self) -> usize {
        self.artifact.model.n_clusters
    }

    fn prepare(&self, features: FeatureVector) -> FeatureVector {
        match (self.space, &self.artifact.scaler) {
            (FeatureSpace::Scaled, Some(scaler)) => scaler.transform(&features),
            _ => features,
        }
    }

    /// Label a single feature vector
    pub fn predict_one(&self, features: FeatureVector) -> usize {
        self.artifact.model.predict(&self.prepare(features))
    }

    /// Label every record, in input order.
    ///
    /// # Errors
    /// `DataError::IncompleteRecord` for the first record missing a feature.
    pub fn predict(&self, records: &[Record]) -> Result<Vec<usize>> {
        let labels = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                record
                    .features()
                    .map(|features| self.predict_one(features))
                    .ok_or_else(|| {
                        Error::data(
                            STAGE,
                            DataError::IncompleteRecord {
                                index,
                                column: record.missing_column().unwrap_or("unknown"),
                            },
                        )
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(records = labels.len(), space = %self.space, "Predicted clusters");
        Ok(labels)
    }

    /// Label every record and report only the first label.
    ///
    /// # Errors
    /// Fails if the input is empty or any record is incomplete.
    pub fn predict_first(&self, records: &[Record]) -> Result<usize> {
        let labels = self.predict(records)?;
        let label = labels
            .first()
            .copied()
            .ok_or_else(|| Error::data(STAGE, DataError::Empty { dropped: 0 }))?;
        info!(label, space = %self.space, "Predicted first record");
        Ok(label)
    }
}

/// Load the artifact under `key` and label every record
pub fn predict(
    store: &ModelStore,
    key: &str,
    records: &[Record],
    space: FeatureSpace,
) -> Result<Vec<usize>> {
    let artifact = store.load(key)?;
    Predictor::new(&artifact, space).predict(records)
}
