//! Error kinds for every pipeline stage

use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading or cleaning the input dataset.
#[derive(Debug, Error)]
pub enum DataError {
    /// The dataset file could not be read.
    #[error("failed to read dataset {path}: {message}")]
    Io {
        /// Path of the dataset.
        path: PathBuf,
        /// Underlying reader message.
        message: String,
    },

    /// A required feature column is absent.
    #[error("required column `{0}` is missing from the dataset")]
    MissingColumn(&'static str),

    /// No rows survive after dropping rows with missing feature values.
    #[error("no complete rows left after dropping {dropped} incomplete row(s)")]
    Empty {
        /// Number of rows dropped for missing values.
        dropped: usize,
    },

    /// A record handed to the predictor lacks a feature value.
    #[error("record {index} is missing feature `{column}`")]
    IncompleteRecord {
        /// Position of the record in the input sequence.
        index: usize,
        /// Name of the first missing feature.
        column: &'static str,
    },
}

/// Failures while fitting a clustering model.
#[derive(Debug, Error)]
pub enum FitError {
    /// Fewer points than requested clusters.
    #[error("cannot form {k} clusters from {n_rows} row(s)")]
    InsufficientRows {
        /// Requested cluster count.
        k: usize,
        /// Rows available.
        n_rows: usize,
    },

    /// Every step of the sweep was infeasible.
    #[error("no cluster count in {k_min}..={k_max} could be fitted")]
    NoFeasibleK {
        /// First k of the sweep.
        k_min: usize,
        /// Last k of the sweep.
        k_max: usize,
    },

    /// An explicitly selected k was not fitted by the sweep.
    #[error("selected k={0} was not fitted by the sweep")]
    SelectionUnavailable(usize),

    /// The clustering backend rejected the parameters or failed to fit.
    #[error("k-means fit for k={k} failed: {message}")]
    Backend {
        /// Requested cluster count.
        k: usize,
        /// Backend message.
        message: String,
    },
}

/// Failures at the model storage boundary.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// No artifact has been written under this key yet.
    #[error("model `{key}` not found in {}", root.display())]
    NotFound {
        /// Store key.
        key: String,
        /// Store root directory.
        root: PathBuf,
    },

    /// `create` was called for a key that already exists.
    #[error("model `{0}` already exists")]
    AlreadyExists(String),

    /// The stored bytes do not decode to a supported artifact.
    #[error("model `{key}` is corrupt: {message}")]
    Corrupt {
        /// Store key.
        key: String,
        /// Decoder message.
        message: String,
    },

    /// Keys must be a single plain file name.
    #[error("invalid model key `{0}`")]
    InvalidKey(String),

    /// Filesystem failure while reading or writing.
    #[error("storage I/O error at {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors returned by the pipeline stages in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Input data problem; aborts the stage.
    #[error("data error in {stage}: {source}")]
    Data {
        /// Stage that rejected the input.
        stage: &'static str,
        /// Cause.
        #[source]
        source: DataError,
    },

    /// Clustering problem.
    #[error("fit error in {stage}: {source}")]
    Fit {
        /// Stage that failed.
        stage: &'static str,
        /// Cause.
        #[source]
        source: FitError,
    },

    /// Model storage problem; aborts the stage.
    #[error("persistence error in {stage}: {source}")]
    Persistence {
        /// Stage that failed.
        stage: &'static str,
        /// Cause.
        #[source]
        source: PersistenceError,
    },

    /// A stage-boundary envelope could not be encoded or decoded.
    #[error("stage envelope error: {0}")]
    Encoding(String),

    /// Plot rendering failed.
    #[error("plot rendering failed: {0}")]
    Plot(String),
}

impl Error {
    pub(crate) fn data(stage: &'static str, source: DataError) -> Self {
        Self::Data { stage, source }
    }

    pub(crate) fn fit(stage: &'static str, source: FitError) -> Self {
        Self::Fit { stage, source }
    }

    pub(crate) fn persistence(stage: &'static str, source: PersistenceError) -> Self {
        Self::Persistence { stage, source }
    }

    /// True when the error is a missing (never created) model artifact.
    pub fn is_model_not_found(&self) -> bool {
        matches!(
            self,
            Self::Persistence {
                source: PersistenceError::NotFound { .. },
                ..
            }
        )
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
