//! ElbowForge: clustering of employee productivity records
//!
//! This library scales the four productivity features into [0, 1], fits
//! K-Means for a sweep of cluster counts, finds the elbow of the inertia
//! curve, persists the selected model and labels new records with it.

pub mod cli;
pub mod data;
pub mod elbow;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod predict;
pub mod scaler;
pub mod stage;
pub mod store;
pub mod sweep;
pub mod viz;

// Re-export public items for easier access
pub use cli::Args;
pub use data::{load_records, FeatureVector, Record, FEATURE_COLUMNS};
pub use elbow::detect as detect_elbow;
pub use error::{DataError, Error, FitError, PersistenceError, Result};
pub use model::{fit_kmeans, ClusterModel, KMeansSettings};
pub use pipeline::{PipelineConfig, PipelineReport};
pub use predict::{FeatureSpace, Predictor};
pub use scaler::{scale, MinMaxScaler, ScaledFeatureMatrix};
pub use store::{ModelArtifact, ModelStore};
pub use sweep::{sweep, InertiaCurve, InertiaPoint, ModelSelection, SweepConfig, SweepOutcome};
pub use viz::render_elbow_curve;
