//! Four-stage pipeline: load, preprocess, sweep and save, elbow and predict
//!
//! Each stage takes and returns envelope text so the stages can run in
//! separate tasks or processes; [`run`] chains them in one process.

use crate::data::{load_records, Record};
use crate::elbow;
use crate::error::Result;
use crate::predict::{FeatureSpace, Predictor};
use crate::scaler::{scale, ScaledFeatureMatrix};
use crate::stage::{self, names};
use crate::store::{ModelArtifact, ModelStore, DEFAULT_MODEL_DIR};
use crate::sweep::{sweep, InertiaCurve, SweepConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Inputs for a full pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// CSV dataset
    pub input: PathBuf,
    /// Directory of the model store
    pub model_dir: PathBuf,
    /// Store key for the fitted model
    pub model_name: String,
    pub sweep: SweepConfig,
    pub predict_space: FeatureSpace,
}

impl PipelineConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
            model_name: "model.json".to_string(),
            sweep: SweepConfig::default(),
            predict_space: FeatureSpace::default(),
        }
    }
}

/// Output of the sweep stage passed on to the prediction stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub curve: InertiaCurve,
    pub selected_k: usize,
}

/// Results surfaced to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Inertia per k, `None` where the fit was skipped
    pub inertia: Vec<Option<f64>>,
    pub curve: InertiaCurve,
    pub elbow: Option<usize>,
    /// Cluster count of the persisted model
    pub selected_k: usize,
    /// Label of the first dataset record
    pub prediction: usize,
}

/// Stage 1: read the dataset
pub fn load_data(input: &Path) -> Result<String> {
    let records = load_records(input)?;
    stage::encode(names::RECORDS, &records)
}

/// Stage 2: drop incomplete rows and scale features
pub fn data_preprocessing(records_text: &str) -> Result<String> {
    let records: Vec<Record> = stage::decode(names::RECORDS, records_text)?;
    let matrix = scale(&records)?;
    stage::encode(names::SCALED, &matrix)
}

/// Stage 3: sweep k, persist the selected model with its scaler
pub fn build_save_model(
    scaled_text: &str,
    store: &ModelStore,
    model_name: &str,
    config: &SweepConfig,
) -> Result<String> {
    let matrix: ScaledFeatureMatrix = stage::decode(names::SCALED, scaled_text)?;
    let outcome = sweep(&matrix, config)?;
    let selected_k = outcome.model.n_clusters;
    let sizes = outcome
        .model
        .cluster_sizes(&outcome.model.assign(&matrix.features));
    debug!(selected_k, ?sizes, "Selected model cluster sizes");

    store.save(model_name, &ModelArtifact::new(outcome.model, Some(matrix.scaler)))?;

    stage::encode(
        names::SWEEP,
        &SweepSummary {
            curve: outcome.curve,
            selected_k,
        },
    )
}

/// Stage 4: report the elbow and label the first dataset record
pub fn load_model_elbow(
    store: &ModelStore,
    model_name: &str,
    sweep_text: &str,
    input: &Path,
    space: FeatureSpace,
) -> Result<PipelineReport> {
    let artifact = store.load(model_name)?;
    let summary: SweepSummary = stage::decode(names::SWEEP, sweep_text)?;

    let elbow = elbow::detect(&summary.curve);
    info!(elbow = ?elbow, "Optimal k");

    let records = load_records(input)?;
    let prediction = Predictor::new(&artifact, space).predict_first(&records)?;

    Ok(PipelineReport {
        inertia: summary.curve.sse_values(),
        curve: summary.curve,
        elbow,
        selected_k: summary.selected_k,
        prediction,
    })
}

/// Run all four stages in sequence
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    let store = ModelStore::new(&config.model_dir);

    let records_text = load_data(&config.input)?;
    let scaled_text = data_preprocessing(&records_text)?;
    let sweep_text = build_save_model(&scaled_text, &store, &config.model_name, &config.sweep)?;
    load_model_elbow(
        &store,
        &config.model_name,
        &sweep_text,
        &config.input,
        config.predict_space,
    )
}
