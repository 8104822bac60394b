//! Keyed on-disk model store and the versioned model artifact

use crate::data::N_FEATURES;
use crate::error::{Error, PersistenceError, Result};
use crate::model::ClusterModel;
use crate::scaler::MinMaxScaler;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Artifact layout version written by this crate
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Default directory for stored models, relative to the working directory
pub const DEFAULT_MODEL_DIR: &str = "model";

const SAVE_STAGE: &str = "save_model";
const LOAD_STAGE: &str = "load_model";

/// Persisted unit: the fitted model plus the scaler used to train it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub model: ClusterModel,
    /// Feature scaling fitted on the training batch, if any
    pub scaler: Option<MinMaxScaler>,
}

impl ModelArtifact {
    pub fn new(model: ClusterModel, scaler: Option<MinMaxScaler>) -> Self {
        Self {
            format_version: ARTIFACT_FORMAT_VERSION,
            created_at: Utc::now(),
            model,
            scaler,
        }
    }
}

/// Directory of model artifacts addressed by file-name keys
#[derive(Debug, Clone)]
pub struct ModelStore {
    root: PathBuf,
}

impl ModelStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> std::result::Result<PathBuf, PersistenceError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && Path::new(key).file_name().and_then(|n| n.to_str()) == Some(key);
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }

    /// Whether an artifact is stored under `key`
    pub fn exists(&self, key: &str) -> Result<bool> {
        let path = self
            .path_for(key)
            .map_err(|e| Error::persistence(LOAD_STAGE, e))?;
        Ok(path.is_file())
    }

    /// Store a new artifact; fails if `key` is already present
    pub fn create(&self, key: &str, artifact: &ModelArtifact) -> Result<PathBuf> {
        if self.exists(key)? {
            return Err(Error::persistence(
                SAVE_STAGE,
                PersistenceError::AlreadyExists(key.to_string()),
            ));
        }
        self.save(key, artifact)
    }

    /// Create or overwrite the artifact under `key`
    pub fn save(&self, key: &str, artifact: &ModelArtifact) -> Result<PathBuf> {
        let fail = |e| Error::persistence(SAVE_STAGE, e);
        let path = self.path_for(key).map_err(fail)?;

        fs::create_dir_all(&self.root).map_err(|source| {
            fail(PersistenceError::Io {
                path: self.root.clone(),
                source,
            })
        })?;

        let bytes = serde_json::to_vec_pretty(artifact).map_err(|e| {
            fail(PersistenceError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            })
        })?;

        // Write beside the target and rename so readers never see a partial file.
        let tmp = self.root.join(format!(".{key}.tmp"));
        fs::write(&tmp, bytes)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|source| {
                fail(PersistenceError::Io {
                    path: path.clone(),
                    source,
                })
            })?;

        info!(key, path = %path.display(), k = artifact.model.n_clusters, "Saved model");
        Ok(path)
    }

    /// Load the artifact under `key`.
    ///
    /// A key that was never written is `NotFound`; unreadable content or an
    /// unsupported format version is `Corrupt`.
    pub fn load(&self, key: &str) -> Result<ModelArtifact> {
        let fail = |e| Error::persistence(LOAD_STAGE, e);
        let path = self.path_for(key).map_err(fail)?;

        let bytes = fs::read(&path).map_err(|source| {
            fail(match source.kind() {
                ErrorKind::NotFound => PersistenceError::NotFound {
                    key: key.to_string(),
                    root: self.root.clone(),
                },
                _ => PersistenceError::Io {
                    path: path.clone(),
                    source,
                },
            })
        })?;

        let corrupt = |message: String| {
            fail(PersistenceError::Corrupt {
                key: key.to_string(),
                message,
            })
        };

        let artifact: ModelArtifact =
            serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported format version {}",
                artifact.format_version
            )));
        }
        let model = &artifact.model;
        if model.n_clusters == 0 || model.centroids.nrows() != model.n_clusters {
            return Err(corrupt(format!(
                "expected {} centroid(s), found {}",
                model.n_clusters,
                model.centroids.nrows()
            )));
        }
        if model.centroids.ncols() != N_FEATURES {
            return Err(corrupt(format!(
                "expected {} feature(s) per centroid, found {}",
                N_FEATURES,
                model.centroids.ncols()
            )));
        }
        if !model.centroids.iter().all(|v| v.is_finite()) {
            return Err(corrupt("non-finite centroid value".to_string()));
        }
        if let Some(scaler) = &artifact.scaler {
            if !scaler.min.iter().chain(&scaler.max).all(|v| v.is_finite()) {
                return Err(corrupt("non-finite scaler bound".to_string()));
            }
        }

        debug!(key, k = model.n_clusters, created_at = %artifact.created_at, "Loaded model");
        Ok(artifact)
    }
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new(DEFAULT_MODEL_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::tempdir;

    fn artifact() -> ModelArtifact {
        let model = ClusterModel {
            n_clusters: 2,
            centroids: array![[0.0, 0.0, 0.0, 0.0], [1.0, 1.0, 1.0, 1.0]],
            inertia: 0.5,
        };
        let scaler = MinMaxScaler {
            min: [0.0; 4],
            max: [10.0; 4],
        };
        ModelArtifact::new(model, Some(scaler))
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = ModelStore::new(dir.path().join("model"));
        let original = artifact();

        let path = store.save("model.json", &original).unwrap();
        assert!(path.is_file());
        assert!(store.exists("model.json").unwrap());

        let loaded = store.load("model.json").unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_missing_is_distinct_from_corrupt() {
        let dir = tempdir().unwrap();
        let store = ModelStore::new(dir.path());

        let missing = store.load("absent.json").unwrap_err();
        assert!(missing.is_model_not_found());

        fs::write(dir.path().join("broken.json"), b"not json").unwrap();
        let corrupt = store.load("broken.json").unwrap_err();
        assert!(!corrupt.is_model_not_found());
        assert!(matches!(
            corrupt,
            Error::Persistence {
                source: PersistenceError::Corrupt { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_unsupported_version_is_corrupt() {
        let dir = tempdir().unwrap();
        let store = ModelStore::new(dir.path());
        let mut old = artifact();
        old.format_version = 99;
        store.save("old.json", &old).unwrap();

        assert!(matches!(
            store.load("old.json").unwrap_err(),
            Error::Persistence {
                source: PersistenceError::Corrupt { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_centroids_are_corrupt() {
        let dir = tempdir().unwrap();
        let store = ModelStore::new(dir.path());

        let mut narrow = artifact();
        narrow.model.centroids = array![[0.0], [1.0]];
        store.save("narrow.json", &narrow).unwrap();

        let mut scaler_gap = artifact();
        scaler_gap.scaler = Some(MinMaxScaler {
            min: [0.0; 4],
            max: [f64::INFINITY, 1.0, 1.0, 1.0],
        });
        // Infinity serializes as null, which no longer decodes as f64.
        store.save("scaler.json", &scaler_gap).unwrap();

        for key in ["narrow.json", "scaler.json"] {
            assert!(matches!(
                store.load(key).unwrap_err(),
                Error::Persistence {
                    source: PersistenceError::Corrupt { .. },
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_create_does_not_overwrite() {
        let dir = tempdir().unwrap();
        let store = ModelStore::new(dir.path());

        store.create("m.json", &artifact()).unwrap();
        let err = store.create("m.json", &artifact()).unwrap_err();
        assert!(matches!(
            err,
            Error::Persistence {
                source: PersistenceError::AlreadyExists(_),
                ..
            }
        ));

        let mut replacement = artifact();
        replacement.model.inertia = 1.25;
        store.save("m.json", &replacement).unwrap();
        assert_eq!(store.load("m.json").unwrap().model.inertia, 1.25);
    }

    #[test]
    fn test_invalid_keys() {
        let store = ModelStore::new("unused");
        for key in ["", "..", "../escape.json", "nested/model.json", ".hidden"] {
            assert!(matches!(
                store.load(key).unwrap_err(),
                Error::Persistence {
                    source: PersistenceError::InvalidKey(_),
                    ..
                }
            ));
        }
    }
}
