//! K-Means clustering model implementation

use crate::data::FeatureVector;
use crate::error::FitError;
use linfa::prelude::*;
use linfa_clustering::{KMeans, KMeansInit};
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Settings applied to every single-k fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KMeansSettings {
    /// Independent random initializations; the lowest-inertia run wins
    pub n_init: usize,
    /// Maximum refinement iterations per initialization
    pub max_iters: u64,
    /// Convergence tolerance on centroid movement
    pub tolerance: f64,
    /// Seed for centroid initialization
    pub seed: u64,
}

impl Default for KMeansSettings {
    fn default() -> Self {
        Self {
            n_init: 10,
            max_iters: 300,
            tolerance: 1e-4,
            seed: 42,
        }
    }
}

/// Fitted clustering model: k centroids and a nearest-centroid assignment rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterModel {
    /// Number of clusters
    pub n_clusters: usize,
    /// Cluster centroids (n_clusters, n_features)
    pub centroids: Array2<f64>,
    /// Within-cluster sum of squares on the training data
    pub inertia: f64,
}

impl ClusterModel {
    /// Index of the nearest centroid by Euclidean distance
    pub fn predict(&self, features: &FeatureVector) -> usize {
        self.predict_row(ArrayView1::from(&features[..]))
    }

    /// Nearest centroid for a row of a feature matrix
    pub fn predict_row(&self, point: ArrayView1<f64>) -> usize {
        let mut min_distance = f64::INFINITY;
        let mut closest_cluster = 0;

        for (cluster_idx, centroid) in self.centroids.outer_iter().enumerate() {
            let distance = squared_distance(&point, &centroid);
            if distance < min_distance {
                min_distance = distance;
                closest_cluster = cluster_idx;
            }
        }

        closest_cluster
    }

    /// Assign every row of a feature matrix
    pub fn assign(&self, features: &Array2<f64>) -> Array1<usize> {
        features.outer_iter().map(|row| self.predict_row(row)).collect()
    }

    /// Number of points per cluster for the given assignments
    pub fn cluster_sizes(&self, labels: &Array1<usize>) -> Vec<usize> {
        let mut sizes = vec![0; self.n_clusters];
        for &label in labels.iter() {
            if label < self.n_clusters {
                sizes[label] += 1;
            }
        }
        sizes
    }
}

/// Fit K-Means with `n_clusters` centroids on a feature matrix.
///
/// Initial centroids are drawn at random from the data rows; each of the
/// `n_init` runs refines until centroid movement falls below the tolerance
/// or `max_iters` is reached, and the lowest-inertia run is kept.
///
/// # Errors
/// * `FitError::InsufficientRows` if there are fewer rows than clusters
/// * `FitError::Backend` if the clustering backend fails
pub fn fit_kmeans(
    features: &Array2<f64>,
    n_clusters: usize,
    settings: &KMeansSettings,
) -> Result<ClusterModel, FitError> {
    let n_rows = features.nrows();
    if n_clusters == 0 || n_rows < n_clusters {
        return Err(FitError::InsufficientRows {
            k: n_clusters,
            n_rows,
        });
    }

    let targets: Array1<usize> = Array1::zeros(n_rows);
    let dataset = Dataset::new(features.clone(), targets);

    let rng = StdRng::seed_from_u64(settings.seed);
    let model = KMeans::params_with(n_clusters, rng, L2Dist)
        .n_runs(settings.n_init)
        .max_n_iterations(settings.max_iters)
        .tolerance(settings.tolerance)
        .init_method(KMeansInit::Random)
        .fit(&dataset)
        .map_err(|e| FitError::Backend {
            k: n_clusters,
            message: e.to_string(),
        })?;

    let centroids = model.centroids().clone();
    let mut fitted = ClusterModel {
        n_clusters,
        centroids,
        inertia: 0.0,
    };
    let labels = fitted.assign(features);
    fitted.inertia = compute_inertia(features, &labels, &fitted.centroids);

    Ok(fitted)
}

/// Compute within-cluster sum of squares (inertia)
pub fn compute_inertia(
    features: &Array2<f64>,
    labels: &Array1<usize>,
    centroids: &Array2<f64>,
) -> f64 {
    let mut inertia = 0.0;

    for (i, &cluster) in labels.iter().enumerate() {
        if cluster < centroids.nrows() {
            inertia += squared_distance(&features.row(i), &centroids.row(cluster));
        }
    }

    inertia
}

fn squared_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}
