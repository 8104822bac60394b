//! Multi-k clustering sweep and inertia curve collection

use crate::elbow;
use crate::error::{Error, FitError, Result};
use crate::model::{fit_kmeans, ClusterModel, KMeansSettings};
use crate::scaler::ScaledFeatureMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

const STAGE: &str = "build_save_model";

/// Which fitted model the sweep hands off for persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelSelection {
    /// Model for the largest feasible k
    #[default]
    Last,
    /// Model at the detected elbow; `Last` when no elbow is found
    Elbow,
    /// Model at a fixed k
    Fixed(usize),
}

impl fmt::Display for ModelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Last => write!(f, "last"),
            Self::Elbow => write!(f, "elbow"),
            Self::Fixed(k) => write!(f, "fixed:{k}"),
        }
    }
}

impl FromStr for ModelSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "last" => Ok(Self::Last),
            "elbow" => Ok(Self::Elbow),
            other => other
                .strip_prefix("fixed:")
                .and_then(|k| k.trim().parse().ok())
                .filter(|&k: &usize| k > 0)
                .map(Self::Fixed)
                .ok_or_else(|| {
                    format!("invalid selection `{other}`, expected last, elbow or fixed:<k>")
                }),
        }
    }
}

/// Sweep configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub k_min: usize,
    pub k_max: usize,
    pub kmeans: KMeansSettings,
    pub selection: ModelSelection,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            k_min: 1,
            k_max: 10,
            kmeans: KMeansSettings::default(),
            selection: ModelSelection::Last,
        }
    }
}

/// Inertia of one sweep step; `None` when that k could not be fitted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InertiaPoint {
    pub k: usize,
    pub sse: Option<f64>,
}

/// Inertia per k, in increasing order of k
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InertiaCurve {
    pub points: Vec<InertiaPoint>,
}

impl InertiaCurve {
    /// Build a fully defined curve from consecutive SSE values starting at `k_min`
    pub fn from_values(k_min: usize, values: &[f64]) -> Self {
        Self {
            points: values
                .iter()
                .enumerate()
                .map(|(i, &sse)| InertiaPoint {
                    k: k_min + i,
                    sse: Some(sse),
                })
                .collect(),
        }
    }

    /// SSE values in k order, `None` for skipped steps
    pub fn sse_values(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.sse).collect()
    }

    /// Only the fitted (k, sse) pairs
    pub fn defined(&self) -> Vec<(usize, f64)> {
        self.points
            .iter()
            .filter_map(|p| p.sse.map(|sse| (p.k, sse)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Result of a sweep: the diagnostic curve, its elbow and the handed-off model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepOutcome {
    pub curve: InertiaCurve,
    pub elbow: Option<usize>,
    pub model: ClusterModel,
}

/// Fit k-means for every k in `k_min..=k_max` and record each inertia.
///
/// A k that cannot be fitted is logged, recorded as undefined and skipped.
///
/// # Errors
/// * `FitError::NoFeasibleK` if no k could be fitted
/// * `FitError::SelectionUnavailable` if `ModelSelection::Fixed` names a k
///   that was not fitted
pub fn sweep(matrix: &ScaledFeatureMatrix, config: &SweepConfig) -> Result<SweepOutcome> {
    let mut curve = InertiaCurve::default();
    let mut models: Vec<ClusterModel> = Vec::new();

    for k in config.k_min..=config.k_max {
        match fit_kmeans(&matrix.features, k, &config.kmeans) {
            Ok(model) => {
                debug!(k, inertia = model.inertia, "Fitted k-means");
                curve.points.push(InertiaPoint {
                    k,
                    sse: Some(model.inertia),
                });
                models.push(model);
            }
            Err(e) => {
                warn!(k, error = %e, "Skipping cluster count");
                curve.points.push(InertiaPoint { k, sse: None });
            }
        }
    }

    if models.is_empty() {
        return Err(Error::fit(
            STAGE,
            FitError::NoFeasibleK {
                k_min: config.k_min,
                k_max: config.k_max,
            },
        ));
    }

    let elbow = elbow::detect(&curve);
    let target_k = match config.selection {
        ModelSelection::Last => None,
        ModelSelection::Elbow => elbow,
        ModelSelection::Fixed(k) => Some(k),
    };

    let model = match target_k {
        Some(k) => match models.iter().position(|m| m.n_clusters == k) {
            Some(idx) => models.swap_remove(idx),
            None => return Err(Error::fit(STAGE, FitError::SelectionUnavailable(k))),
        },
        None => models.pop().ok_or_else(|| {
            Error::fit(
                STAGE,
                FitError::NoFeasibleK {
                    k_min: config.k_min,
                    k_max: config.k_max,
                },
            )
        })?,
    };

    info!(
        fitted = curve.defined().len(),
        elbow = ?elbow,
        selection = %config.selection,
        selected_k = model.n_clusters,
        "Sweep complete"
    );

    Ok(SweepOutcome {
        curve,
        elbow,
        model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Record;
    use crate::scaler::scale;

    fn matrix(records: &[Record]) -> ScaledFeatureMatrix {
        scale(records).unwrap()
    }

    fn spread_records(n: usize) -> Vec<Record> {
        (0..n)
            .map(|i| {
                let x = i as f64;
                Record::new(x, (x * 7.0) % 5.0, (x * 3.0) % 4.0, x * x)
            })
            .collect()
    }

    #[test]
    fn test_sweep_records_ten_points_and_returns_last_model() {
        let m = matrix(&spread_records(30));
        let outcome = sweep(&m, &SweepConfig::default()).unwrap();

        assert_eq!(outcome.curve.len(), 10);
        let ks: Vec<usize> = outcome.curve.points.iter().map(|p| p.k).collect();
        assert_eq!(ks, (1..=10).collect::<Vec<_>>());
        assert!(outcome.curve.points.iter().all(|p| p.sse.is_some()));
        assert_eq!(outcome.model.n_clusters, 10);
        assert_eq!(outcome.model.centroids.shape(), &[10, 4]);
    }

    #[test]
    fn test_inertia_is_non_increasing_in_k() {
        for n in [30, 60] {
            let m = matrix(&spread_records(n));
            let outcome = sweep(&m, &SweepConfig::default()).unwrap();

            let sse: Vec<f64> = outcome.curve.defined().iter().map(|&(_, s)| s).collect();
            assert_eq!(sse.len(), 10);
            assert!(
                sse.windows(2).all(|w| w[1] <= w[0] + 1e-9),
                "inertia increased with k for n={}: {:?}",
                n,
                sse
            );
        }
    }

    #[test]
    fn test_sweep_skips_infeasible_k() {
        let m = matrix(&spread_records(5));
        let outcome = sweep(&m, &SweepConfig::default()).unwrap();

        for point in &outcome.curve.points {
            if point.k <= 5 {
                assert!(point.sse.is_some(), "k={} should be fitted", point.k);
            } else {
                assert!(point.sse.is_none(), "k={} should be skipped", point.k);
            }
        }
        assert_eq!(outcome.model.n_clusters, 5);
    }

    #[test]
    fn test_sweep_fails_when_no_k_is_feasible() {
        let m = matrix(&spread_records(2));
        let config = SweepConfig {
            k_min: 3,
            k_max: 4,
            ..SweepConfig::default()
        };

        let err = sweep(&m, &config).unwrap_err();
        assert!(matches!(
            err,
            Error::Fit {
                source: FitError::NoFeasibleK { k_min: 3, k_max: 4 },
                ..
            }
        ));
    }

    #[test]
    fn test_fixed_selection() {
        let m = matrix(&spread_records(12));
        let config = SweepConfig {
            selection: ModelSelection::Fixed(3),
            ..SweepConfig::default()
        };
        let outcome = sweep(&m, &config).unwrap();
        assert_eq!(outcome.model.n_clusters, 3);

        let config = SweepConfig {
            selection: ModelSelection::Fixed(11),
            ..SweepConfig::default()
        };
        assert!(matches!(
            sweep(&m, &config).unwrap_err(),
            Error::Fit {
                source: FitError::SelectionUnavailable(11),
                ..
            }
        ));
    }

    #[test]
    fn test_parse_model_selection() {
        assert_eq!("last".parse::<ModelSelection>(), Ok(ModelSelection::Last));
        assert_eq!("elbow".parse::<ModelSelection>(), Ok(ModelSelection::Elbow));
        assert_eq!(
            "fixed:4".parse::<ModelSelection>(),
            Ok(ModelSelection::Fixed(4))
        );
        assert!("fixed:0".parse::<ModelSelection>().is_err());
        assert!("best".parse::<ModelSelection>().is_err());
        assert_eq!(ModelSelection::Fixed(7).to_string(), "fixed:7");
    }
}
