//! The pre-trained model behind the service.
//!
//! The rest of the crate only sees the [`Scorer`] capability; the concrete
//! artifact is an XGBoost JSON export loaded once at startup.

mod forest;
#[cfg(test)]
pub(crate) mod testing;
mod xgboost;

pub use forest::{Forest, Link, Node, Tree};
pub use xgboost::XgbModel;

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::features::FeatureVector;

/// Describes the loaded artifact, as reported by `GET /debug`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub path: String,
    pub format: String,
    pub version: Option<String>,
    pub booster: String,
    pub objective: String,
    /// Trees used for scoring.
    pub n_trees: usize,
    pub trees_in_artifact: usize,
    /// Set when training stopped early; later trees are not scored.
    pub best_iteration: Option<usize>,
    pub base_score: f32,
    pub num_feature: usize,
    pub feature_names: Vec<String>,
}

/// Anything that can turn a feature vector into a predicted tempo.
///
/// Implementations must be pure: the same vector always scores the same.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait Scorer: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError>;

    fn describe(&self) -> ModelInfo;
}

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("tree {tree} node {node} splits on feature {feature} but the input has {n_features} features")]
    FeatureOutOfRange {
        tree: usize,
        node: usize,
        feature: usize,
        n_features: usize,
    },

    #[error("model produced a non-finite prediction ({0})")]
    NonFinite(f64),

    #[error("{0}")]
    Backend(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("cannot read model file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse model file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported booster type: {0}")]
    UnsupportedBooster(String),

    #[error("unsupported objective: {0}")]
    UnsupportedObjective(String),

    #[error("model has multiple outputs (num_class={num_class}, num_target={num_target})")]
    MultiOutput { num_class: i64, num_target: i64 },

    #[error("model expects {found} features, the feature schema has {expected}")]
    FeatureCountMismatch { expected: usize, found: usize },

    #[error("model feature names {found:?} do not match the feature schema {expected:?}")]
    FeatureNamesMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("tree {0} has no nodes")]
    EmptyTree(usize),

    #[error("tree {tree} is malformed: {reason}")]
    MalformedTree { tree: usize, reason: String },

    #[error("invalid node index in tree {tree}: node {node} references child {child} but tree has {num_nodes} nodes")]
    InvalidNodeIndex {
        tree: usize,
        node: usize,
        child: i32,
        num_nodes: usize,
    },

    #[error("tree {tree} node {node} uses a categorical split, which is not supported")]
    CategoricalSplit { tree: usize, node: usize },

    #[error("tree {tree} node {node} splits on feature {feature}, outside the feature schema")]
    FeatureOutOfRange { tree: usize, node: usize, feature: i64 },
}

/// Load the model artifact at `path`.
pub fn load_model(path: &Path) -> Result<Forest, ModelLoadError> {
    let forest = XgbModel::from_file(path)?.to_forest(path)?;
    let info = forest.describe();
    info!(
        "Loaded {} model from {:?}: {} trees, objective {}, base score {}",
        info.booster, path, info.n_trees, info.objective, info.base_score
    );
    if let Some(best) = info.best_iteration {
        info!(
            "Early stopping at round {}: scoring {} of {} trees",
            best, info.n_trees, info.trees_in_artifact
        );
    }
    Ok(forest)
}
