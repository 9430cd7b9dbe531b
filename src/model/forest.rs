//! Immutable tree ensemble evaluated per request.

use super::{ModelInfo, PredictionError, Scorer};
use crate::features::FeatureVector;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Split {
        feature: u32,
        threshold: f32,
        default_left: bool,
        left: u32,
        right: u32,
    },
    Leaf(f32),
}

/// Nodes are stored with the root at index 0 and every child after its parent.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(nodes: Vec<Node>) -> Self {
        Tree { nodes }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// `x < threshold` goes left, NaN follows the node's default direction.
    fn leaf_value(&self, tree_idx: usize, features: &[f32]) -> Result<f32, PredictionError> {
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf(value) => return Ok(*value),
                Node::Split {
                    feature,
                    threshold,
                    default_left,
                    left,
                    right,
                } => {
                    let x = *features.get(*feature as usize).ok_or(
                        PredictionError::FeatureOutOfRange {
                            tree: tree_idx,
                            node: idx,
                            feature: *feature as usize,
                            n_features: features.len(),
                        },
                    )?;
                    let go_left = if x.is_nan() {
                        *default_left
                    } else {
                        x < *threshold
                    };
                    idx = if go_left { *left } else { *right } as usize;
                }
            }
        }
    }
}

/// How the raw margin maps to the objective's output space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Identity,
    /// Sigmoid output, base score stored as a probability.
    Logistic,
    /// Raw margin output, base score stored as a probability.
    LogitRaw,
    /// Exponential output, base score stored in the original scale.
    Log,
}

impl Link {
    pub fn for_objective(name: &str) -> Option<Link> {
        match name {
            "reg:squarederror" | "reg:linear" | "reg:pseudohubererror" | "reg:squaredlogerror"
            | "reg:absoluteerror" | "reg:quantileerror" => Some(Link::Identity),
            "reg:logistic" | "binary:logistic" => Some(Link::Logistic),
            "binary:logitraw" => Some(Link::LogitRaw),
            "count:poisson" | "reg:gamma" | "reg:tweedie" => Some(Link::Log),
            _ => None,
        }
    }

    fn base_margin(&self, base_score: f32) -> f32 {
        match self {
            Link::Identity => base_score,
            Link::Logistic | Link::LogitRaw => {
                let p = base_score.clamp(1e-7, 1.0 - 1e-7);
                (p / (1.0 - p)).ln()
            }
            Link::Log => base_score.max(1e-7).ln(),
        }
    }

    fn apply(&self, margin: f32) -> f32 {
        match self {
            Link::Identity | Link::LogitRaw => margin,
            Link::Logistic => 1.0 / (1.0 + (-margin).exp()),
            Link::Log => margin.exp(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Forest {
    trees: Vec<Tree>,
    tree_weights: Option<Vec<f32>>,
    base_margin: f32,
    link: Link,
    info: ModelInfo,
}

impl Forest {
    pub fn new(
        trees: Vec<Tree>,
        tree_weights: Option<Vec<f32>>,
        base_score: f32,
        link: Link,
        info: ModelInfo,
    ) -> Self {
        Forest {
            trees,
            tree_weights,
            base_margin: link.base_margin(base_score),
            link,
            info,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn link(&self) -> Link {
        self.link
    }
}

impl Scorer for Forest {
    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        // Single precision, as the trees were trained and thresholds stored.
        let row: Vec<f32> = features.as_slice().iter().map(|v| *v as f32).collect();

        let mut margin = self.base_margin;
        for (idx, tree) in self.trees.iter().enumerate() {
            let value = tree.leaf_value(idx, &row)?;
            let weight = self
                .tree_weights
                .as_ref()
                .and_then(|w| w.get(idx).copied())
                .unwrap_or(1.0);
            margin += weight * value;
        }

        let prediction = self.link.apply(margin) as f64;
        if !prediction.is_finite() {
            return Err(PredictionError::NonFinite(prediction));
        }
        Ok(prediction)
    }

    fn describe(&self) -> ModelInfo {
        self.info.clone()
    }
}
