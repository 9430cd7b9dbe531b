//! Hand-built XGBoost documents for unit tests.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub(crate) enum TestNode {
    Split {
        feature: i32,
        threshold: f32,
        left: i32,
        right: i32,
    },
    Leaf(f32),
}

pub(crate) fn split(feature: i32, threshold: f32, left: i32, right: i32) -> TestNode {
    TestNode::Split {
        feature,
        threshold,
        left,
        right,
    }
}

pub(crate) fn leaf(value: f32) -> TestNode {
    TestNode::Leaf(value)
}

/// One tree in the layout `save_model` writes: parallel per-node arrays.
pub(crate) fn tree_json(nodes: &[TestNode]) -> Value {
    let mut left_children = Vec::new();
    let mut right_children = Vec::new();
    let mut split_indices = Vec::new();
    let mut split_conditions = Vec::new();
    let mut base_weights = Vec::new();
    for node in nodes {
        match node {
            TestNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                left_children.push(*left);
                right_children.push(*right);
                split_indices.push(*feature);
                split_conditions.push(*threshold);
                base_weights.push(0.0f32);
            }
            TestNode::Leaf(value) => {
                left_children.push(-1);
                right_children.push(-1);
                split_indices.push(0);
                split_conditions.push(*value);
                base_weights.push(*value);
            }
        }
    }
    json!({
        "tree_param": {
            "num_nodes": nodes.len().to_string(),
            "size_leaf_vector": "1",
            "num_feature": "9",
            "num_deleted": "0",
        },
        "id": 0,
        "loss_changes": vec![0.0; nodes.len()],
        "sum_hessian": vec![1.0; nodes.len()],
        "base_weights": base_weights,
        "left_children": left_children,
        "right_children": right_children,
        "parents": vec![2147483647; nodes.len()],
        "split_indices": split_indices,
        "split_conditions": split_conditions,
        "split_type": vec![0; nodes.len()],
        "default_left": vec![0; nodes.len()],
        "categories": [],
        "categories_nodes": [],
        "categories_segments": [],
        "categories_sizes": [],
    })
}

/// A two-tree regressor with base score 120:
///
/// - tree 0: `Energy < 0.5` ? -2.0 : 3.0
/// - tree 1: `AudioLoudness < -10` ? -1.0 : (`TrackDurationMs < 200000` ? 0.5 : 1.5)
///
/// The example payload scores 124.5.
pub(crate) fn model_json() -> Value {
    let trees = vec![
        tree_json(&[split(8, 0.5, 1, 2), leaf(-2.0), leaf(3.0)]),
        tree_json(&[
            split(1, -10.0, 1, 2),
            leaf(-1.0),
            split(7, 200000.0, 3, 4),
            leaf(0.5),
            leaf(1.5),
        ]),
    ];
    json!({
        "version": [2, 0, 3],
        "learner": {
            "attributes": {},
            "feature_names": [],
            "feature_types": [],
            "gradient_booster": {
                "name": "gbtree",
                "model": {
                    "gbtree_model_param": {"num_parallel_tree": "1", "num_trees": "2"},
                    "iteration_indptr": [0, 1, 2],
                    "tree_info": [0, 0],
                    "trees": trees,
                },
            },
            "learner_model_param": {
                "base_score": "1.2E2",
                "boost_from_average": "1",
                "num_class": "0",
                "num_feature": "9",
                "num_target": "1",
            },
            "objective": {
                "name": "reg:squarederror",
                "reg_loss_param": {"scale_pos_weight": "1"},
            },
        },
    })
}

pub(crate) fn write_model(dir: &Path, doc: &Value) -> PathBuf {
    let path = dir.join("model.json");
    std::fs::write(&path, serde_json::to_vec(doc).unwrap()).unwrap();
    path
}

/// What [`model_json`] describes once loaded from `model.json`.
pub(crate) fn model_info() -> super::ModelInfo {
    super::ModelInfo {
        path: "model.json".to_string(),
        format: "xgboost-json".to_string(),
        version: Some("2.0.3".to_string()),
        booster: "gbtree".to_string(),
        objective: "reg:squarederror".to_string(),
        n_trees: 2,
        trees_in_artifact: 2,
        best_iteration: None,
        base_score: 120.0,
        num_feature: 9,
        feature_names: vec![],
    }
}
