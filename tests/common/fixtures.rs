//! Test fixture creation for the model artifact
//!
//! The fixture is a tiny two-tree XGBoost regressor in the JSON layout
//! `Booster.save_model` writes, so the real loader is exercised end to end.

use anyhow::Result;
use serde_json::{json, Value};
use std::path::PathBuf;
use tempfile::TempDir;

const FEATURE_NAMES: [&str; 9] = [
    "RhythmScore",
    "AudioLoudness",
    "VocalContent",
    "AcousticQuality",
    "InstrumentalScore",
    "LivePerformanceLikelihood",
    "MoodScore",
    "TrackDurationMs",
    "Energy",
];

/// A tree node: `Split(feature, threshold, left, right)` or `Leaf(value)`.
enum Node {
    Split(i32, f32, i32, i32),
    Leaf(f32),
}

fn tree(nodes: &[Node]) -> Value {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut indices = Vec::new();
    let mut conditions = Vec::new();
    let mut weights = Vec::new();
    for node in nodes {
        match node {
            Node::Split(feature, threshold, l, r) => {
                left.push(*l);
                right.push(*r);
                indices.push(*feature);
                conditions.push(*threshold);
                weights.push(0.0f32);
            }
            Node::Leaf(value) => {
                left.push(-1);
                right.push(-1);
                indices.push(0);
                conditions.push(*value);
                weights.push(*value);
            }
        }
    }
    let n = nodes.len();
    json!({
        "tree_param": {
            "num_nodes": n.to_string(),
            "size_leaf_vector": "1",
            "num_feature": "9",
            "num_deleted": "0",
        },
        "id": 0,
        "loss_changes": vec![0.0; n],
        "sum_hessian": vec![1.0; n],
        "base_weights": weights,
        "left_children": left,
        "right_children": right,
        "parents": vec![2147483647u32; n],
        "split_indices": indices,
        "split_conditions": conditions,
        "split_type": vec![0; n],
        "default_left": vec![0; n],
        "categories": [],
        "categories_nodes": [],
        "categories_segments": [],
        "categories_sizes": [],
    })
}

/// - tree 0: `Energy < 0.5` ? -2.0 : 3.0
/// - tree 1: `AudioLoudness < -10` ? -1.0 : (`TrackDurationMs < 200000` ? 0.5 : 1.5)
pub fn fixture_model() -> Value {
    let trees = vec![
        tree(&[Node::Split(8, 0.5, 1, 2), Node::Leaf(-2.0), Node::Leaf(3.0)]),
        tree(&[
            Node::Split(1, -10.0, 1, 2),
            Node::Leaf(-1.0),
            Node::Split(7, 200000.0, 3, 4),
            Node::Leaf(0.5),
            Node::Leaf(1.5),
        ]),
    ];
    json!({
        "version": [2, 0, 3],
        "learner": {
            "attributes": {},
            "feature_names": FEATURE_NAMES,
            "feature_types": vec!["float"; 9],
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

/// Writes the fixture model into a fresh temp dir.
/// Returns (temp_dir, model_path)
pub fn create_test_model() -> Result<(TempDir, PathBuf)> {
    let dir = TempDir::new()?;
    let path = dir.path().join("XGBoost.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&fixture_model())?)?;
    Ok((dir, path))
}
