//! XGBoost JSON model loader.
//!
//! Parses the document written by `Booster.save_model("model.json")` and
//! converts it into a [`Forest`]. Only the parts needed for single-output
//! tree prediction are read; everything else in the document is ignored.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::Path;

use super::forest::{Forest, Link, Node, Tree};
use super::{ModelInfo, ModelLoadError};
use crate::features::{FEATURE_ORDER, N_FEATURES};

// =============================================================================
// Custom deserializers for XGBoost-specific formats
// =============================================================================

/// `base_score` shows up as a number, a string ("5E-1"), a bracketed string
/// ("[5E-1]") or an array depending on the XGBoost version.
fn deserialize_base_score<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    let mut cur = Value::deserialize(deserializer)?;
    loop {
        match cur {
            Value::Number(n) => {
                return n
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| SerdeError::custom("invalid base_score number"));
            }
            Value::String(s) => {
                let t = s.trim();
                let inner = t
                    .strip_prefix('[')
                    .and_then(|t| t.strip_suffix(']'))
                    .unwrap_or(t);
                return inner.trim().parse::<f32>().map_err(|_| {
                    SerdeError::custom(format!("cannot parse base_score from string: {}", s))
                });
            }
            Value::Array(arr) => match arr.into_iter().next() {
                Some(first) => cur = first,
                None => return Err(SerdeError::custom("empty base_score array")),
            },
            _ => {
                return Err(SerdeError::custom(
                    "base_score must be number, string, or array",
                ))
            }
        }
    }
}

/// Integer params are stored as strings ("7") in the JSON format.
fn deserialize_stringified<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| SerdeError::custom(format!("expected an integer, got {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| SerdeError::custom(format!("expected an integer, got {:?}", s))),
        other => Err(SerdeError::custom(format!(
            "expected an integer, got {}",
            other
        ))),
    }
}

/// `default_left` is written as 0/1 by most versions and as booleans by some.
fn deserialize_flags<'de, D>(deserializer: D) -> Result<Vec<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    let values = Vec::<Value>::deserialize(deserializer)?;
    values
        .into_iter()
        .map(|v| match v {
            Value::Bool(b) => Ok(b),
            Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
            other => Err(SerdeError::custom(format!("invalid flag value: {}", other))),
        })
        .collect()
}

fn deserialize_optional_stringified<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        other => deserialize_stringified(other)
            .map(Some)
            .map_err(SerdeError::custom),
    }
}

fn default_one() -> i64 {
    1
}

// =============================================================================
// Document structure
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TreeParam {
    #[serde(deserialize_with = "deserialize_stringified")]
    pub num_nodes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XgbTree {
    pub tree_param: TreeParam,
    pub left_children: Vec<i32>,
    pub right_children: Vec<i32>,
    pub split_indices: Vec<i32>,
    pub split_conditions: Vec<f32>,
    #[serde(deserialize_with = "deserialize_flags")]
    pub default_left: Vec<bool>,
    #[serde(default)]
    pub split_type: Vec<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelTrees {
    #[serde(default)]
    pub gbtree_model_param: GbTreeModelParam,
    pub trees: Vec<XgbTree>,
    #[serde(default)]
    pub tree_info: Vec<i32>,
    /// Tree offsets per boosting round; absent before XGBoost 1.7.
    #[serde(default)]
    pub iteration_indptr: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GbTreeModelParam {
    #[serde(deserialize_with = "deserialize_stringified", default = "default_one")]
    pub num_parallel_tree: i64,
}

impl Default for GbTreeModelParam {
    fn default() -> Self {
        GbTreeModelParam {
            num_parallel_tree: 1,
        }
    }
}

impl ModelTrees {
    /// Number of leading trees that make up the first `rounds` boosting rounds.
    fn trees_for_rounds(&self, rounds: usize) -> usize {
        let by_indptr = self
            .iteration_indptr
            .get(rounds)
            .and_then(|end| usize::try_from(*end).ok());
        let n = by_indptr.unwrap_or_else(|| {
            rounds.saturating_mul(self.gbtree_model_param.num_parallel_tree.max(1) as usize)
        });
        n.min(self.trees.len())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GbTreeDefinition {
    pub model: ModelTrees,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum GradientBooster {
    Gbtree {
        model: ModelTrees,
    },
    Gblinear {},
    Dart {
        gbtree: GbTreeDefinition,
        weight_drop: Vec<f32>,
    },
}

impl GradientBooster {
    fn name(&self) -> &'static str {
        match self {
            GradientBooster::Gbtree { .. } => "gbtree",
            GradientBooster::Gblinear {} => "gblinear",
            GradientBooster::Dart { .. } => "dart",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObjectiveDef {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LearnerModelParam {
    #[serde(deserialize_with = "deserialize_base_score")]
    pub base_score: f32,
    #[serde(deserialize_with = "deserialize_stringified", default)]
    pub num_feature: i64,
    #[serde(deserialize_with = "deserialize_stringified", default)]
    pub num_class: i64,
    #[serde(deserialize_with = "deserialize_stringified", default = "default_one")]
    pub num_target: i64,
}

/// Free-form string attributes; early stopping records `best_iteration` here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LearnerAttributes {
    #[serde(deserialize_with = "deserialize_optional_stringified", default)]
    pub best_iteration: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Learner {
    #[serde(default)]
    pub attributes: LearnerAttributes,
    #[serde(default)]
    pub feature_names: Vec<String>,
    pub gradient_booster: GradientBooster,
    pub objective: ObjectiveDef,
    pub learner_model_param: LearnerModelParam,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XgbModel {
    #[serde(default)]
    pub version: Vec<u32>,
    pub learner: Learner,
}

impl XgbModel {
    pub fn from_file(path: &Path) -> Result<Self, ModelLoadError> {
        let file = std::fs::File::open(path).map_err(|source| ModelLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(|source| {
            ModelLoadError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Validate the document against the feature schema and build the forest.
    pub fn to_forest(&self, path: &Path) -> Result<Forest, ModelLoadError> {
        let learner = &self.learner;
        let params = &learner.learner_model_param;

        let (model_trees, tree_weights) = match &learner.gradient_booster {
            GradientBooster::Gbtree { model } => (model, None),
            GradientBooster::Dart {
                gbtree,
                weight_drop,
            } => (&gbtree.model, Some(weight_drop)),
            GradientBooster::Gblinear {} => {
                return Err(ModelLoadError::UnsupportedBooster("gblinear".to_string()))
            }
        };

        if params.num_class > 1 || params.num_target > 1 {
            return Err(ModelLoadError::MultiOutput {
                num_class: params.num_class,
                num_target: params.num_target,
            });
        }

        let link = Link::for_objective(&learner.objective.name)
            .ok_or_else(|| ModelLoadError::UnsupportedObjective(learner.objective.name.clone()))?;

        if params.num_feature > 0 && params.num_feature as usize != N_FEATURES {
            return Err(ModelLoadError::FeatureCountMismatch {
                expected: N_FEATURES,
                found: params.num_feature as usize,
            });
        }

        if !learner.feature_names.is_empty()
            && learner.feature_names.iter().map(String::as_str).ne(FEATURE_ORDER)
        {
            return Err(ModelLoadError::FeatureNamesMismatch {
                expected: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
                found: learner.feature_names.clone(),
            });
        }

        if let Some(weights) = tree_weights {
            if weights.len() != model_trees.trees.len() {
                return Err(ModelLoadError::MalformedTree {
                    tree: 0,
                    reason: format!(
                        "dart weight_drop has {} entries for {} trees",
                        weights.len(),
                        model_trees.trees.len()
                    ),
                });
            }
        }

        // Predictions stop at the best round, as the booster itself does.
        let best_iteration = learner
            .attributes
            .best_iteration
            .and_then(|b| usize::try_from(b).ok());
        let n_used = match best_iteration {
            Some(best) => model_trees.trees_for_rounds(best.saturating_add(1)),
            None => model_trees.trees.len(),
        };

        let trees = model_trees.trees[..n_used]
            .iter()
            .enumerate()
            .map(|(idx, tree)| convert_tree(tree, idx))
            .collect::<Result<Vec<_>, _>>()?;
        let tree_weights = tree_weights.map(|w| w[..n_used].to_vec());

        let info = ModelInfo {
            path: path.display().to_string(),
            format: "xgboost-json".to_string(),
            version: (!self.version.is_empty()).then(|| {
                self.version
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(".")
            }),
            booster: learner.gradient_booster.name().to_string(),
            objective: learner.objective.name.clone(),
            n_trees: trees.len(),
            trees_in_artifact: model_trees.trees.len(),
            best_iteration,
            base_score: params.base_score,
            num_feature: params.num_feature.max(0) as usize,
            feature_names: learner.feature_names.clone(),
        };

        Ok(Forest::new(
            trees,
            tree_weights,
            params.base_score,
            link,
            info,
        ))
    }
}

/// Convert a single XGBoost tree, checking that every node is well formed.
///
/// Children must come after their parent in the node array, which rules out
/// cycles during traversal.
fn convert_tree(xgb_tree: &XgbTree, tree_idx: usize) -> Result<Tree, ModelLoadError> {
    let num_nodes = xgb_tree.tree_param.num_nodes.max(0) as usize;
    if num_nodes == 0 {
        return Err(ModelLoadError::EmptyTree(tree_idx));
    }

    let lengths = [
        ("left_children", xgb_tree.left_children.len()),
        ("right_children", xgb_tree.right_children.len()),
        ("split_indices", xgb_tree.split_indices.len()),
        ("split_conditions", xgb_tree.split_conditions.len()),
        ("default_left", xgb_tree.default_left.len()),
    ];
    if let Some((name, len)) = lengths.iter().find(|(_, len)| *len != num_nodes) {
        return Err(ModelLoadError::MalformedTree {
            tree: tree_idx,
            reason: format!("{} has {} entries, expected {}", name, len, num_nodes),
        });
    }

    let check_child = |node: usize, child: i32| -> Result<u32, ModelLoadError> {
        if child <= node as i32 || child as usize >= num_nodes {
            return Err(ModelLoadError::InvalidNodeIndex {
                tree: tree_idx,
                node,
                child,
                num_nodes,
            });
        }
        Ok(child as u32)
    };

    let mut nodes = Vec::with_capacity(num_nodes);
    for node_idx in 0..num_nodes {
        let left_child = xgb_tree.left_children[node_idx];
        if left_child == -1 {
            // Leaf values live in split_conditions.
            nodes.push(Node::Leaf(xgb_tree.split_conditions[node_idx]));
            continue;
        }

        if xgb_tree.split_type.get(node_idx).copied().unwrap_or(0) != 0 {
            return Err(ModelLoadError::CategoricalSplit {
                tree: tree_idx,
                node: node_idx,
            });
        }

        let feature = xgb_tree.split_indices[node_idx];
        if feature < 0 || feature as usize >= N_FEATURES {
            return Err(ModelLoadError::FeatureOutOfRange {
                tree: tree_idx,
                node: node_idx,
                feature: feature as i64,
            });
        }

        nodes.push(Node::Split {
            feature: feature as u32,
            threshold: xgb_tree.split_conditions[node_idx],
            default_left: xgb_tree.default_left[node_idx],
            left: check_child(node_idx, left_child)?,
            right: check_child(node_idx, xgb_tree.right_children[node_idx])?,
        });
    }

    Ok(Tree::new(nodes))
}
