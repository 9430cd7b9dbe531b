mod schema;
mod validation;

pub use schema::{feature_index, FeatureVector, FEATURE_ORDER, N_FEATURES};
pub use validation::{FieldIssue, IssueKind, UnknownFields, ValidationError};
