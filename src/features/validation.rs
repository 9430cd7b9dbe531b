//! Turning untrusted request input into a [`FeatureVector`].

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

use super::schema::{feature_index, FeatureVector, FEATURE_ORDER, N_FEATURES};

/// What to do with payload keys that are not part of the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownFields {
    Ignore,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Missing,
    NotNumeric,
    NotFinite,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: String,
    pub kind: IssueKind,
}

impl FieldIssue {
    fn new(field: impl Into<String>, kind: IssueKind) -> Self {
        FieldIssue {
            field: field.into(),
            kind,
        }
    }

    pub fn message(&self) -> &'static str {
        match self.kind {
            IssueKind::Missing => "field required",
            IssueKind::NotNumeric => "value is not a valid number",
            IssueKind::NotFinite => "value must be a finite number",
            IssueKind::Unknown => "unknown field",
        }
    }
}

/// Every problem found in a payload, schema fields first (in schema order),
/// then unknown keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid feature payload: ")?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", issue.field, issue.message())?;
        }
        Ok(())
    }
}

/// Outcome of reading one schema field: a usable value or the reason it is not.
type Slot = Result<f64, IssueKind>;

fn finish(
    slots: [Slot; N_FEATURES],
    unknown: Vec<FieldIssue>,
) -> Result<FeatureVector, ValidationError> {
    let mut values = [0.0; N_FEATURES];
    let mut issues = Vec::new();
    for ((value, name), slot) in values.iter_mut().zip(FEATURE_ORDER).zip(slots) {
        match slot {
            Ok(v) => *value = v,
            Err(kind) => issues.push(FieldIssue::new(name, kind)),
        }
    }
    issues.extend(unknown);

    if issues.is_empty() {
        Ok(FeatureVector::new(values))
    } else {
        Err(ValidationError { issues })
    }
}

impl FeatureVector {
    /// Checks already-typed values, as handed over by the form surface.
    pub fn from_values(values: [f64; N_FEATURES]) -> Result<FeatureVector, ValidationError> {
        let issues: Vec<FieldIssue> = FEATURE_ORDER
            .iter()
            .zip(values.iter())
            .filter(|(_, v)| !v.is_finite())
            .map(|(name, _)| FieldIssue::new(*name, IssueKind::NotFinite))
            .collect();
        if issues.is_empty() {
            Ok(FeatureVector::new(values))
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Looks up every schema field in a decoded JSON object. Only JSON numbers
    /// count as numeric.
    pub fn from_json_map(
        payload: &Map<String, Value>,
        unknown: UnknownFields,
    ) -> Result<FeatureVector, ValidationError> {
        let slots = FEATURE_ORDER.map(|name| match payload.get(name) {
            None => Err(IssueKind::Missing),
            Some(Value::Number(n)) => match n.as_f64() {
                Some(v) if v.is_finite() => Ok(v),
                _ => Err(IssueKind::NotFinite),
            },
            Some(_) => Err(IssueKind::NotNumeric),
        });

        let mut unknown_keys = Vec::new();
        if unknown == UnknownFields::Reject {
            unknown_keys.extend(
                payload
                    .keys()
                    .filter(|k| feature_index(k).is_none())
                    .map(|k| FieldIssue::new(k.as_str(), IssueKind::Unknown)),
            );
        }

        finish(slots, unknown_keys)
    }

    /// Coerces raw `application/x-www-form-urlencoded` pairs. The first
    /// occurrence of a key wins; keys outside the schema are ignored.
    pub fn from_form_fields(fields: &[(String, String)]) -> Result<FeatureVector, ValidationError> {
        let slots = FEATURE_ORDER.map(|name| {
            let raw = fields.iter().find(|(k, _)| k == name).map(|(_, v)| v.trim());
            match raw {
                None | Some("") => Err(IssueKind::Missing),
                Some(text) => match text.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(v),
                    Ok(_) => Err(IssueKind::NotFinite),
                    Err(_) => Err(IssueKind::NotNumeric),
                },
            }
        });

        finish(slots, Vec::new())
    }
}
