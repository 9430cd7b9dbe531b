//! The model's input contract: nine named numeric features in a fixed order.

use serde::ser::{Serialize, SerializeMap, Serializer};

pub const N_FEATURES: usize = 9;

/// Canonical feature order. Must match the column order the artifact was
/// trained with; a mismatch silently produces wrong predictions.
pub const FEATURE_ORDER: [&str; N_FEATURES] = [
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

/// Position of `name` in [`FEATURE_ORDER`].
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_ORDER.iter().position(|f| *f == name)
}

/// One request's worth of features, stored in schema order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; N_FEATURES]);

impl FeatureVector {
    /// Wraps values that are already in schema order. No finiteness check is
    /// performed here; see [`FeatureVector::from_values`] for the validated path.
    pub fn new(values: [f64; N_FEATURES]) -> Self {
        FeatureVector(values)
    }

    pub fn values(&self) -> &[f64; N_FEATURES] {
        &self.0
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|idx| self.0[idx])
    }

    /// (name, value) pairs in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_ORDER.iter().copied().zip(self.0.iter().copied())
    }

    /// The example payload published in the API docs.
    pub fn example() -> Self {
        FeatureVector([0.42, -7.3, 0.61, 0.35, 0.18, 0.05, 0.72, 210000.0, 0.8])
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(N_FEATURES))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}
