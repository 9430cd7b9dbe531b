//! Prediction service shared by the JSON API and the HTML form.
//!
//! Both surfaces funnel into [`PredictionService::score_vector`], so vector
//! construction and the model call live in exactly one place.

use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

use crate::features::{FeatureVector, UnknownFields, ValidationError, N_FEATURES};
use crate::model::{ModelInfo, PredictionError, Scorer};
use crate::server::metrics::record_prediction;

#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

impl ScoreError {
    /// Error kind reported to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoreError::Validation(_) => "ValidationError",
            ScoreError::Prediction(_) => "PredictionError",
        }
    }
}

/// Which presentation surface a request came through; used for metric labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    Json,
    Form,
}

impl Surface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Surface::Json => "json",
            Surface::Form => "form",
        }
    }
}

#[derive(Clone)]
pub struct PredictionService {
    scorer: Arc<dyn Scorer>,
}

impl PredictionService {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        PredictionService { scorer }
    }

    pub fn model_info(&self) -> ModelInfo {
        self.scorer.describe()
    }

    /// Score a decoded JSON object. The model is not called unless every
    /// schema field is present and numeric.
    pub fn score_json(
        &self,
        payload: &Map<String, Value>,
        unknown: UnknownFields,
    ) -> Result<f64, ScoreError> {
        let features = match FeatureVector::from_json_map(payload, unknown) {
            Ok(features) => features,
            Err(err) => {
                debug!("Rejected JSON payload: {}", err);
                record_prediction(Surface::Json, "invalid", None);
                return Err(err.into());
            }
        };
        Ok(self.score_vector(Surface::Json, &features)?)
    }

    /// Score form values already coerced to floats, in schema order.
    pub fn score_form(&self, values: [f64; N_FEATURES]) -> Result<f64, ScoreError> {
        let features = match FeatureVector::from_values(values) {
            Ok(features) => features,
            Err(err) => {
                debug!("Rejected form values: {}", err);
                record_prediction(Surface::Form, "invalid", None);
                return Err(err.into());
            }
        };
        Ok(self.score_vector(Surface::Form, &features)?)
    }

    pub fn score_vector(
        &self,
        surface: Surface,
        features: &FeatureVector,
    ) -> Result<f64, PredictionError> {
        let start = Instant::now();
        let result = self.scorer.predict(features);
        let elapsed = start.elapsed();

        match &result {
            Ok(prediction) => {
                debug!(
                    "Scored {} request in {}us: {}",
                    surface.as_str(),
                    elapsed.as_micros(),
                    prediction
                );
                record_prediction(surface, "ok", Some(elapsed));
            }
            Err(err) => {
                error!(
                    "Model prediction failed ({} surface): {:?} for input {:?}",
                    surface.as_str(),
                    err,
                    features
                );
                record_prediction(surface, "error", Some(elapsed));
            }
        }
        result
    }
}
