//! Error bodies for the JSON surface.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::features::{IssueKind, ValidationError};
use crate::model::PredictionError;
use crate::predictor::ScoreError;

#[derive(Debug, Serialize)]
pub struct IssueDetail {
    pub field: String,
    pub kind: IssueKind,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub detail: Vec<IssueDetail>,
}

#[derive(Debug)]
pub enum ApiError {
    /// The body could not be decoded at all.
    BadRequest { status: StatusCode, message: String },
    /// Decoded, but not an object keyed by feature name.
    NotAnObject,
    Validation(ValidationError),
    Prediction(PredictionError),
}

impl From<ScoreError> for ApiError {
    fn from(err: ScoreError) -> Self {
        match err {
            ScoreError::Validation(err) => ApiError::Validation(err),
            ScoreError::Prediction(err) => ApiError::Prediction(err),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { status, .. } => *status,
            ApiError::NotAnObject | ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorResponse {
        match self {
            ApiError::BadRequest { message, .. } => ErrorResponse {
                error: "BadRequest",
                message,
                detail: vec![],
            },
            ApiError::NotAnObject => ErrorResponse {
                error: "ValidationError",
                message: "request body must be a JSON object".to_string(),
                detail: vec![],
            },
            ApiError::Validation(err) => ErrorResponse {
                error: "ValidationError",
                message: err.to_string(),
                detail: err
                    .issues
                    .iter()
                    .map(|issue| IssueDetail {
                        field: issue.field.clone(),
                        kind: issue.kind,
                        message: issue.message(),
                    })
                    .collect(),
            },
            // Full detail was already logged by the prediction service.
            ApiError::Prediction(err) => ErrorResponse {
                error: "PredictionError",
                message: err.to_string(),
                detail: vec![],
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.body())).into_response()
    }
}
