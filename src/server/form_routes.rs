use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Form, Router,
};
use tracing::debug;

use super::metrics::record_prediction;
use super::pages::{render_predict_page, FormOutcome};
use super::state::{ServerState, SharedPredictionService};
use crate::features::FeatureVector;
use crate::predictor::{ScoreError, Surface};

async fn get_predict_form() -> Html<String> {
    Html(render_predict_page(None, &FormOutcome::Blank))
}

fn form_response(
    status: StatusCode,
    fields: Option<&[(String, String)]>,
    outcome: FormOutcome,
) -> Response {
    (status, Html(render_predict_page(fields, &outcome))).into_response()
}

async fn post_predict_form(
    State(predictor): State<SharedPredictionService>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Response {
    let Form(fields) = match form {
        Ok(form) => form,
        Err(rejection) => {
            debug!("Undecodable form submission: {}", rejection.body_text());
            record_prediction(Surface::Form, "invalid", None);
            return form_response(
                StatusCode::BAD_REQUEST,
                None,
                FormOutcome::Error {
                    kind: "BadRequest".to_string(),
                    message: rejection.body_text(),
                },
            );
        }
    };

    let features = match FeatureVector::from_form_fields(&fields) {
        Ok(features) => features,
        Err(err) => {
            debug!("Rejected form submission: {}", err);
            record_prediction(Surface::Form, "invalid", None);
            return form_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                Some(fields.as_slice()),
                FormOutcome::Error {
                    kind: "ValidationError".to_string(),
                    message: err.to_string(),
                },
            );
        }
    };

    match predictor.score_form(*features.values()) {
        Ok(prediction) => form_response(
            StatusCode::OK,
            Some(fields.as_slice()),
            FormOutcome::Prediction(prediction),
        ),
        Err(err) => {
            let status = match err {
                ScoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ScoreError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            form_response(
                status,
                Some(fields.as_slice()),
                FormOutcome::Error {
                    kind: err.kind().to_string(),
                    message: err.to_string(),
                },
            )
        }
    }
}

pub fn make_form_routes() -> Router<ServerState> {
    Router::new().route("/predict", get(get_predict_form).post(post_predict_form))
}
