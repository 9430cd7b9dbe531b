use anyhow::{Context, Result};
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::error::ApiError;
use super::form_routes::make_form_routes;
use super::metrics::metrics_handler;
use super::pages::render_docs_page;
use super::{log_requests, state::*, ServerConfig};
use crate::features::{FEATURE_ORDER, N_FEATURES};
use crate::model::ModelInfo;
use crate::predictor::PredictionService;

/// Largest request body accepted on any route.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Serialize)]
struct DebugInfo {
    pub feature_order: [&'static str; N_FEATURES],
    pub n_features: usize,
    pub model: ModelInfo,
    pub version: &'static str,
    pub hash: String,
    pub uptime: String,
}

#[derive(Serialize)]
struct PredictionResponse {
    prediction: f64,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home() -> impl IntoResponse {
    Json(json!({ "message": "Hello, World" }))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn debug_info(State(state): State<ServerState>) -> impl IntoResponse {
    Json(DebugInfo {
        feature_order: FEATURE_ORDER,
        n_features: N_FEATURES,
        model: state.predictor.model_info(),
        version: env!("CARGO_PKG_VERSION"),
        hash: state.hash.clone(),
        uptime: format_uptime(state.start_time.elapsed()),
    })
}

async fn docs() -> Html<String> {
    Html(render_docs_page())
}

async fn predict_json(
    State(state): State<ServerState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        debug!("Rejected JSON body: {}", rejection.body_text());
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        ApiError::BadRequest {
            status,
            message: rejection.body_text(),
        }
    })?;

    let payload = match payload {
        Value::Object(map) => map,
        _ => return Err(ApiError::NotAnObject),
    };

    let prediction = state
        .predictor
        .score_json(&payload, state.config.unknown_fields)?;
    Ok(Json(PredictionResponse { prediction }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "NotFound", "message": "no such route" })),
    )
}

pub fn make_app(config: ServerConfig, predictor: PredictionService) -> Router {
    let state = ServerState::new(config, predictor);

    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/debug", get(debug_info))
        .route("/docs", get(docs))
        .route("/predict_json", post(predict_json))
        .merge(make_form_routes())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .with_state(state)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, initiating graceful shutdown");
}

pub async fn run_server(
    config: ServerConfig,
    predictor: PredictionService,
    metrics_port: Option<u16>,
) -> Result<()> {
    let port = config.port;
    let app = make_app(config, predictor);

    if let Some(metrics_port) = metrics_port {
        let metrics_listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", metrics_port))
            .await
            .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
        info!("Metrics available at port {}!", metrics_port);
        tokio::spawn(async move {
            if let Err(err) = axum::serve(metrics_listener, make_metrics_app()).await {
                tracing::error!("Metrics server stopped: {}", err);
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Ready to serve at port {}!", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}
