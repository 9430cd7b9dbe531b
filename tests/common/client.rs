//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{Map, Value};
use std::time::Duration;

/// HTTP test client
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// The documented example payload as a JSON object
    pub fn example_payload() -> Map<String, Value> {
        EXAMPLE_FEATURES
            .iter()
            .map(|(name, value)| (name.to_string(), Value::from(*value)))
            .collect()
    }

    /// The documented example payload as form pairs, formatted the way a browser would submit them
    pub fn example_form() -> Vec<(String, String)> {
        EXAMPLE_FEATURES
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    // ========================================================================
    // Service Endpoints
    // ========================================================================

    /// GET /
    pub async fn home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    /// GET /health
    pub async fn health(&self) -> Response {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .expect("Health request failed")
    }

    /// GET /debug
    pub async fn debug(&self) -> Response {
        self.client
            .get(format!("{}/debug", self.base_url))
            .send()
            .await
            .expect("Debug request failed")
    }

    /// GET /docs
    pub async fn docs(&self) -> Response {
        self.client
            .get(format!("{}/docs", self.base_url))
            .send()
            .await
            .expect("Docs request failed")
    }

    /// GET arbitrary path
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request failed")
    }

    // ========================================================================
    // JSON Prediction
    // ========================================================================

    /// POST /predict_json
    pub async fn predict_json(&self, payload: &Value) -> Response {
        self.client
            .post(format!("{}/predict_json", self.base_url))
            .json(payload)
            .send()
            .await
            .expect("Predict JSON request failed")
    }

    /// POST /predict_json with a raw body and content type
    pub async fn predict_json_raw(&self, body: &str, content_type: &str) -> Response {
        self.client
            .post(format!("{}/predict_json", self.base_url))
            .header("content-type", content_type)
            .body(body.to_string())
            .send()
            .await
            .expect("Predict JSON request failed")
    }

    // ========================================================================
    // HTML Form
    // ========================================================================

    /// GET /predict
    pub async fn get_form(&self) -> Response {
        self.client
            .get(format!("{}/predict", self.base_url))
            .send()
            .await
            .expect("Form request failed")
    }

    /// POST /predict (form-encoded)
    pub async fn post_form(&self, fields: &[(String, String)]) -> Response {
        self.client
            .post(format!("{}/predict", self.base_url))
            .form(fields)
            .send()
            .await
            .expect("Form submit failed")
    }
}
