//! BPM Predictor Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod features;
pub mod model;
pub mod predictor;
pub mod server;

// Re-export commonly used types for convenience
pub use features::{FeatureVector, UnknownFields, ValidationError, FEATURE_ORDER};
pub use model::{load_model, ModelInfo, ModelLoadError, PredictionError, Scorer};
pub use predictor::{PredictionService, ScoreError};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
