use axum::extract::FromRef;

use crate::predictor::PredictionService;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

/// The model is read-only after load, so the service is shared without a lock.
pub type SharedPredictionService = Arc<PredictionService>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub predictor: SharedPredictionService,
    pub hash: String,
}

impl ServerState {
    pub fn new(config: ServerConfig, predictor: PredictionService) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            predictor: Arc::new(predictor),
            hash: env!("GIT_HASH").to_string(),
        }
    }
}

impl FromRef<ServerState> for SharedPredictionService {
    fn from_ref(input: &ServerState) -> Self {
        input.predictor.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
