use super::RequestsLoggingLevel;
use crate::features::UnknownFields;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// Policy for JSON keys outside the feature schema on `/predict_json`.
    pub unknown_fields: UnknownFields,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 8000,
            unknown_fields: UnknownFields::Reject,
        }
    }
}
