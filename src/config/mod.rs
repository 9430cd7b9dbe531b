mod file_config;

pub use file_config::FileConfig;

use crate::features::UnknownFields;
use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// Artifact looked up in the working directory when no path is configured.
pub const DEFAULT_MODEL_PATH: &str = "XGBoost.json";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub model_path: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: Option<u16>,
    pub logging_level: RequestsLoggingLevel,
    pub allow_unknown_fields: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub port: u16,
    pub metrics_port: Option<u16>,
    pub logging_level: RequestsLoggingLevel,
    pub unknown_fields: UnknownFields,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let model_path = file
            .model_path
            .map(PathBuf::from)
            .or_else(|| cli.model_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        if model_path.as_os_str().is_empty() {
            bail!("model_path must not be empty");
        }
        if model_path.is_dir() {
            bail!("model_path is a directory: {:?}", model_path);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.or(cli.metrics_port);
        if metrics_port == Some(port) {
            bail!("metrics_port must differ from port ({})", port);
        }

        let logging_level = match file.logging_level {
            Some(s) => match parse_logging_level(&s) {
                Some(level) => level,
                None => bail!("Invalid logging_level in config file: {:?}", s),
            },
            None => cli.logging_level.clone(),
        };

        let unknown_fields = if file
            .allow_unknown_fields
            .unwrap_or(cli.allow_unknown_fields)
        {
            UnknownFields::Ignore
        } else {
            UnknownFields::Reject
        };

        Ok(Self {
            model_path,
            port,
            metrics_port,
            logging_level,
            unknown_fields,
        })
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            unknown_fields: self.unknown_fields,
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
