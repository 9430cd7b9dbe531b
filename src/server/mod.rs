pub mod config;
pub mod error;
mod form_routes;
mod http_layers;
pub mod metrics;
pub mod pages;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
