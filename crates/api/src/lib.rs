//! HTTP API: auth endpoints, edge gate, and capability-checked routes.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;

pub use app::{AppState, build_app};
pub use config::{ApiConfig, ConfigError};
