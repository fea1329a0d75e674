use axum::{Router, routing::get};

use crate::app::AppState;

pub mod auth;
pub mod pages;
pub mod rbac;
pub mod system;

/// Router for every session-authenticated endpoint.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/routes", get(system::route_table))
        .nest("/rbac", rbac::router())
        .fallback(system::not_found)
}
