//! HTTP application wiring (Axum router + shared state).
//!
//! - `routes/`: handlers, one file per area
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent JSON error responses

use std::sync::Arc;

use axum::{Router, routing::get};
use tower::ServiceBuilder;

use hrms_auth::RouteTable;
use hrms_infra::Backend;
use hrms_infra::session::CookiePolicy;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<Backend>,
    pub routes: Arc<RouteTable>,
    pub cookies: CookiePolicy,
}

impl AppState {
    pub fn new(backend: Arc<Backend>, routes: RouteTable, cookies: CookiePolicy) -> Self {
        Self {
            backend,
            routes: Arc::new(routes),
            cookies,
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(state: AppState) -> Router {
    // `/api/*`: session verified and principal resolved before any handler.
    let api = routes::api_router().layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::session_auth,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/auth", routes::auth::router())
        .nest("/api", api)
        .fallback(routes::pages::shell)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::edge_gate,
        )))
        .with_state(state)
}
