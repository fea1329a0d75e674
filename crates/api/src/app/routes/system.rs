use axum::{
    Json,
    extract::{Extension, State},
    http::StatusCode,
    response::Response,
};

use hrms_auth::RouteTable;

use crate::app::{AppState, dto::WhoAmIResponse, errors};
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /api/whoami
pub async fn whoami(Extension(ctx): Extension<PrincipalContext>) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse {
        capabilities: ctx.principal().capabilities(),
        principal: ctx.principal().clone(),
        session: ctx.session().clone(),
    })
}

/// GET /api/routes - the classification table shared by edge gate and client guard
pub async fn route_table(State(state): State<AppState>) -> Json<RouteTable> {
    Json(state.routes.as_ref().clone())
}

pub async fn not_found() -> Response {
    errors::json_error(StatusCode::NOT_FOUND, "not_found", "no such endpoint")
}
