//! RBAC audit endpoints for authorization debugging.
//!
//! Answer "why was this denied?" without reading the matrix source.

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use hrms_auth::{Capability, PermissionSet, RbacRegistry, explain_authorization};

use crate::app::{AppState, dto::ExplainQuery, errors};
use crate::authz;
use crate::context::PrincipalContext;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/matrix", get(matrix))
        .route("/explain", get(explain))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/rbac/matrix - full role/capability matrix (settings managers only)
pub async fn matrix(Extension(ctx): Extension<PrincipalContext>) -> Response {
    if let Err(e) = authz::require(&ctx, Capability::CanManageSettings) {
        return errors::auth_error_to_response(e);
    }

    let registry = RbacRegistry::build();
    (
        StatusCode::OK,
        Json(json!({
            "matrix": PermissionSet::matrix(),
            "roles": registry.roles,
            "capabilities": registry.capabilities,
        })),
    )
        .into_response()
}

/// GET /api/rbac/explain?capability=X - explain the caller's own decision
pub async fn explain(Extension(ctx): Extension<PrincipalContext>, Query(query): Query<ExplainQuery>) -> Response {
    let capability: Capability = match query.capability.parse() {
        Ok(c) => c,
        Err(e) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_capability", e.to_string());
        }
    };

    (StatusCode::OK, Json(explain_authorization(ctx.principal(), capability))).into_response()
}
