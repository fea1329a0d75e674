//! Session lifecycle endpoints.
//!
//! These sit outside the edge gate and authenticate in the handler.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use hrms_auth::AuthError;
use hrms_infra::session::SessionArtifact;

use crate::app::dto::{CreateSessionRequest, SuccessResponse, UserResponse, VerifySessionRequest};
use crate::app::{AppState, errors};
use crate::middleware::{extract_bearer, session_artifact, session_cookie};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", post(create_session))
        .route("/user", get(current_user))
        .route("/verify", post(verify_session))
        .route("/logout", post(logout))
        .route("/logout-all", post(logout_all))
}

/// POST /auth/session - exchange an identity-provider credential for a session cookie
pub async fn create_session(State(state): State<AppState>, Json(body): Json<CreateSessionRequest>) -> Response {
    match state.backend.sessions().issue(&body.id_token, Utc::now()).await {
        Ok(issued) => {
            let cookie = state.cookies.set_cookie(&issued.artifact);
            errors::with_cookie((StatusCode::OK, Json(SuccessResponse::OK)).into_response(), &cookie)
        }
        Err(e) => errors::auth_error_to_response(e.into()),
    }
}

/// GET /auth/user - resolve the principal behind a bearer credential
pub async fn current_user(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let credential = match extract_bearer(&headers) {
        Ok(credential) => credential,
        Err(e) => return errors::auth_error_to_response(e),
    };

    match state.backend.authenticate_credential(credential, Utc::now()).await {
        Ok(user) => (StatusCode::OK, Json(UserResponse { user })).into_response(),
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// POST /auth/verify - check a session value and return its claims
pub async fn verify_session(State(state): State<AppState>, Json(body): Json<VerifySessionRequest>) -> Response {
    let artifact = SessionArtifact::from_cookie_value(body.session_cookie);
    match state.backend.sessions().verify(&artifact, Utc::now()).await {
        Ok(claims) => (StatusCode::OK, Json(claims)).into_response(),
        Err(e) => errors::auth_error_to_response(e.into()),
    }
}

/// POST /auth/logout - revoke the current session (if any) and clear the cookie
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let clear = state.cookies.clear_cookie();

    let Some(value) = session_cookie(&headers) else {
        return errors::with_cookie(Json(SuccessResponse::OK).into_response(), &clear);
    };

    let artifact = SessionArtifact::from_cookie_value(value);
    let response = match state.backend.sessions().revoke(&artifact, Utc::now()).await {
        Ok(()) => Json(SuccessResponse::OK).into_response(),
        Err(e) => errors::auth_error_to_response(e.into()),
    };
    errors::with_cookie(response, &clear)
}

/// POST /auth/logout-all - revoke every session of the caller
pub async fn logout_all(State(state): State<AppState>, headers: HeaderMap) -> Response {
    match revoke_everywhere(&state, &headers).await {
        Ok(()) => errors::with_cookie(Json(SuccessResponse::OK).into_response(), &state.cookies.clear_cookie()),
        Err(e) => errors::auth_error_to_response(e),
    }
}

async fn revoke_everywhere(state: &AppState, headers: &HeaderMap) -> Result<(), AuthError> {
    let now = Utc::now();
    let artifact = session_artifact(headers)?;
    let claims = state.backend.sessions().verify(&artifact, now).await?;
    state.backend.sessions().revoke_all(&claims.principal_id, now).await?;
    Ok(())
}
