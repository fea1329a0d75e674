use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use hrms_auth::gate::{self, GateDecision};
use hrms_auth::{AuthError, CredentialFault, SessionFault};
use hrms_infra::session::{SessionArtifact, find_session_cookie};

use crate::app::{AppState, errors};
use crate::context::PrincipalContext;

/// Coarse pre-handler filter for page navigations.
///
/// Only checks that a session cookie is present; no verification, no IO.
pub async fn edge_gate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let has_credential = session_cookie(req.headers()).is_some();

    match gate::decide(&state.routes, &path, has_credential) {
        GateDecision::RedirectToSignIn { location } => {
            tracing::debug!(%path, "no credential; redirecting to sign-in");
            Redirect::temporary(&location).into_response()
        }
        decision => {
            tracing::trace!(%path, ?decision, "edge gate");
            next.run(req).await
        }
    }
}

/// Strong check for `/api/*`: verify the session, resolve the principal and
/// attach a [`PrincipalContext`].
pub async fn session_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let artifact = match session_artifact(req.headers()) {
        Ok(artifact) => artifact,
        Err(e) => return errors::auth_error_to_response(e),
    };

    match state.backend.authenticate_session(&artifact, Utc::now()).await {
        Ok((session, principal)) => {
            req.extensions_mut().insert(PrincipalContext::new(principal, session));
            next.run(req).await
        }
        Err(e) => errors::auth_error_to_response(e),
    }
}

/// Session cookie value, if any.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(find_session_cookie)
        .filter(|v| !v.is_empty())
}

/// Session artifact from the cookie, or from `Authorization: Bearer` for
/// non-browser callers.
pub fn session_artifact(headers: &HeaderMap) -> Result<SessionArtifact, AuthError> {
    if let Some(value) = session_cookie(headers) {
        return Ok(SessionArtifact::from_cookie_value(value));
    }
    match extract_bearer(headers) {
        Ok(token) => Ok(SessionArtifact::from_cookie_value(token)),
        Err(_) => Err(AuthError::SessionInvalid(SessionFault::Missing)),
    }
}

pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::CredentialInvalid(CredentialFault::Missing))?;

    let header = header
        .to_str()
        .map_err(|_| AuthError::CredentialInvalid(CredentialFault::Malformed))?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::CredentialInvalid(CredentialFault::Malformed))?;

    let token = header.trim();
    if token.is_empty() {
        return Err(AuthError::CredentialInvalid(CredentialFault::Missing));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(
            extract_bearer(&headers),
            Err(AuthError::CredentialInvalid(CredentialFault::Missing))
        );

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(
            extract_bearer(&headers),
            Err(AuthError::CredentialInvalid(CredentialFault::Malformed))
        );

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer  tok "));
        assert_eq!(extract_bearer(&headers), Ok("tok"));
    }

    #[test]
    fn cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=from-cookie"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(session_artifact(&headers).unwrap().expose(), "from-cookie");
    }

    #[test]
    fn empty_session_cookie_counts_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session="));
        assert_eq!(session_cookie(&headers), None);
        assert_eq!(
            session_artifact(&headers),
            Err(AuthError::SessionInvalid(SessionFault::Missing))
        );
    }
}
