//! Session endpoints over HTTP.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use hrms_auth::{AuthError, CredentialFault, Principal, SessionFault};

use crate::backend::AuthBackend;

/// Talks to the server's `/auth/*` endpoints.
///
/// The cookie store keeps the `session` cookie between calls, the way a
/// browser would.
#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    user: Principal,
}

impl HttpAuthBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Use a preconfigured client; it should have a cookie store.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check connectivity by hitting the health endpoint.
    pub async fn check_connectivity(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        self.client
            .get(&url)
            .send()
            .await
            .is_ok_and(|r| r.status().is_success())
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, AuthError> {
        let resp = req
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status();
        let body: ErrorBody = resp.json().await.unwrap_or(ErrorBody {
            error: String::new(),
            message: String::new(),
        });
        Err(error_from_response(status, &body))
    }
}

fn error_from_response(status: StatusCode, body: &ErrorBody) -> AuthError {
    match (status, body.error.as_str()) {
        (StatusCode::NOT_FOUND, _) => AuthError::PrincipalNotFound,
        (StatusCode::UNAUTHORIZED, "session_invalid") => AuthError::SessionInvalid(SessionFault::Revoked),
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => {
            AuthError::CredentialInvalid(CredentialFault::Rejected)
        }
        (_, "store_unavailable") => AuthError::StoreUnavailable(body.message.clone()),
        _ => AuthError::ProviderUnavailable(format!("{status}: {}", body.message)),
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn establish_session(&self, credential: &str) -> Result<(), AuthError> {
        let url = format!("{}/auth/session", self.base_url);
        self.send(self.client.post(&url).json(&json!({ "idToken": credential })))
            .await?;
        tracing::debug!("server session established");
        Ok(())
    }

    async fn fetch_principal(&self, credential: &str) -> Result<Principal, AuthError> {
        let url = format!("{}/auth/user", self.base_url);
        let resp = self.send(self.client.get(&url).bearer_auth(credential)).await?;
        let body: UserBody = resp
            .json()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(format!("invalid user payload: {e}")))?;
        Ok(body.user)
    }

    async fn end_session(&self) -> Result<(), AuthError> {
        let url = format!("{}/auth/logout", self.base_url);
        self.send(self.client.post(&url)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(error: &str) -> ErrorBody {
        ErrorBody {
            error: error.to_string(),
            message: "msg".to_string(),
        }
    }

    #[test]
    fn maps_server_errors_back_to_the_taxonomy() {
        assert_eq!(
            error_from_response(StatusCode::NOT_FOUND, &body("principal_not_found")),
            AuthError::PrincipalNotFound
        );
        assert!(error_from_response(StatusCode::UNAUTHORIZED, &body("credential_invalid")).requires_sign_in());
        assert!(error_from_response(StatusCode::UNAUTHORIZED, &body("session_invalid")).requires_sign_in());
        assert_eq!(
            error_from_response(StatusCode::SERVICE_UNAVAILABLE, &body("store_unavailable")),
            AuthError::StoreUnavailable("msg".to_string())
        );
        assert!(error_from_response(StatusCode::BAD_GATEWAY, &body("")).is_transient());
    }

    #[tokio::test]
    async fn unreachable_server_is_transient() {
        // Port 9 (discard) on localhost is not expected to run an HTTP server.
        let backend = HttpAuthBackend::new("http://127.0.0.1:9/").unwrap();
        assert_eq!(backend.base_url(), "http://127.0.0.1:9");
        let err = backend.end_session().await.unwrap_err();
        assert!(err.is_transient());
        assert!(!backend.check_connectivity().await);
    }
}
