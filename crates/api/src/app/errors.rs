use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use hrms_auth::AuthError;

pub fn auth_error_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::CredentialInvalid(_) | AuthError::SessionInvalid(_) => StatusCode::UNAUTHORIZED,
        AuthError::PrincipalNotFound => StatusCode::NOT_FOUND,
        AuthError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        AuthError::ProviderUnavailable(_) | AuthError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub fn auth_error_to_response(err: AuthError) -> Response {
    let status = auth_error_status(&err);
    if err.is_transient() {
        tracing::warn!(error = %err, "auth dependency unavailable");
    } else {
        tracing::debug!(error = %err, "auth request rejected");
    }

    (
        status,
        axum::Json(json!({
            "error": err.code(),
            "message": err.user_message(),
            "retryable": err.is_transient(),
        })),
    )
        .into_response()
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
            "retryable": false,
        })),
    )
        .into_response()
}

/// Attach a `Set-Cookie` header to an already built response.
pub fn with_cookie(mut response: Response, cookie: &str) -> Response {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::error!("unencodable Set-Cookie value: {e}"),
    }
    response
}
