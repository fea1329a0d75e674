//! Authentication / authorization failure taxonomy.
//!
//! Every enforcement point (HTTP handlers, client context, route guard)
//! speaks this one vocabulary so "not signed in", "forbidden" and "backend
//! down" never get conflated.

use serde::Serialize;
use thiserror::Error;

use crate::Capability;

/// Why a credential from the identity provider was rejected.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialFault {
    Missing,
    Malformed,
    Expired,
    NotYetValid,
    BadSignature,
    UnknownSigningKey,
    /// Signed by a trusted key but for another issuer or audience.
    UntrustedIssuer,
    /// Credential is valid but too old to mint a new session from.
    StaleSignIn,
    /// Refused by a remote verifier that did not say why.
    Rejected,
}

/// Why a session artifact was rejected.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionFault {
    Missing,
    Malformed,
    BadSignature,
    Expired,
    Revoked,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("credential rejected: {0:?}")]
    CredentialInvalid(CredentialFault),

    #[error("session rejected: {0:?}")]
    SessionInvalid(SessionFault),

    #[error("account not recognized")]
    PrincipalNotFound,

    #[error("forbidden: missing capability '{0}'")]
    PermissionDenied(Capability),

    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("document store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AuthError {
    /// Network-level failure worth retrying; never an auth decision.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::ProviderUnavailable(_) | AuthError::StoreUnavailable(_))
    }

    /// The user has to (re-)authenticate.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, AuthError::CredentialInvalid(_) | AuthError::SessionInvalid(_))
    }

    /// Stable machine-readable code for JSON bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::CredentialInvalid(_) => "credential_invalid",
            AuthError::SessionInvalid(_) => "session_invalid",
            AuthError::PrincipalNotFound => "principal_not_found",
            AuthError::PermissionDenied(_) => "permission_denied",
            AuthError::ProviderUnavailable(_) => "provider_unavailable",
            AuthError::StoreUnavailable(_) => "store_unavailable",
        }
    }

    /// Message safe to show to an end user.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::CredentialInvalid(_) | AuthError::SessionInvalid(_) => {
                "Please sign in again.".to_string()
            }
            AuthError::PrincipalNotFound => "Account not recognized.".to_string(),
            AuthError::PermissionDenied(cap) => {
                format!("You do not have access to this ({cap}).")
            }
            AuthError::ProviderUnavailable(_) | AuthError::StoreUnavailable(_) => {
                "Service temporarily unavailable, please retry.".to_string()
            }
        }
    }
}
