//! Server-side sessions: signed, time-bounded, revocable artifacts.

mod cookie;
mod manager;
mod revocation;

pub use cookie::{CookiePolicy, SESSION_COOKIE_NAME, find_session_cookie};
pub use manager::{IssuedSession, SessionClaims, SessionConfig, SessionManager};
pub use revocation::{InMemoryRevocationStore, RevocationError, RevocationStore};

use hrms_auth::{AuthError, SessionFault};
use thiserror::Error;

use crate::identity::VerificationError;

/// Validity window of a session artifact (5 days).
pub const SESSION_TTL_SECS: i64 = 5 * 24 * 60 * 60;

/// Opaque signed session value.
///
/// `Debug` and `Display` never print the value; use [`SessionArtifact::expose`]
/// only where it has to leave the process (the cookie header).
#[derive(Clone, PartialEq, Eq)]
pub struct SessionArtifact(String);

impl SessionArtifact {
    pub fn from_cookie_value(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for SessionArtifact {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SessionArtifact(<redacted>)")
    }
}

impl core::fmt::Display for SessionArtifact {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("<redacted>")
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("credential rejected: {0}")]
    InvalidCredential(VerificationError),

    #[error("sign-in is too old to start a session")]
    StaleSignIn,

    #[error("no session presented")]
    Missing,

    #[error("malformed session")]
    Malformed,

    #[error("session signature does not verify")]
    BadSignature,

    #[error("session has expired")]
    Expired,

    #[error("session has been revoked")]
    Revoked,

    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("failed to sign session: {0}")]
    Signing(String),
}

impl From<VerificationError> for SessionError {
    fn from(value: VerificationError) -> Self {
        match value {
            VerificationError::ProviderUnavailable(msg) => SessionError::ProviderUnavailable(msg),
            other => SessionError::InvalidCredential(other),
        }
    }
}

impl From<RevocationError> for SessionError {
    fn from(value: RevocationError) -> Self {
        match value {
            RevocationError::Unavailable(msg) => SessionError::ProviderUnavailable(msg),
        }
    }
}

impl From<SessionError> for AuthError {
    fn from(value: SessionError) -> Self {
        let fault = match value {
            SessionError::InvalidCredential(e) => return e.into(),
            SessionError::StaleSignIn => {
                return AuthError::CredentialInvalid(hrms_auth::CredentialFault::StaleSignIn);
            }
            SessionError::ProviderUnavailable(msg) | SessionError::Signing(msg) => {
                return AuthError::ProviderUnavailable(msg);
            }
            SessionError::Missing => SessionFault::Missing,
            SessionError::Malformed => SessionFault::Malformed,
            SessionError::BadSignature => SessionFault::BadSignature,
            SessionError::Expired => SessionFault::Expired,
            SessionError::Revoked => SessionFault::Revoked,
        };
        AuthError::SessionInvalid(fault)
    }
}
