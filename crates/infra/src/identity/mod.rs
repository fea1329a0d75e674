//! Credential verification against the external identity provider.

mod keys;
mod verifier;

pub use keys::{HttpKeyProvider, KeyProvider, KeySet, SigningKey, StaticKeyProvider};
pub use verifier::{CredentialVerifier, JwtCredentialVerifier};

use hrms_auth::{AuthError, CredentialFault};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("no credential presented")]
    Missing,

    #[error("malformed credential: {0}")]
    Malformed(String),

    #[error("credential has expired")]
    Expired,

    #[error("credential not yet valid")]
    NotYetValid,

    #[error("credential signature does not verify")]
    BadSignature,

    #[error("credential signed with unknown key '{0}'")]
    UnknownKey(String),

    #[error("credential issued for another issuer or audience")]
    UntrustedIssuer,

    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
}

impl VerificationError {
    pub fn is_transient(&self) -> bool {
        matches!(self, VerificationError::ProviderUnavailable(_))
    }
}

impl From<VerificationError> for AuthError {
    fn from(value: VerificationError) -> Self {
        let fault = match value {
            VerificationError::ProviderUnavailable(msg) => return AuthError::ProviderUnavailable(msg),
            VerificationError::Missing => CredentialFault::Missing,
            VerificationError::Malformed(_) => CredentialFault::Malformed,
            VerificationError::Expired => CredentialFault::Expired,
            VerificationError::NotYetValid => CredentialFault::NotYetValid,
            VerificationError::BadSignature => CredentialFault::BadSignature,
            VerificationError::UnknownKey(_) => CredentialFault::UnknownSigningKey,
            VerificationError::UntrustedIssuer => CredentialFault::UntrustedIssuer,
        };
        AuthError::CredentialInvalid(fault)
    }
}
