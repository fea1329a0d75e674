use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Validation, decode, decode_header};
use serde::Deserialize;

use hrms_auth::{IdentityClaims, TokenValidationError, validate_claims};
use hrms_core::UserId;

use super::{KeyProvider, VerificationError};

/// Validates an identity-provider credential and returns its claims.
///
/// Read-only with respect to the provider: the only outbound call is the
/// key lookup.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(
        &self,
        credential: &str,
        now: DateTime<Utc>,
    ) -> Result<IdentityClaims, VerificationError>;
}

#[derive(Debug, Deserialize)]
struct CredentialPayload {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    iat: i64,
    exp: i64,
}

/// Verifies JWT credentials (ID tokens) issued by the identity provider.
pub struct JwtCredentialVerifier {
    keys: Arc<dyn KeyProvider>,
    issuer: Option<String>,
    audience: Option<String>,
    leeway: Duration,
}

impl JwtCredentialVerifier {
    pub fn new(keys: Arc<dyn KeyProvider>) -> Self {
        Self {
            keys,
            issuer: None,
            audience: None,
            leeway: Duration::seconds(30),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    fn validation(&self, algorithm: jsonwebtoken::Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        // Time checks run against the caller's `now` in `validate_claims`.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims = HashSet::from(["sub".to_string()]);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer.as_str()]);
        }
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience.as_str()]),
            None => validation.validate_aud = false,
        }
        validation
    }
}

#[async_trait]
impl CredentialVerifier for JwtCredentialVerifier {
    async fn verify(
        &self,
        credential: &str,
        now: DateTime<Utc>,
    ) -> Result<IdentityClaims, VerificationError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(VerificationError::Missing);
        }
        if credential.split('.').count() != 3 {
            return Err(VerificationError::Malformed("expected three segments".to_string()));
        }

        let header = decode_header(credential)
            .map_err(|e| VerificationError::Malformed(e.to_string()))?;

        let kid = header.kid.as_deref();
        let mut keys = self.keys.current_keys().await?;
        // A kid we have never seen usually means the provider rotated keys.
        if kid.is_some() && keys.select(kid).is_err() {
            if let Some(fresh) = self.keys.refresh().await? {
                tracing::info!(kid = kid.unwrap_or_default(), "unknown signing key, refetched key set");
                keys = fresh;
            }
        }
        let key = keys.select(kid)?;
        if header.alg != key.algorithm {
            return Err(VerificationError::BadSignature);
        }

        let data = decode::<CredentialPayload>(credential, &key.key, &self.validation(key.algorithm))
            .map_err(map_jwt_error)?;
        let payload = data.claims;

        let claims = IdentityClaims {
            principal_id: UserId::new(payload.sub)
                .map_err(|e| VerificationError::Malformed(e.to_string()))?,
            email: payload.email,
            issued_at: timestamp(payload.iat)?,
            expires_at: timestamp(payload.exp)?,
        };

        let effective_now = if claims.issued_at > now && claims.issued_at - now <= self.leeway {
            claims.issued_at
        } else {
            now
        };
        validate_claims(&claims, effective_now).map_err(|e| match e {
            TokenValidationError::Expired => VerificationError::Expired,
            TokenValidationError::NotYetValid => VerificationError::NotYetValid,
            TokenValidationError::InvalidTimeWindow => {
                VerificationError::Malformed("exp <= iat".to_string())
            }
        })?;

        Ok(claims)
    }
}

pub(crate) fn timestamp(secs: i64) -> Result<DateTime<Utc>, VerificationError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| VerificationError::Malformed(format!("timestamp out of range: {secs}")))
}

fn map_jwt_error(e: jsonwebtoken::errors::Error) -> VerificationError {
    match e.kind() {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat => VerificationError::BadSignature,
        ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => VerificationError::UntrustedIssuer,
        ErrorKind::ExpiredSignature => VerificationError::Expired,
        ErrorKind::ImmatureSignature => VerificationError::NotYetValid,
        _ => VerificationError::Malformed(e.to_string()),
    }
}
