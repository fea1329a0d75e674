use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hrms_auth::{IdentityClaims, validate_window};
use hrms_core::UserId;

use super::{RevocationStore, SESSION_TTL_SECS, SessionArtifact, SessionError};
use crate::identity::CredentialVerifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Fixed validity window of an artifact.
    pub ttl: Duration,
    /// How fresh the credential must be to mint a session from it.
    pub recent_sign_in: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(SESSION_TTL_SECS),
            recent_sign_in: Duration::minutes(5),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionPayload {
    sid: String,
    sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    iat: i64,
    exp: i64,
    /// When the user actually authenticated with the identity provider.
    auth_time: i64,
}

/// Verified content of a session artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub session_id: String,
    pub principal_id: UserId,
    pub email: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub auth_time: DateTime<Utc>,
}

impl SessionClaims {
    pub fn identity(&self) -> IdentityClaims {
        IdentityClaims {
            principal_id: self.principal_id.clone(),
            email: self.email.clone(),
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub artifact: SessionArtifact,
    pub claims: SessionClaims,
}

/// Exchanges verified credentials for session artifacts and checks them later.
///
/// Artifacts are HS256-signed with the server's session secret, so verifying
/// one needs no provider round-trip; revocation is the only shared state.
pub struct SessionManager {
    verifier: Arc<dyn CredentialVerifier>,
    revocations: Arc<dyn RevocationStore>,
    encoding: EncodingKey,
    decoding: DecodingKey,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        verifier: Arc<dyn CredentialVerifier>,
        revocations: Arc<dyn RevocationStore>,
        secret: &[u8],
        config: SessionConfig,
    ) -> Self {
        Self {
            verifier,
            revocations,
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            config,
        }
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// The credential verifier this manager trusts.
    pub fn verifier(&self) -> &Arc<dyn CredentialVerifier> {
        &self.verifier
    }

    /// Verify `credential` and mint a session artifact for it.
    pub async fn issue(&self, credential: &str, now: DateTime<Utc>) -> Result<IssuedSession, SessionError> {
        let identity = self.verifier.verify(credential, now).await?;

        if now - identity.issued_at > self.config.recent_sign_in {
            return Err(SessionError::StaleSignIn);
        }

        let issued_at = now;
        let expires_at = now + self.config.ttl;
        let payload = SessionPayload {
            sid: Uuid::now_v7().to_string(),
            sub: identity.principal_id.to_string(),
            email: identity.email.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            auth_time: identity.issued_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &payload, &self.encoding)
            .map_err(|e| SessionError::Signing(e.to_string()))?;

        let claims = self.claims_from_payload(payload)?;
        tracing::info!(
            principal_id = %claims.principal_id,
            session_id = %claims.session_id,
            expires_at = %claims.expires_at,
            "session issued"
        );

        Ok(IssuedSession {
            artifact: SessionArtifact::from_cookie_value(token),
            claims,
        })
    }

    /// Valid iff the signature verifies, it has not expired, and it has not
    /// been revoked.
    pub async fn verify(&self, artifact: &SessionArtifact, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        let claims = self.decode(artifact)?;

        validate_window(claims.issued_at, claims.expires_at, now).map_err(|e| match e {
            hrms_auth::TokenValidationError::Expired => SessionError::Expired,
            _ => SessionError::Malformed,
        })?;

        if self
            .revocations
            .is_revoked(&claims.session_id, &claims.principal_id, claims.issued_at)
            .await?
        {
            return Err(SessionError::Revoked);
        }

        Ok(claims)
    }

    /// Revoke one artifact. Already revoked, expired or undecodable artifacts
    /// are a no-op.
    pub async fn revoke(&self, artifact: &SessionArtifact, now: DateTime<Utc>) -> Result<(), SessionError> {
        let claims = match self.decode(artifact) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!("ignoring revoke of undecodable session: {e}");
                return Ok(());
            }
        };
        if claims.expires_at <= now {
            return Ok(());
        }

        self.revocations
            .revoke_session(&claims.session_id, claims.expires_at, now)
            .await?;
        tracing::info!(
            principal_id = %claims.principal_id,
            session_id = %claims.session_id,
            "session revoked"
        );
        Ok(())
    }

    /// Revoke every session of `principal` issued up to `now` ("logout everywhere").
    pub async fn revoke_all(&self, principal: &UserId, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.revocations.revoke_principal(principal, now).await?;
        tracing::info!(principal_id = %principal, "all sessions revoked");
        Ok(())
    }

    fn decode(&self, artifact: &SessionArtifact) -> Result<SessionClaims, SessionError> {
        let token = artifact.expose().trim();
        if token.is_empty() {
            return Err(SessionError::Missing);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::from(["sub".to_string(), "exp".to_string()]);

        let data = decode::<SessionPayload>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => SessionError::BadSignature,
            _ => SessionError::Malformed,
        })?;

        self.claims_from_payload(data.claims)
    }

    fn claims_from_payload(&self, payload: SessionPayload) -> Result<SessionClaims, SessionError> {
        let ts = |secs| DateTime::from_timestamp(secs, 0).ok_or(SessionError::Malformed);
        Ok(SessionClaims {
            session_id: payload.sid,
            principal_id: UserId::new(payload.sub).map_err(|_| SessionError::Malformed)?,
            email: payload.email,
            issued_at: ts(payload.iat)?,
            expires_at: ts(payload.exp)?,
            auth_time: ts(payload.auth_time)?,
        })
    }
}
