//! Process-wide auth backend handle.
//!
//! Built once at startup and shared by every request. Initialization is
//! idempotent: a second `init_global` returns the handle that already exists.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};

use hrms_auth::{AuthError, Principal};

use crate::identity::CredentialVerifier;
use crate::resolver::PrincipalResolver;
use crate::session::{SessionArtifact, SessionClaims, SessionManager};

static GLOBAL: OnceLock<Arc<Backend>> = OnceLock::new();

pub struct Backend {
    verifier: Arc<dyn CredentialVerifier>,
    sessions: Arc<SessionManager>,
    resolver: Arc<PrincipalResolver>,
}

impl Backend {
    pub fn new(sessions: Arc<SessionManager>, resolver: Arc<PrincipalResolver>) -> Self {
        Self {
            verifier: sessions.verifier().clone(),
            sessions,
            resolver,
        }
    }

    pub fn verifier(&self) -> &Arc<dyn CredentialVerifier> {
        &self.verifier
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    pub fn resolver(&self) -> &Arc<PrincipalResolver> {
        &self.resolver
    }

    /// Session artifact -> verified claims + principal.
    pub async fn authenticate_session(
        &self,
        artifact: &SessionArtifact,
        now: DateTime<Utc>,
    ) -> Result<(SessionClaims, Principal), AuthError> {
        let claims = self.sessions.verify(artifact, now).await?;
        let principal = self.resolver.resolve(&claims.identity()).await?;
        Ok((claims, principal))
    }

    /// Identity-provider credential -> principal, without minting a session.
    pub async fn authenticate_credential(&self, credential: &str, now: DateTime<Utc>) -> Result<Principal, AuthError> {
        let identity = self.verifier.verify(credential, now).await?;
        Ok(self.resolver.resolve(&identity).await?)
    }
}

/// Build the global backend on first call; later calls reuse it and never
/// run `build`.
pub fn init_global<F>(build: F) -> anyhow::Result<Arc<Backend>>
where
    F: FnOnce() -> anyhow::Result<Backend>,
{
    if let Some(existing) = GLOBAL.get() {
        tracing::debug!("auth backend already initialized");
        return Ok(existing.clone());
    }

    let backend = Arc::new(build()?);
    // Another thread may have won the race; keep whichever landed first.
    let _ = GLOBAL.set(backend);
    let handle = GLOBAL
        .get()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("auth backend failed to initialize"))?;
    tracing::info!("auth backend initialized");
    Ok(handle)
}

pub fn global() -> Option<Arc<Backend>> {
    GLOBAL.get().cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{InMemoryUserDirectory, UserRecord};
    use crate::identity::{JwtCredentialVerifier, KeySet, SigningKey, StaticKeyProvider};
    use crate::session::{InMemoryRevocationStore, SessionConfig};
    use chrono::Duration;
    use hrms_auth::{Role, SessionFault};
    use hrms_core::UserId;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use serde_json::json;

    const IDP_SECRET: &[u8] = b"idp-secret";

    fn backend() -> Backend {
        let keys = KeySet::new().with_fallback(SigningKey::hs256(IDP_SECRET));
        let verifier = Arc::new(JwtCredentialVerifier::new(Arc::new(StaticKeyProvider::new(keys))));
        let sessions = Arc::new(SessionManager::new(
            verifier,
            Arc::new(InMemoryRevocationStore::new()),
            b"session-secret",
            SessionConfig::default(),
        ));
        let directory = InMemoryUserDirectory::from_records([UserRecord {
            id: UserId::new("u1").unwrap(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: "admin".to_string(),
            department: None,
            manager_id: None,
        }]);
        Backend::new(sessions, Arc::new(PrincipalResolver::new(Arc::new(directory))))
    }

    fn credential(sub: &str, iat: DateTime<Utc>) -> String {
        let claims = json!({
            "sub": sub,
            "iat": iat.timestamp(),
            "exp": (iat + Duration::hours(1)).timestamp(),
        });
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(IDP_SECRET)).unwrap()
    }

    #[tokio::test]
    async fn session_round_trip_resolves_principal() {
        let backend = backend();
        let now = Utc::now();
        let issued = backend.sessions().issue(&credential("u1", now), now).await.unwrap();

        let (claims, principal) = backend.authenticate_session(&issued.artifact, now).await.unwrap();
        assert_eq!(claims.principal_id, principal.id);
        assert_eq!(principal.role, Role::Admin);
    }

    #[tokio::test]
    async fn revoked_session_is_session_invalid() {
        let backend = backend();
        let now = Utc::now();
        let issued = backend.sessions().issue(&credential("u1", now), now).await.unwrap();
        backend.sessions().revoke(&issued.artifact, now).await.unwrap();

        let err = backend.authenticate_session(&issued.artifact, now).await.unwrap_err();
        assert_eq!(err, AuthError::SessionInvalid(SessionFault::Revoked));
    }

    #[tokio::test]
    async fn verified_credential_without_record_is_not_found() {
        let backend = backend();
        let now = Utc::now();
        let err = backend.authenticate_credential(&credential("ghost", now), now).await.unwrap_err();
        assert_eq!(err, AuthError::PrincipalNotFound);
    }

    #[test]
    fn init_global_is_idempotent() {
        let first = init_global(|| Ok(backend())).unwrap();
        let second = init_global(|| anyhow::bail!("must not rebuild")).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(global().is_some());
    }
}
