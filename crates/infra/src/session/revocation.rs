use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use hrms_core::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RevocationError {
    #[error("revocation store unavailable: {0}")]
    Unavailable(String),
}

/// Records explicit session revocations.
///
/// Session artifacts are verified without a lookup of their own, so this is
/// the only state consulted per request. Both mutations are idempotent.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Revoke one session; `expires_at` bounds how long the entry matters.
    async fn revoke_session(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), RevocationError>;

    /// Revoke every session of `principal` issued at or before `at`.
    async fn revoke_principal(&self, principal: &UserId, at: DateTime<Utc>) -> Result<(), RevocationError>;

    async fn is_revoked(
        &self,
        session_id: &str,
        principal: &UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<bool, RevocationError>;
}

#[async_trait]
impl<S> RevocationStore for Arc<S>
where
    S: RevocationStore + ?Sized,
{
    async fn revoke_session(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), RevocationError> {
        (**self).revoke_session(session_id, expires_at, now).await
    }

    async fn revoke_principal(&self, principal: &UserId, at: DateTime<Utc>) -> Result<(), RevocationError> {
        (**self).revoke_principal(principal, at).await
    }

    async fn is_revoked(
        &self,
        session_id: &str,
        principal: &UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<bool, RevocationError> {
        (**self).is_revoked(session_id, principal, issued_at).await
    }
}

#[derive(Debug, Default)]
struct Revocations {
    /// session id -> artifact expiry
    sessions: HashMap<String, DateTime<Utc>>,
    /// principal -> sessions issued at or before this instant are dead
    principals: HashMap<UserId, DateTime<Utc>>,
}

/// In-memory revocation list for tests/dev and single-node deployments.
#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    inner: RwLock<Revocations>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revoked_session_count(&self) -> usize {
        self.inner.read().map(|r| r.sessions.len()).unwrap_or(0)
    }
}

fn poisoned() -> RevocationError {
    RevocationError::Unavailable("lock poisoned".to_string())
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke_session(
        &self,
        session_id: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), RevocationError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        // Entries for artifacts that have expired anyway are dead weight.
        inner.sessions.retain(|_, exp| *exp > now);
        if expires_at > now {
            inner.sessions.insert(session_id.to_string(), expires_at);
        }
        Ok(())
    }

    async fn revoke_principal(&self, principal: &UserId, at: DateTime<Utc>) -> Result<(), RevocationError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let entry = inner.principals.entry(principal.clone()).or_insert(at);
        if *entry < at {
            *entry = at;
        }
        Ok(())
    }

    async fn is_revoked(
        &self,
        session_id: &str,
        principal: &UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<bool, RevocationError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        if inner.sessions.contains_key(session_id) {
            return Ok(true);
        }
        Ok(inner
            .principals
            .get(principal)
            .is_some_and(|cutoff| issued_at <= *cutoff))
    }
}
