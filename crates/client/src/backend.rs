use std::sync::Arc;

use async_trait::async_trait;

use hrms_auth::{AuthError, Principal};

/// Server-side session operations the auth context depends on.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange a fresh credential for a server session.
    async fn establish_session(&self, credential: &str) -> Result<(), AuthError>;

    /// Resolve the role-bearing principal behind a credential.
    async fn fetch_principal(&self, credential: &str) -> Result<Principal, AuthError>;

    /// Revoke the current server session, if any.
    async fn end_session(&self) -> Result<(), AuthError>;
}

#[async_trait]
impl<S> AuthBackend for Arc<S>
where
    S: AuthBackend + ?Sized,
{
    async fn establish_session(&self, credential: &str) -> Result<(), AuthError> {
        (**self).establish_session(credential).await
    }

    async fn fetch_principal(&self, credential: &str) -> Result<Principal, AuthError> {
        (**self).fetch_principal(credential).await
    }

    async fn end_session(&self) -> Result<(), AuthError> {
        (**self).end_session().await
    }
}
