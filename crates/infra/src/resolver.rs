//! Principal resolution: verified identity + user record -> `Principal`.
//!
//! This is the single place a role gets attached to a request.

use std::sync::Arc;

use thiserror::Error;

use hrms_auth::{AuthError, IdentityClaims, Principal, Role};
use hrms_core::UserId;

use crate::directory::{StoreError, UserDirectory};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no user record for '{0}'")]
    NotFound(UserId),

    #[error("user record '{id}' has unknown role '{role}'")]
    InvalidRole { id: UserId, role: String },

    #[error("user record is unreadable: {0}")]
    Corrupt(String),

    #[error("document store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for ResolveError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unavailable(msg) => ResolveError::StoreUnavailable(msg),
            StoreError::Corrupt(msg) => {
                tracing::warn!(reason = %msg, "user record is corrupt");
                ResolveError::Corrupt(msg)
            }
        }
    }
}

impl From<ResolveError> for AuthError {
    fn from(value: ResolveError) -> Self {
        match value {
            // A record we cannot interpret is as unusable as a missing one.
            ResolveError::NotFound(_) | ResolveError::InvalidRole { .. } | ResolveError::Corrupt(_) => {
                AuthError::PrincipalNotFound
            }
            ResolveError::StoreUnavailable(msg) => AuthError::StoreUnavailable(msg),
        }
    }
}

pub struct PrincipalResolver {
    directory: Arc<dyn UserDirectory>,
}

impl PrincipalResolver {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    pub async fn resolve(&self, identity: &IdentityClaims) -> Result<Principal, ResolveError> {
        let record = self
            .directory
            .get_user_by_id(&identity.principal_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(principal_id = %identity.principal_id, "verified identity has no user record");
                ResolveError::NotFound(identity.principal_id.clone())
            })?;

        let role: Role = record.role.parse().map_err(|_| {
            tracing::warn!(principal_id = %record.id, role = %record.role, "user record has unknown role");
            ResolveError::InvalidRole {
                id: record.id.clone(),
                role: record.role.clone(),
            }
        })?;

        let email = if record.email.trim().is_empty() {
            identity.email.clone().unwrap_or_default()
        } else {
            record.email
        };

        Ok(Principal {
            id: record.id,
            verified_identity: identity.clone(),
            name: record.name,
            email,
            role,
            department: record.department,
            manager_id: record.manager_id,
        })
    }
}
