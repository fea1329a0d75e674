//! Shared client-side state types.

use serde::Serialize;

use hrms_auth::{AuthError, Capability, Principal};

/// Connectivity state of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    /// Network reachable.
    Online,
    /// Network unreachable; auth state is left as it was.
    Offline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "principal", rename_all = "lowercase")]
pub enum AuthStatus {
    Loading,
    Authenticated(Principal),
    Unauthenticated,
}

/// One observable state of the auth context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub status: AuthStatus,
    pub connectivity: ConnectivityState,
    /// Last failure, kept for display until the next sign-in attempt.
    pub error: Option<AuthError>,
}

impl AuthSnapshot {
    pub fn loading() -> Self {
        Self {
            status: AuthStatus::Loading,
            connectivity: ConnectivityState::Online,
            error: None,
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        match &self.status {
            AuthStatus::Authenticated(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == AuthStatus::Loading
    }

    /// False unless authenticated; otherwise the permission matrix decides.
    pub fn has_permission(&self, capability: Capability) -> bool {
        self.principal().is_some_and(|p| p.can(capability))
    }
}
