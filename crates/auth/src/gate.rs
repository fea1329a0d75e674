//! Edge request gate: the coarse, pre-handler filter.
//!
//! Runs on every navigation before any handler. It only looks at the path
//! and whether *some* credential is attached; verifying that credential is
//! the handlers' job (session manager + principal resolver), so this layer
//! stays free of IO.

use serde::Serialize;

use crate::{RouteAccess, RouteTable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    /// Path is outside the gate's matcher (API, static assets).
    Bypass,
    /// Public path, or a credential is present.
    Allow,
    /// Application root without a credential: let the client finish the
    /// redirect once it knows the auth state.
    AllowBootstrap,
    RedirectToSignIn { location: String },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        !matches!(self, GateDecision::RedirectToSignIn { .. })
    }
}

/// Decide what happens to a request for `path`.
pub fn decide(table: &RouteTable, path: &str, has_credential: bool) -> GateDecision {
    if !table.is_intercepted(path) {
        return GateDecision::Bypass;
    }
    if table.classify(path) == RouteAccess::Public {
        return GateDecision::Allow;
    }
    if has_credential {
        return GateDecision::Allow;
    }
    if table.is_bootstrap(path) {
        return GateDecision::AllowBootstrap;
    }
    GateDecision::RedirectToSignIn {
        location: table.sign_in_location(path),
    }
}
