//! `hrms-client`
//!
//! **Responsibility:** client-side auth state for the HR application UI.
//!
//! This crate provides:
//! - [`AuthContext`]: the single source of truth for "who is signed in"
//! - [`ProtectedRoute`]: the render/redirect/deny decision for a view
//! - [`HttpAuthBackend`]: the session endpoints over HTTP
//!
//! UI code asks [`AuthContext::has_permission`]; it never compares role
//! strings itself.

pub mod backend;
pub mod context;
pub mod guard;
pub mod http;
pub mod provider;
pub mod types;

pub use backend::AuthBackend;
pub use context::AuthContext;
pub use guard::{GuardView, ProtectedRoute};
pub use http::HttpAuthBackend;
pub use provider::{IdentityProvider, ProviderState};
pub use types::{AuthSnapshot, AuthStatus, ConnectivityState};
