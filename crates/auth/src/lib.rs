//! `hrms-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP, storage and the identity
//! provider: everything here is deterministic and IO-free.

pub mod authorize;
pub mod claims;
pub mod error;
pub mod gate;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod routes;

pub use authorize::{
    AuthorizationExplanation, RbacRegistry, authorize, explain_authorization,
};
pub use claims::{IdentityClaims, TokenValidationError, validate_claims, validate_window};
pub use error::{AuthError, CredentialFault, SessionFault};
pub use gate::GateDecision;
pub use permissions::{Capability, PermissionSet, UnknownCapability, capable};
pub use principal::Principal;
pub use roles::{Role, UnknownRole};
pub use routes::{PathPattern, RouteAccess, RouteEntry, RouteTable, RouteTableError};
