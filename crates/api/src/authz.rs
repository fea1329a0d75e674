//! Handler-side capability checks.
//!
//! The edge gate only proves a cookie exists; every handler that acts on
//! behalf of a principal checks its capability here, independently of what
//! the client UI chose to show.

use hrms_auth::{AuthError, Capability, authorize};

use crate::context::PrincipalContext;

pub fn require(ctx: &PrincipalContext, capability: Capability) -> Result<(), AuthError> {
    authorize(ctx.principal(), capability).inspect_err(|_| {
        tracing::info!(
            principal_id = %ctx.principal().id,
            role = %ctx.principal().role,
            capability = %capability,
            "capability denied"
        );
    })
}
