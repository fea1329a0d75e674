use hrms_auth::Principal;
use hrms_infra::session::SessionClaims;

/// Authenticated request context: the resolved principal plus the session
/// it arrived on.
///
/// Inserted by the session middleware; handlers behind it can rely on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
    session: SessionClaims,
}

impl PrincipalContext {
    pub fn new(principal: Principal, session: SessionClaims) -> Self {
        Self { principal, session }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn session(&self) -> &SessionClaims {
        &self.session
    }
}
