use std::collections::BTreeMap;

use serde::Serialize;

use hrms_core::UserId;

use crate::{AuthError, Capability, Principal, Role, capable};

/// Authorize a resolved principal for one capability.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: Capability) -> Result<(), AuthError> {
    if principal.can(required) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied(required))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
///
/// Answers "why was this request allowed/denied?" without re-deriving the
/// matrix at the call site.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_capability: Capability,
    pub granted: bool,
    pub reason: String,
    pub principal: PrincipalState,
    pub denial_reason: Option<DenialReason>,
}

/// Current state of the principal being checked.
#[derive(Debug, Clone, Serialize)]
pub struct PrincipalState {
    pub principal_id: UserId,
    pub role: Role,
    pub granted_capabilities: Vec<Capability>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub message: String,
    /// Roles whose matrix row grants the capability.
    pub granting_roles: Vec<Role>,
    pub suggestions: Vec<String>,
}

pub fn explain_authorization(principal: &Principal, required: Capability) -> AuthorizationExplanation {
    let state = PrincipalState {
        principal_id: principal.id.clone(),
        role: principal.role,
        granted_capabilities: principal.capabilities(),
    };

    if principal.can(required) {
        return AuthorizationExplanation {
            required_capability: required,
            granted: true,
            reason: format!("role '{}' grants '{}'", principal.role, required),
            principal: state,
            denial_reason: None,
        };
    }

    let granting_roles: Vec<Role> = Role::ALL
        .into_iter()
        .filter(|r| capable(*r, required))
        .collect();

    let mut suggestions =
        vec!["Ask an administrator to change the account's role in the user directory".to_string()];
    if !granting_roles.is_empty() {
        let names: Vec<&str> = granting_roles.iter().map(|r| r.as_str()).collect();
        suggestions.insert(0, format!("Roles granting '{}': {}", required, names.join(", ")));
    }

    AuthorizationExplanation {
        required_capability: required,
        granted: false,
        reason: format!("role '{}' does not grant '{}'", principal.role, required),
        principal: state,
        denial_reason: Some(DenialReason {
            message: format!("Missing required capability: '{}'", required),
            granting_roles,
            suggestions,
        }),
    }
}

/// Role definition with its granted capabilities (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub name: Role,
    pub description: &'static str,
    pub capabilities: Vec<Capability>,
}

/// Capability definition (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityDefinition {
    pub name: Capability,
    pub description: &'static str,
    pub category: &'static str,
    pub granted_to: Vec<Role>,
}

/// Registry of every role and capability, derived from the matrix.
#[derive(Debug, Clone, Serialize)]
pub struct RbacRegistry {
    pub roles: BTreeMap<String, RoleDefinition>,
    pub capabilities: BTreeMap<String, CapabilityDefinition>,
}

impl RbacRegistry {
    pub fn build() -> Self {
        let roles = Role::ALL
            .into_iter()
            .map(|role| {
                let def = RoleDefinition {
                    name: role,
                    description: role.description(),
                    capabilities: Capability::ALL
                        .into_iter()
                        .filter(|c| capable(role, *c))
                        .collect(),
                };
                (role.as_str().to_string(), def)
            })
            .collect();

        let capabilities = Capability::ALL
            .into_iter()
            .map(|cap| {
                let def = CapabilityDefinition {
                    name: cap,
                    description: cap.description(),
                    category: cap.category(),
                    granted_to: Role::ALL.into_iter().filter(|r| capable(*r, cap)).collect(),
                };
                (cap.as_str().to_string(), def)
            })
            .collect();

        Self { roles, capabilities }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdentityClaims;
    use chrono::{Duration, Utc};

    fn principal(role: Role) -> Principal {
        let now = Utc::now();
        let id = UserId::new("u1").unwrap();
        Principal {
            id: id.clone(),
            verified_identity: IdentityClaims {
                principal_id: id,
                email: Some("u1@example.com".into()),
                issued_at: now,
                expires_at: now + Duration::hours(1),
            },
            name: "Una".into(),
            email: "u1@example.com".into(),
            role,
            department: Some("Ops".into()),
            manager_id: None,
        }
    }

    #[test]
    fn authorize_follows_matrix() {
        assert!(authorize(&principal(Role::Admin), Capability::CanProcessPayroll).is_ok());
        assert_eq!(
            authorize(&principal(Role::Employee), Capability::CanManageEmployees),
            Err(AuthError::PermissionDenied(Capability::CanManageEmployees))
        );
    }

    #[test]
    fn explanation_names_granting_roles_on_denial() {
        let e = explain_authorization(&principal(Role::Manager), Capability::CanViewPayroll);
        assert!(!e.granted);
        let denial = e.denial_reason.unwrap();
        assert_eq!(denial.granting_roles, vec![Role::Admin]);
        assert!(!e.principal.granted_capabilities.contains(&Capability::CanViewPayroll));
    }

    #[test]
    fn explanation_when_granted_has_no_denial() {
        let e = explain_authorization(&principal(Role::Employee), Capability::CanViewAttendance);
        assert!(e.granted);
        assert!(e.denial_reason.is_none());
    }

    #[test]
    fn registry_covers_all_roles_and_capabilities() {
        let reg = RbacRegistry::build();
        assert_eq!(reg.roles.len(), Role::ALL.len());
        assert_eq!(reg.capabilities.len(), Capability::ALL.len());
        assert_eq!(reg.roles["admin"].capabilities.len(), Capability::ALL.len());
        assert_eq!(reg.capabilities["canManageSettings"].granted_to, vec![Role::Admin]);
    }
}
