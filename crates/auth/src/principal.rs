use serde::{Deserialize, Serialize};

use hrms_core::UserId;

use crate::{Capability, IdentityClaims, Role, capable};

/// A fully resolved principal for authorization decisions.
///
/// Built only from verified identity claims plus the user's record in the
/// document store; the role never comes from client input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub id: UserId,
    pub verified_identity: IdentityClaims,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<UserId>,
}

impl Principal {
    pub fn can(&self, capability: Capability) -> bool {
        capable(self.role, capability)
    }

    /// Capabilities granted to this principal, in declaration order.
    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL.into_iter().filter(|c| self.can(*c)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn json_uses_camel_case_throughout() {
        let id = UserId::new("emp-1").unwrap();
        let now = Utc::now();
        let principal = Principal {
            id: id.clone(),
            verified_identity: IdentityClaims {
                principal_id: id,
                email: None,
                issued_at: now,
                expires_at: now + Duration::hours(1),
            },
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Employee,
            department: None,
            manager_id: None,
        };

        let json = serde_json::to_value(&principal).unwrap();
        let identity = &json["verifiedIdentity"];
        assert_eq!(identity["principalId"], "emp-1");
        assert!(identity.get("issuedAt").is_some());
        assert!(identity.get("expiresAt").is_some());
        assert!(identity.get("principal_id").is_none());

        let back: Principal = serde_json::from_value(json).unwrap();
        assert_eq!(back, principal);
    }
}
