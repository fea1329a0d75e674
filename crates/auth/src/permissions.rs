//! Capabilities and the static role → capability matrix.

use core::str::FromStr;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Role;

/// A single named permission evaluated against a role.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    CanManageEmployees,
    CanViewPayroll,
    CanProcessPayroll,
    CanViewAnalytics,
    CanManageDocuments,
    CanManageSettings,
    CanViewAttendance,
    CanManageAttendance,
    CanViewPerformance,
    CanManagePerformance,
}

impl Capability {
    pub const ALL: [Capability; 10] = [
        Capability::CanManageEmployees,
        Capability::CanViewPayroll,
        Capability::CanProcessPayroll,
        Capability::CanViewAnalytics,
        Capability::CanManageDocuments,
        Capability::CanManageSettings,
        Capability::CanViewAttendance,
        Capability::CanManageAttendance,
        Capability::CanViewPerformance,
        Capability::CanManagePerformance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::CanManageEmployees => "canManageEmployees",
            Capability::CanViewPayroll => "canViewPayroll",
            Capability::CanProcessPayroll => "canProcessPayroll",
            Capability::CanViewAnalytics => "canViewAnalytics",
            Capability::CanManageDocuments => "canManageDocuments",
            Capability::CanManageSettings => "canManageSettings",
            Capability::CanViewAttendance => "canViewAttendance",
            Capability::CanManageAttendance => "canManageAttendance",
            Capability::CanViewPerformance => "canViewPerformance",
            Capability::CanManagePerformance => "canManagePerformance",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Capability::CanManageEmployees => "Create, edit and deactivate employee records",
            Capability::CanViewPayroll => "View payroll runs and payslips",
            Capability::CanProcessPayroll => "Run and approve payroll",
            Capability::CanViewAnalytics => "View productivity and workforce dashboards",
            Capability::CanManageDocuments => "Upload and manage HR documents",
            Capability::CanManageSettings => "Change organisation-wide settings",
            Capability::CanViewAttendance => "View attendance records",
            Capability::CanManageAttendance => "Edit attendance and approve corrections",
            Capability::CanViewPerformance => "View performance reviews",
            Capability::CanManagePerformance => "Write and approve performance reviews",
        }
    }

    /// Functional area the capability belongs to (for grouping in audit views).
    pub fn category(&self) -> &'static str {
        match self {
            Capability::CanManageEmployees => "employees",
            Capability::CanViewPayroll | Capability::CanProcessPayroll => "payroll",
            Capability::CanViewAnalytics => "analytics",
            Capability::CanManageDocuments => "documents",
            Capability::CanManageSettings => "settings",
            Capability::CanViewAttendance | Capability::CanManageAttendance => "attendance",
            Capability::CanViewPerformance | Capability::CanManagePerformance => "performance",
        }
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown capability '{0}'")]
pub struct UnknownCapability(pub String);

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCapability(s.to_string()))
    }
}

/// Answer "can this role do X".
///
/// - No IO
/// - No panics
/// - Total: the exhaustive match makes every (role, capability) cell explicit
pub fn capable(role: Role, capability: Capability) -> bool {
    use Capability::*;

    match role {
        Role::Admin => true,
        Role::Manager => match capability {
            CanManageEmployees => false,
            CanViewPayroll => false,
            CanProcessPayroll => false,
            CanViewAnalytics => true,
            CanManageDocuments => true,
            CanManageSettings => false,
            CanViewAttendance => true,
            CanManageAttendance => true,
            CanViewPerformance => true,
            CanManagePerformance => true,
        },
        Role::Employee => match capability {
            CanManageEmployees => false,
            CanViewPayroll => false,
            CanProcessPayroll => false,
            CanViewAnalytics => false,
            CanManageDocuments => false,
            CanManageSettings => false,
            CanViewAttendance => true,
            CanManageAttendance => false,
            CanViewPerformance => true,
            CanManagePerformance => false,
        },
    }
}

/// One role's row of the matrix, materialized for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionSet {
    pub role: Role,
    pub capabilities: BTreeMap<Capability, bool>,
}

impl PermissionSet {
    pub fn for_role(role: Role) -> Self {
        let capabilities = Capability::ALL
            .into_iter()
            .map(|c| (c, capable(role, c)))
            .collect();
        Self { role, capabilities }
    }

    pub fn granted(&self) -> Vec<Capability> {
        self.capabilities
            .iter()
            .filter(|(_, allowed)| **allowed)
            .map(|(c, _)| *c)
            .collect()
    }

    /// The whole matrix, one row per role.
    pub fn matrix() -> Vec<PermissionSet> {
        Role::ALL.into_iter().map(Self::for_role).collect()
    }
}
