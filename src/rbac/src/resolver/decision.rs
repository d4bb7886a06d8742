//! Permission decision types

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::RoleId;

/// Why a permission check came out the way it did
///
/// Kept separate from the boolean result so that denials caused by bad
/// upstream data (`UnknownRole`) can be told apart from ordinary
/// authorization outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecisionReason {
    /// Principal holds the administrator role
    AdministratorBypass,

    /// Principal's role lists the permission
    RoleGrant { role_id: RoleId },

    /// Principal's role does not list the permission
    PermissionNotGranted { role_id: RoleId },

    /// Resolver has no current principal
    NoPrincipal,

    /// Queried id is not the current principal
    PrincipalMismatch,

    /// Principal references a role missing from the catalog
    UnknownRole { role_id: RoleId },
}

impl DecisionReason {
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::AdministratorBypass | Self::RoleGrant { .. })
    }

    /// Denial caused by inconsistent upstream data rather than policy
    pub fn is_fault(self) -> bool {
        matches!(self, Self::UnknownRole { .. })
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdministratorBypass => write!(f, "administrator bypass"),
            Self::RoleGrant { role_id } => write!(f, "granted by role {}", role_id),
            Self::PermissionNotGranted { role_id } => write!(f, "not granted by role {}", role_id),
            Self::NoPrincipal => write!(f, "no authenticated principal"),
            Self::PrincipalMismatch => write!(f, "not the authenticated principal"),
            Self::UnknownRole { role_id } => write!(f, "role {} not in catalog", role_id),
        }
    }
}

/// Permission check result with diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: DecisionReason,
    /// Served from the decision cache
    pub cached: bool,
}

impl Decision {
    pub(crate) fn computed(reason: DecisionReason) -> Self {
        Self {
            allowed: reason.is_allowed(),
            reason,
            cached: false,
        }
    }

    pub(crate) fn from_cache(reason: DecisionReason) -> Self {
        Self {
            allowed: reason.is_allowed(),
            reason,
            cached: true,
        }
    }
}
