//! Actor - who is performing an operation
//!
//! Roles are a closed set: adding one is a compile-time-visible change
//! everywhere cancellation and review permissions are evaluated.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Operator roles, ordered by authority
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    /// Field agent who issues contraventions
    Agent,
    /// Supervisor - may cancel outside the direct window and review contestations
    Supervisor,
    /// Administrator - full authority, owns reference data
    Administrator,
}

impl Role {
    /// Supervisors and administrators share the elevated permission set
    pub fn is_supervisory(&self) -> bool {
        matches!(self, Role::Supervisor | Role::Administrator)
    }
}

/// An authenticated operator acting on the system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
        }
    }

    pub fn agent(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, Role::Agent)
    }

    pub fn supervisor(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, Role::Supervisor)
    }

    pub fn administrator(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, Role::Administrator)
    }
}
