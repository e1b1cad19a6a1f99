//! The authenticated actor attached to every mutating request.
//!
//! Credential checks happen upstream (the identity gateway); this service
//! receives the already-authenticated identity and role, and trusts them.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Role of an authenticated actor.
///
/// `Moderator` and `Admin` are privileged: they may manage the pricing
/// policy, transition orders, and read the global order views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A purchasing customer.
    Client,
    /// Staff with store-management access.
    Moderator,
    /// Staff with full access.
    Admin,
}

impl Role {
    /// Whether this role may perform operator-only actions.
    #[must_use]
    pub const fn is_privileged(self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Client => write!(f, "client"),
            Self::Moderator => write!(f, "moderator"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Error returned when a role string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Self::Client),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

/// An authenticated actor (id + role) as supplied by the identity gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    /// Create a new actor reference.
    #[must_use]
    pub const fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Whether the actor may perform operator-only actions.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        self.role.is_privileged()
    }
}
