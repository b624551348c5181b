use crate::event::UserId;
use crate::roles::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recipients of a composed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Audience {
    Everyone,
    Role(Role),
    User(UserId),
}

/// Who a test is assigned to when created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum TestScope {
    Role(Role),
    User(UserId),
    /// Stored without notifying anyone
    Unassigned,
}

/// Role filter carried by group-compose actions: one role or everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleFilter {
    All,
    Only(Role),
}

impl RoleFilter {
    pub(crate) const ALL_TOKEN: &'static str = "ALL";

    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().eq_ignore_ascii_case(Self::ALL_TOKEN) {
            return Some(Self::All);
        }
        Role::from_name(raw).map(Self::Only)
    }

    pub fn audience(self) -> Audience {
        match self {
            Self::All => Audience::Everyone,
            Self::Only(role) => Audience::Role(role),
        }
    }
}

impl fmt::Display for RoleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(Self::ALL_TOKEN),
            Self::Only(role) => f.write_str(role.as_str()),
        }
    }
}

/// Grouping key for the admin audit view. Recipients without a role land in `NoRole`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoleBucket {
    Role(Role),
    NoRole,
}

impl RoleBucket {
    pub(crate) const NO_ROLE_TOKEN: &'static str = "none";

    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().eq_ignore_ascii_case(Self::NO_ROLE_TOKEN) {
            return Some(Self::NoRole);
        }
        Role::from_name(raw).map(Self::Role)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Role(role) => role.as_str(),
            Self::NoRole => "No role",
        }
    }
}

impl From<Option<Role>> for RoleBucket {
    fn from(role: Option<Role>) -> Self {
        role.map_or(Self::NoRole, Self::Role)
    }
}

impl fmt::Display for RoleBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role(role) => f.write_str(role.as_str()),
            Self::NoRole => f.write_str(Self::NO_ROLE_TOKEN),
        }
    }
}
