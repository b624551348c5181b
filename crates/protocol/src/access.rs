use crate::error::{DeskError, Result};
use crate::roles::Role;
use serde::{Deserialize, Serialize};

/// Access level derived from a user's role and handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Guest,
    Member,
    Admin,
}

impl Permission {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }

    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Pure mapping `(role, handle) -> permission`.
///
/// Admin when the role is elevated or the handle matches the configured developer handle.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    developer_handle: Option<String>,
}

impl AccessGate {
    pub fn new(developer_handle: Option<&str>) -> Self {
        Self {
            developer_handle: developer_handle.and_then(normalize_handle),
        }
    }

    pub fn permission(&self, role: Option<Role>, handle: Option<&str>) -> Permission {
        if role.is_some_and(Role::is_elevated) || self.is_developer(handle) {
            return Permission::Admin;
        }
        if role.is_some() {
            Permission::Member
        } else {
            Permission::Guest
        }
    }

    pub fn is_developer(&self, handle: Option<&str>) -> bool {
        match (&self.developer_handle, handle.and_then(normalize_handle)) {
            (Some(expected), Some(actual)) => *expected == actual,
            _ => false,
        }
    }

    pub fn developer_handle(&self) -> Option<&str> {
        self.developer_handle.as_deref()
    }

    /// Fails with `PermissionDenied` unless `granted` reaches `needed`.
    pub fn require(granted: Permission, needed: Permission) -> Result<()> {
        if granted >= needed {
            Ok(())
        } else {
            Err(DeskError::PermissionDenied)
        }
    }
}

/// Handles compare case-insensitively and without the leading `@`.
pub fn normalize_handle(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('@');
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevated_roles_are_admin() {
        let gate = AccessGate::new(None);
        assert_eq!(
            gate.permission(Some(Role::Administrator), None),
            Permission::Admin
        );
        assert_eq!(
            gate.permission(Some(Role::AssistantDirector), Some("anyone")),
            Permission::Admin
        );
        assert_eq!(gate.permission(Some(Role::Director), None), Permission::Member);
        assert_eq!(gate.permission(None, Some("anyone")), Permission::Guest);
    }

    #[test]
    fn test_developer_override_wins() {
        let gate = AccessGate::new(Some("@DevOps"));
        assert_eq!(gate.permission(None, Some("devops")), Permission::Admin);
        assert_eq!(gate.permission(Some(Role::Driver), Some("@DEVOPS")), Permission::Admin);
        assert_eq!(gate.permission(Some(Role::Driver), Some("other")), Permission::Member);
        assert!(!gate.is_developer(None));
    }

    #[test]
    fn test_require_orders_levels() {
        assert!(AccessGate::require(Permission::Admin, Permission::Member).is_ok());
        assert_eq!(
            AccessGate::require(Permission::Guest, Permission::Member),
            Err(DeskError::PermissionDenied)
        );
    }
}
