use crate::error::{DeskError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Fixed set of organisational roles. Each role owns one top-level folder in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Director")]
    Director,
    #[serde(rename = "Assistant Director")]
    AssistantDirector,
    #[serde(rename = "Accountant")]
    Accountant,
    #[serde(rename = "Supply")]
    Supply,
    #[serde(rename = "Production Head")]
    ProductionHead,
    #[serde(rename = "Driver")]
    Driver,
    #[serde(rename = "Marketer")]
    Marketer,
    #[serde(rename = "Manager")]
    Manager,
    #[serde(rename = "Storekeeper")]
    Storekeeper,
    #[serde(rename = "Production Worker")]
    ProductionWorker,
    #[serde(rename = "Operator")]
    Operator,
    #[serde(rename = "Installer")]
    Installer,
    #[serde(rename = "Laborer")]
    Laborer,
    #[serde(rename = "Administrator")]
    Administrator,
}

impl Role {
    pub const ALL: [Role; 14] = [
        Role::Director,
        Role::AssistantDirector,
        Role::Accountant,
        Role::Supply,
        Role::ProductionHead,
        Role::Driver,
        Role::Marketer,
        Role::Manager,
        Role::Storekeeper,
        Role::ProductionWorker,
        Role::Operator,
        Role::Installer,
        Role::Laborer,
        Role::Administrator,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Director => "Director",
            Role::AssistantDirector => "Assistant Director",
            Role::Accountant => "Accountant",
            Role::Supply => "Supply",
            Role::ProductionHead => "Production Head",
            Role::Driver => "Driver",
            Role::Marketer => "Marketer",
            Role::Manager => "Manager",
            Role::Storekeeper => "Storekeeper",
            Role::ProductionWorker => "Production Worker",
            Role::Operator => "Operator",
            Role::Installer => "Installer",
            Role::Laborer => "Laborer",
            Role::Administrator => "Administrator",
        }
    }

    /// Built-in registration secret, used unless configuration overrides it.
    pub const fn default_secret(self) -> &'static str {
        match self {
            Role::Director => "7351",
            Role::AssistantDirector => "1482",
            Role::Accountant => "9623",
            Role::Supply => "8574",
            Role::ProductionHead => "3147",
            Role::Driver => "2069",
            Role::Marketer => "5408",
            Role::Manager => "6381",
            Role::Storekeeper => "9074",
            Role::ProductionWorker => "8520",
            Role::Operator => "4369",
            Role::Installer => "5792",
            Role::Laborer => "3208",
            Role::Administrator => "0000",
        }
    }

    /// Roles that grant admin permission on their own.
    pub const fn is_elevated(self) -> bool {
        matches!(self, Role::Administrator | Role::AssistantDirector)
    }

    /// Case- and whitespace-insensitive lookup by display name.
    pub fn from_name(raw: &str) -> Option<Role> {
        let wanted = normalize_name(raw);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|role| normalize_name(role.as_str()) == wanted)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DeskError;

    fn from_str(s: &str) -> Result<Self> {
        Role::from_name(s).ok_or_else(|| DeskError::invalid(format!("unknown role '{s}'")))
    }
}

fn normalize_name(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Registration secrets, one per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSecrets {
    secrets: BTreeMap<Role, String>,
}

impl Default for RoleSecrets {
    fn default() -> Self {
        Self {
            secrets: Role::ALL
                .into_iter()
                .map(|role| (role, role.default_secret().to_string()))
                .collect(),
        }
    }
}

impl RoleSecrets {
    /// Defaults with the given `role name -> secret` overrides applied.
    pub fn with_overrides<'a>(
        overrides: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Result<Self> {
        let mut secrets = Self::default();
        for (name, secret) in overrides {
            let role: Role = name.parse()?;
            let secret = secret.trim();
            if secret.is_empty() {
                return Err(DeskError::invalid(format!("empty secret for role '{role}'")));
            }
            secrets.secrets.insert(role, secret.to_string());
        }
        Ok(secrets)
    }

    pub fn verify(&self, role: Role, candidate: &str) -> bool {
        self.secrets
            .get(&role)
            .is_some_and(|secret| secret == candidate.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_lookup_ignores_case_and_spacing() {
        assert_eq!(Role::from_name("driver"), Some(Role::Driver));
        assert_eq!(
            Role::from_name("  assistant   DIRECTOR "),
            Some(Role::AssistantDirector)
        );
        assert_eq!(Role::from_name("pilot"), None);
        assert_eq!(Role::from_name("   "), None);
    }

    #[test]
    fn test_serde_uses_display_names() {
        let json = serde_json::to_string(&Role::ProductionHead).unwrap();
        assert_eq!(json, "\"Production Head\"");
        let back: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Role::ProductionHead);
    }

    #[test]
    fn test_secret_overrides() {
        let overrides: BTreeMap<String, String> =
            [("driver".to_string(), "1111".to_string())].into_iter().collect();
        let secrets = RoleSecrets::with_overrides(&overrides).unwrap();
        assert!(secrets.verify(Role::Driver, "1111"));
        assert!(!secrets.verify(Role::Driver, "2069"));
        assert!(secrets.verify(Role::Accountant, " 9623 "));

        let bad: BTreeMap<String, String> =
            [("pilot".to_string(), "1".to_string())].into_iter().collect();
        assert!(RoleSecrets::with_overrides(&bad).is_err());
    }
}
