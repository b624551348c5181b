use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use workdesk_protocol::RoleSecrets;

const CONFIG_FILE_NAME: &str = "workdesk.toml";
const ENV_BASE_DIR: &str = "WORKDESK_BASE_DIR";
const ENV_DEVELOPER: &str = "WORKDESK_DEVELOPER";

/// Runtime configuration.
///
/// Sources are layered: built-in defaults, then the TOML file, then environment variables,
/// then command-line flags (applied by the binary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    /// Folder holding the role roots, the shared root and the internal store
    pub base_dir: PathBuf,

    /// Handle that is always granted admin access and receives failure reports
    pub developer_handle: Option<String>,

    /// `role name -> secret` overrides for registration
    pub role_secrets: BTreeMap<String, String>,

    /// Words that end the upload wizard
    pub done_words: Vec<String>,

    /// Upper bound on search results rendered as buttons
    pub max_search_results: usize,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            developer_handle: None,
            role_secrets: BTreeMap::new(),
            done_words: vec!["done".to_string(), "готово".to_string()],
            max_search_results: 50,
        }
    }
}

impl DeskConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse workdesk configuration")
    }

    /// Loads `explicit` when given (it must exist), otherwise the first config file found in
    /// the working directory or the user config directory, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_locations().into_iter().find(|p| p.is_file()),
        };
        let Some(path) = path else {
            log::debug!("no configuration file found, using defaults");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml_str(&raw)?;
        log::info!("loaded configuration from {}", path.display());
        Ok(config)
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(dir) = dirs::config_dir() {
            locations.push(dir.join("workdesk").join(CONFIG_FILE_NAME));
        }
        locations
    }

    /// Applies `WORKDESK_BASE_DIR` and `WORKDESK_DEVELOPER` when set.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var_os(ENV_BASE_DIR).map(PathBuf::from),
            std::env::var(ENV_DEVELOPER).ok(),
        );
    }

    pub fn apply_overrides(&mut self, base_dir: Option<PathBuf>, developer: Option<String>) {
        if let Some(base_dir) = base_dir.filter(|p| !p.as_os_str().is_empty()) {
            self.base_dir = base_dir;
        }
        if let Some(developer) = developer.filter(|h| !h.trim().is_empty()) {
            self.developer_handle = Some(developer);
        }
    }

    pub fn role_secrets(&self) -> Result<RoleSecrets> {
        RoleSecrets::with_overrides(&self.role_secrets).context("Invalid role_secrets entry")
    }

    pub fn is_done_word(&self, text: &str) -> bool {
        let text = text.trim().to_lowercase();
        self.done_words.iter().any(|w| w.trim().to_lowercase() == text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use workdesk_protocol::Role;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = DeskConfig::from_toml_str(
            r#"
            base_dir = "/srv/desk"
            developer_handle = "@ops"

            [role_secrets]
            Driver = "7777"
            "#,
        )
        .unwrap();

        assert_eq!(config.base_dir, PathBuf::from("/srv/desk"));
        assert_eq!(config.developer_handle.as_deref(), Some("@ops"));
        assert_eq!(config.done_words, DeskConfig::default().done_words);

        let secrets = config.role_secrets().unwrap();
        assert!(secrets.verify(Role::Driver, "7777"));
        assert!(!secrets.verify(Role::Driver, "2069"));
        assert!(secrets.verify(Role::Administrator, "0000"));
    }

    #[test]
    fn test_unknown_role_in_secrets_is_rejected() {
        let config = DeskConfig::from_toml_str("[role_secrets]\nPilot = \"1\"\n").unwrap();
        assert!(config.role_secrets().is_err());
    }

    #[test]
    fn test_overrides_ignore_blank_values() {
        let mut config = DeskConfig::default();
        config.apply_overrides(Some(PathBuf::new()), Some("  ".to_string()));
        assert_eq!(config, DeskConfig::default());

        config.apply_overrides(Some(PathBuf::from("/data")), Some("dev".to_string()));
        assert_eq!(config.base_dir, PathBuf::from("/data"));
        assert_eq!(config.developer_handle.as_deref(), Some("dev"));
    }

    #[test]
    fn test_done_words_are_case_insensitive() {
        let config = DeskConfig::default();
        assert!(config.is_done_word(" DONE "));
        assert!(config.is_done_word("Готово"));
        assert!(!config.is_done_word("not yet"));
    }
}
