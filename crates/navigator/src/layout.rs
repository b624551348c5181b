use crate::error::{NavigatorError, Result};
use std::path::{Path, PathBuf};
use workdesk_protocol::Role;

/// Folder every member can read.
pub const SHARED_ROOT: &str = "Shared";
/// Subfolder of the shared root created on first run.
pub const PERSONAL_FOLDER: &str = "Personal";
/// Internal folder holding the durable store and mail attachments; never listed.
pub const RESERVED_FOLDER: &str = ".workdesk";

/// Physical layout of the file store. All paths handed around the application are
/// store-relative strings with `/` separators; `""` is the store root.
#[derive(Debug, Clone)]
pub struct StoreLayout {
    base: PathBuf,
}

impl StoreLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn internal_dir(&self) -> PathBuf {
        self.base.join(RESERVED_FOLDER)
    }

    pub fn role_root(role: Role) -> String {
        role.as_str().to_string()
    }

    /// Creates the role roots, the shared root with its personal subfolder and the internal
    /// folder. Existing folders are left untouched.
    pub fn ensure_directories(&self) -> Result<()> {
        let mut wanted: Vec<PathBuf> = Role::ALL
            .into_iter()
            .map(|role| self.base.join(role.as_str()))
            .collect();
        wanted.push(self.base.join(SHARED_ROOT).join(PERSONAL_FOLDER));
        wanted.push(self.internal_dir());

        for dir in wanted {
            if !dir.is_dir() {
                std::fs::create_dir_all(&dir).map_err(|err| NavigatorError::io(&dir, err))?;
                log::info!("created folder {}", dir.display());
            }
        }
        Ok(())
    }

    pub fn absolute(&self, rel: &str) -> PathBuf {
        if rel.is_empty() {
            self.base.clone()
        } else {
            self.base.join(rel)
        }
    }

    /// Normalises `rel` and checks that it stays inside `root`, both lexically and after
    /// resolving symlinks when the target exists.
    pub fn resolve_within(&self, root: &str, rel: &str) -> Result<(String, PathBuf)> {
        let root = normalize_rel(root)?;
        let rel = normalize_rel(rel)?;
        if !is_within(&root, &rel) || is_reserved(&rel) {
            return Err(NavigatorError::OutsideRoot(display_rel(&rel)));
        }

        let path = self.absolute(&rel);
        if let Ok(canonical) = path.canonicalize() {
            let root_path = self.absolute(&root);
            let canonical_root = root_path
                .canonicalize()
                .map_err(|err| NavigatorError::io(&root_path, err))?;
            if !canonical.starts_with(&canonical_root) {
                return Err(NavigatorError::OutsideRoot(display_rel(&rel)));
            }
        }
        Ok((rel, path))
    }
}

/// Lexically normalises a store-relative path. `..` is rejected rather than resolved.
pub fn normalize_rel(raw: &str) -> Result<String> {
    let unified = raw.trim().replace('\\', "/");
    let mut parts = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => {}
            ".." => return Err(NavigatorError::InvalidPath(raw.to_string())),
            other => parts.push(other),
        }
    }
    Ok(parts.join("/"))
}

pub fn join_rel(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// `rel` equals `root` or lies below it. Both must be normalised.
pub fn is_within(root: &str, rel: &str) -> bool {
    root.is_empty()
        || rel == root
        || rel
            .strip_prefix(root)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Parent of `rel` clamped at `root`; `None` when already at the root.
pub fn parent_within(root: &str, rel: &str) -> Option<String> {
    if rel == root || !is_within(root, rel) {
        return None;
    }
    let parent = rel.rsplit_once('/').map_or("", |(parent, _)| parent);
    if is_within(root, parent) {
        Some(parent.to_string())
    } else {
        Some(root.to_string())
    }
}

/// Role whose folder is the first segment of an upload path, if any.
pub fn top_role_folder(upload_path: &str) -> Option<Role> {
    let unified = upload_path.trim().replace('\\', "/");
    let stripped = unified.trim_start_matches(|c: char| c == '.' || c == '/');
    let first = stripped.split('/').next()?;
    Role::from_name(first)
}

/// Human-facing form of a store-relative path.
pub fn display_rel(rel: &str) -> String {
    format!("/{rel}")
}

fn is_reserved(rel: &str) -> bool {
    rel.split('/').next() == Some(RESERVED_FOLDER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_rel() {
        assert_eq!(normalize_rel("./Driver//reports/").unwrap(), "Driver/reports");
        assert_eq!(normalize_rel("Shared\\Personal").unwrap(), "Shared/Personal");
        assert_eq!(normalize_rel("").unwrap(), "");
        assert!(normalize_rel("Driver/../Director").is_err());
    }

    #[test]
    fn test_parent_is_clamped_at_root() {
        assert_eq!(parent_within("Driver", "Driver"), None);
        assert_eq!(
            parent_within("Driver", "Driver/reports/2024"),
            Some("Driver/reports".to_string())
        );
        assert_eq!(
            parent_within("Driver", "Driver/reports"),
            Some("Driver".to_string())
        );
        assert_eq!(parent_within("", "Driver"), Some(String::new()));
        assert_eq!(parent_within("", ""), None);
    }

    #[test]
    fn test_within_checks_segment_boundaries() {
        assert!(is_within("Driver", "Driver/a"));
        assert!(!is_within("Driver", "Drivers/a"));
        assert!(is_within("", "anything"));
    }

    #[test]
    fn test_top_role_folder() {
        assert_eq!(top_role_folder("Driver/reports"), Some(Role::Driver));
        assert_eq!(top_role_folder("./driver/reports"), Some(Role::Driver));
        assert_eq!(
            top_role_folder(".\\Production Head\\plans"),
            Some(Role::ProductionHead)
        );
        assert_eq!(top_role_folder("Shared/Driver"), None);
        assert_eq!(top_role_folder(""), None);
    }

    #[test]
    fn test_reserved_folder_is_outside_every_root() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.ensure_directories().unwrap();
        assert!(matches!(
            layout.resolve_within("", ".workdesk/desk.json"),
            Err(NavigatorError::OutsideRoot(_))
        ));
        assert!(matches!(
            layout.resolve_within("Driver", "Director"),
            Err(NavigatorError::OutsideRoot(_))
        ));
        let (rel, path) = layout.resolve_within("Driver", "./Driver/x").unwrap();
        assert_eq!(rel, "Driver/x");
        assert_eq!(path, dir.path().join("Driver/x"));
    }
}
