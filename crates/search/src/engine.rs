use crate::error::{Result, SearchError};
use crate::fuzzy::NameMatcher;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use workdesk_navigator::{join_rel, normalize_rel, StoreLayout, RESERVED_FOLDER, SHARED_ROOT};
use workdesk_protocol::{Permission, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    File,
    Folder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub kind: HitKind,
    pub name: String,
    /// Store-relative path of the match
    pub rel: String,
    /// Search root the match was found under
    pub root: String,
    pub score: f64,
}

/// Roots a caller may search: the whole store for admins, otherwise the caller's role folder
/// and the shared folder.
pub fn search_roots(permission: Permission, role: Option<Role>) -> Vec<String> {
    if permission.is_admin() {
        return vec![String::new()];
    }
    let mut roots = Vec::new();
    if let Some(role) = role {
        roots.push(StoreLayout::role_root(role));
    }
    roots.push(SHARED_ROOT.to_string());
    roots
}

/// Fuzzy name search over folders of the store.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    base: PathBuf,
}

impl SearchEngine {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Walks every root recursively and ranks matching file and folder names, best first.
    /// Roots that do not exist are skipped.
    pub fn search(&self, roots: &[String], query: &str) -> Result<Vec<SearchHit>> {
        let matcher = NameMatcher::new(query);
        if matcher.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let mut hits = Vec::new();
        for root in roots {
            let root = normalize_rel(root).map_err(|_| SearchError::InvalidRoot(root.clone()))?;
            let root_path = if root.is_empty() {
                self.base.clone()
            } else {
                self.base.join(&root)
            };
            if !root_path.is_dir() {
                log::debug!("search root '{root}' is missing, skipping");
                continue;
            }
            self.walk_root(&root, &root_path, &matcher, &mut hits);
        }

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        log::debug!(
            "search {:?} over {} roots: {} hits",
            matcher.tokens(),
            roots.len(),
            hits.len()
        );
        Ok(hits)
    }

    fn walk_root(&self, root: &str, root_path: &Path, matcher: &NameMatcher, hits: &mut Vec<SearchHit>) {
        let walker = WalkDir::new(root_path)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.file_name() != RESERVED_FOLDER);

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("search walk error under '{root}': {err}");
                    continue;
                }
            };
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            let score = matcher.score(name);
            if score <= 0.0 {
                continue;
            }
            let Some(rel) = self.relative(entry.path()) else {
                continue;
            };
            let kind = if entry.file_type().is_dir() {
                HitKind::Folder
            } else {
                HitKind::File
            };
            hits.push(SearchHit {
                kind,
                name: name.to_string(),
                rel,
                root: root.to_string(),
                score,
            });
        }
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.base).ok()?;
        let mut out = String::new();
        for part in rel.components() {
            out = join_rel(&out, part.as_os_str().to_str()?);
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roots_by_permission() {
        assert_eq!(search_roots(Permission::Admin, Some(Role::Administrator)), vec![""]);
        assert_eq!(
            search_roots(Permission::Member, Some(Role::Driver)),
            vec!["Driver", "Shared"]
        );
    }
}
