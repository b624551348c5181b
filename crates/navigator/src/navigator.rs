use crate::error::{NavigatorError, Result};
use crate::layout::{
    display_rel, join_rel, parent_within, top_role_folder, StoreLayout, RESERVED_FOLDER,
};
use std::path::PathBuf;
use workdesk_protocol::{sanitize_file_name, Role, ShortToken};
use workdesk_session::{ShortTokenRegistry, TokenTarget};

/// One folder or file of a listing together with the token that addresses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub rel: String,
    pub token: ShortToken,
}

/// Where the "up" button leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpTarget {
    /// Already at the root: the button leaves the browser
    ExitToMenu,
    Parent(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub root: String,
    pub rel: String,
    pub folders: Vec<Entry>,
    pub files: Vec<Entry>,
    pub up: UpTarget,
}

impl Listing {
    pub fn display_path(&self) -> String {
        display_rel(&self.rel)
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removed {
    File,
    Folder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    /// Store-relative path of the written file
    pub rel: String,
    pub name: String,
    /// Role whose folder the upload landed in, if any
    pub role: Option<Role>,
}

/// Root-contained access to the file store.
#[derive(Debug, Clone)]
pub struct Navigator {
    layout: StoreLayout,
}

impl Navigator {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Lists `rel` under `root`, folders first, each group sorted by name.
    ///
    /// The token table is reset before the listing's tokens are issued, so every token from
    /// the previous render stops resolving.
    pub fn list(
        &self,
        root: &str,
        rel: &str,
        tokens: &mut ShortTokenRegistry<TokenTarget>,
    ) -> Result<Listing> {
        let (rel, path) = self.layout.resolve_within(root, rel)?;
        let root = crate::layout::normalize_rel(root)?;
        let meta = std::fs::metadata(&path)
            .map_err(|_| NavigatorError::NotFound(display_rel(&rel)))?;
        if !meta.is_dir() {
            return Err(NavigatorError::NotADirectory(display_rel(&rel)));
        }

        let mut names: Vec<(String, bool)> = std::fs::read_dir(&path)
            .map_err(|err| NavigatorError::io(&path, err))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_str()?.to_string();
                let is_dir = entry.file_type().ok()?.is_dir();
                Some((name, is_dir))
            })
            .filter(|(name, _)| !(rel.is_empty() && name == RESERVED_FOLDER))
            .collect();
        names.sort();

        tokens.reset();
        let mut folders = Vec::new();
        let mut files = Vec::new();
        for (name, is_dir) in names {
            let entry_rel = join_rel(&rel, &name);
            let token = tokens.issue(TokenTarget::Path(entry_rel.clone()))?;
            let entry = Entry {
                name,
                rel: entry_rel,
                token,
            };
            if is_dir {
                folders.push(entry);
            } else {
                files.push(entry);
            }
        }

        let up = parent_within(&root, &rel).map_or(UpTarget::ExitToMenu, UpTarget::Parent);
        log::debug!(
            "listed {} ({} folders, {} files)",
            display_rel(&rel),
            folders.len(),
            files.len()
        );
        Ok(Listing {
            root,
            rel,
            folders,
            files,
            up,
        })
    }

    /// Removes a file, or a folder with everything below it.
    pub fn delete(&self, root: &str, rel: &str) -> Result<Removed> {
        let (rel, path) = self.layout.resolve_within(root, rel)?;
        if rel == crate::layout::normalize_rel(root)? {
            return Err(NavigatorError::InvalidPath(display_rel(&rel)));
        }
        let meta = std::fs::symlink_metadata(&path)
            .map_err(|_| NavigatorError::NotFound(display_rel(&rel)))?;

        let removed = if meta.is_dir() {
            std::fs::remove_dir_all(&path).map(|()| Removed::Folder)
        } else {
            std::fs::remove_file(&path).map(|()| Removed::File)
        };
        match removed {
            Ok(kind) => {
                log::info!("deleted {:?} {}", kind, display_rel(&rel));
                Ok(kind)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(NavigatorError::NotFound(display_rel(&rel)))
            }
            Err(err) => Err(NavigatorError::io(path, err)),
        }
    }

    /// Writes an uploaded file into the folder `rel`, creating the folder if needed.
    pub fn receive(&self, root: &str, rel: &str, name: &str, bytes: &[u8]) -> Result<Received> {
        let (folder_rel, folder) = self.layout.resolve_within(root, rel)?;
        let name = sanitize_file_name(name)
            .filter(|n| n != RESERVED_FOLDER)
            .ok_or_else(|| NavigatorError::InvalidPath(name.to_string()))?;

        std::fs::create_dir_all(&folder).map_err(|err| NavigatorError::io(&folder, err))?;
        let target = folder.join(&name);
        std::fs::write(&target, bytes).map_err(|err| NavigatorError::io(&target, err))?;

        let role = top_role_folder(&folder_rel);
        log::info!(
            "received {} ({} bytes) into {}",
            name,
            bytes.len(),
            display_rel(&folder_rel)
        );
        Ok(Received {
            rel: join_rel(&folder_rel, &name),
            name,
            role,
        })
    }

    /// Absolute path of an existing file under `root`.
    pub fn file(&self, root: &str, rel: &str) -> Result<PathBuf> {
        let (rel, path) = self.layout.resolve_within(root, rel)?;
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(NavigatorError::NotAFile(display_rel(&rel))),
            Err(_) => Err(NavigatorError::NotFound(display_rel(&rel))),
        }
    }

    /// Checks that `rel` is an existing folder under `root`.
    pub fn folder(&self, root: &str, rel: &str) -> Result<String> {
        let (rel, path) = self.layout.resolve_within(root, rel)?;
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => Ok(rel),
            Ok(_) => Err(NavigatorError::NotADirectory(display_rel(&rel))),
            Err(_) => Err(NavigatorError::NotFound(display_rel(&rel))),
        }
    }
}
