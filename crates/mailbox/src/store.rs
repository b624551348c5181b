use crate::error::{Result, StoreError};
use crate::types::{Tables, SCHEMA_VERSION};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

const STORE_FILE_NAME: &str = "desk.json";
const STORE_LOCK_NAME: &str = "desk.lock";

/// Durable users, messages, tests and test results.
///
/// The document is held in memory and rewritten atomically after every mutation, under an
/// exclusive lock file so a second process on the same folder cannot interleave writes.
pub struct DeskStore {
    path: PathBuf,
    lock_path: PathBuf,
    tables: Mutex<Tables>,
}

struct StoreLock {
    #[allow(dead_code)]
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl DeskStore {
    /// Opens (or initialises) the store inside `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|err| StoreError::io("create store dir", dir, err))?;
        let path = dir.join(STORE_FILE_NAME);
        let lock_path = dir.join(STORE_LOCK_NAME);

        let _lock = acquire_store_lock(&lock_path)?;
        let mut tables = load_or_init(&path)?;
        if tables.migrate() {
            log::debug!("store schema at {} upgraded to v{SCHEMA_VERSION}", path.display());
            save_tables(&path, &tables)?;
        }
        log::info!(
            "store opened: {} users, {} messages, {} tests",
            tables.users.len(),
            tables.messages.len(),
            tables.tests.len()
        );

        Ok(Self {
            path,
            lock_path,
            tables: Mutex::new(tables),
        })
    }

    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        f(&tables)
    }

    /// Applies `f` to a copy of the tables and persists it; memory is only updated once the
    /// document is on disk.
    pub fn write<R>(&self, f: impl FnOnce(&mut Tables) -> Result<R>) -> Result<R> {
        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let _lock = acquire_store_lock(&self.lock_path)?;
        let mut next = tables.clone();
        let out = f(&mut next)?;
        save_tables(&self.path, &next)?;
        *tables = next;
        Ok(out)
    }
}

fn acquire_store_lock(lock_path: &Path) -> Result<StoreLock> {
    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(lock_path)
        .map_err(|err| StoreError::io("open store lock", lock_path, err))?;
    file.lock_exclusive()
        .map_err(|err| StoreError::io("lock store", lock_path, err))?;
    Ok(StoreLock { file })
}

fn load_or_init(path: &Path) -> Result<Tables> {
    if !path.exists() {
        return Ok(Tables {
            version: SCHEMA_VERSION,
            ..Tables::default()
        });
    }
    let raw = std::fs::read_to_string(path).map_err(|err| StoreError::io("read store", path, err))?;
    serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn save_tables(path: &Path, tables: &Tables) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(tables)?;
    write_atomic(path, &bytes)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(STORE_FILE_NAME),
        std::process::id()
    ));

    {
        let mut file = File::create(&tmp).map_err(|err| StoreError::io("create tmp", &tmp, err))?;
        file.write_all(bytes)
            .map_err(|err| StoreError::io("write tmp", &tmp, err))?;
        file.sync_all()
            .map_err(|err| StoreError::io("sync tmp", &tmp, err))?;
    }

    std::fs::rename(&tmp, path).map_err(|err| StoreError::io("rename tmp", path, err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserRecord;

    #[test]
    fn test_write_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = DeskStore::open(dir.path()).unwrap();
            store
                .write(|t| {
                    t.users.push(UserRecord {
                        id: 1,
                        display_name: "Ann".into(),
                        handle: None,
                        role: None,
                    });
                    Ok(())
                })
                .unwrap();
        }
        let reopened = DeskStore::open(dir.path()).unwrap();
        assert_eq!(reopened.read(|t| t.users.len()), 1);
    }

    #[test]
    fn test_failed_mutation_leaves_memory_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = DeskStore::open(dir.path()).unwrap();
        let res: Result<()> = store.write(|t| {
            t.next_message_id = 99;
            Err(StoreError::InvalidInput("nope".into()))
        });
        assert!(res.is_err());
        assert_ne!(store.read(|t| t.next_message_id), 99);
    }

    #[test]
    fn test_old_document_is_upgraded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(STORE_FILE_NAME),
            r#"{"users":[{"id":5}],"messages":[{"id":7,"recipient":5,"subject":"s","body":"b","status":"unread"}]}"#,
        )
        .unwrap();
        let store = DeskStore::open(dir.path()).unwrap();
        assert_eq!(store.read(|t| t.version), SCHEMA_VERSION);
        assert_eq!(store.read(|t| t.next_message_id), 8);
        assert_eq!(store.read(|t| t.messages[0].test_id), None);
    }

    #[test]
    fn test_corrupt_document_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STORE_FILE_NAME), "{not json").unwrap();
        assert!(matches!(
            DeskStore::open(dir.path()),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
