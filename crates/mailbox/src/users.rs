use crate::error::{Result, StoreError};
use crate::store::DeskStore;
use crate::types::UserRecord;
use std::sync::Arc;
use workdesk_protocol::{normalize_handle, Role, UserId};

/// Registered users.
#[derive(Clone)]
pub struct UserDirectory {
    store: Arc<DeskStore>,
}

impl UserDirectory {
    pub fn new(store: Arc<DeskStore>) -> Self {
        Self { store }
    }

    pub fn get(&self, id: UserId) -> Option<UserRecord> {
        self.store.read(|t| t.user(id).cloned())
    }

    /// All users ordered by id.
    pub fn list(&self) -> Vec<UserRecord> {
        let mut users = self.store.read(|t| t.users.clone());
        users.sort_by_key(|u| u.id);
        users
    }

    pub fn with_role(&self, role: Role) -> Vec<UserRecord> {
        self.list()
            .into_iter()
            .filter(|u| u.role == Some(role))
            .collect()
    }

    pub fn find_by_handle(&self, handle: &str) -> Option<UserRecord> {
        let wanted = normalize_handle(handle)?;
        self.store.read(|t| {
            t.users
                .iter()
                .find(|u| u.handle.as_deref().and_then(normalize_handle).as_ref() == Some(&wanted))
                .cloned()
        })
    }

    /// Creates the user or refreshes name, handle and role of an existing one.
    pub fn register(
        &self,
        id: UserId,
        display_name: &str,
        handle: Option<&str>,
        role: Role,
    ) -> Result<UserRecord> {
        let record = UserRecord {
            id,
            display_name: display_name.trim().to_string(),
            handle: handle
                .map(|h| h.trim().trim_start_matches('@').to_string())
                .filter(|h| !h.is_empty()),
            role: Some(role),
        };
        self.store.write(|t| {
            match t.users.iter_mut().find(|u| u.id == id) {
                Some(existing) => *existing = record.clone(),
                None => t.users.push(record.clone()),
            }
            Ok(())
        })?;
        log::info!("registered user {} as {}", id, role);
        Ok(record)
    }

    pub fn set_role(&self, id: UserId, role: Option<Role>) -> Result<UserRecord> {
        let updated = self.store.write(|t| {
            let user = t
                .users
                .iter_mut()
                .find(|u| u.id == id)
                .ok_or_else(|| StoreError::not_found("user", id))?;
            user.role = role;
            Ok(user.clone())
        })?;
        log::info!("user {id} role set to {}", role.map_or("none", Role::as_str));
        Ok(updated)
    }

    /// Deletes the user record. Their messages stay and surface under "no role".
    pub fn remove(&self, id: UserId) -> Result<UserRecord> {
        let removed = self.store.write(|t| {
            let idx = t
                .users
                .iter()
                .position(|u| u.id == id)
                .ok_or_else(|| StoreError::not_found("user", id))?;
            Ok(t.users.remove(idx))
        })?;
        log::info!("removed user {id}");
        Ok(removed)
    }
}
