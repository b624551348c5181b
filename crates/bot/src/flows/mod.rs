//! Conversation handlers.
//!
//! Each handler receives the [`Turn`] (who is acting, with what permission, on which
//! session), performs its effects and returns the [`Step`] the session should take.

pub(crate) mod admin;
pub(crate) mod audit;
pub(crate) mod browse;
pub(crate) mod compose;
pub(crate) mod files;
pub(crate) mod mail;
pub(crate) mod registration;
pub(crate) mod search;
pub(crate) mod test_links;

use workdesk_mailbox::UserRecord;
use workdesk_protocol::{AccessGate, Permission, Result, Role, Sender, UserId};
use workdesk_session::{SessionContext, Step};

pub(crate) type Outcome = Result<Step>;

/// One inbound update being processed.
pub(crate) struct Turn<'a> {
    pub sender: &'a Sender,
    pub user: Option<UserRecord>,
    pub permission: Permission,
    pub session: &'a mut SessionContext,
    /// Whether the next render may edit the session's menu message in place
    pub edit_menu: bool,
}

impl Turn<'_> {
    pub fn chat(&self) -> UserId {
        self.sender.id
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().and_then(|u| u.role)
    }

    pub fn require(&self, needed: Permission) -> Result<()> {
        AccessGate::require(self.permission, needed)
    }

    /// Role folder the user works in; admins without a role use the administrator folder.
    pub fn work_role(&self) -> Option<Role> {
        match self.role() {
            Some(role) => Some(role),
            None if self.permission.is_admin() => Some(Role::Administrator),
            None => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.permission.is_admin()
    }
}
