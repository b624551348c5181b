//! Shared vocabulary of the workdesk: roles, permissions, inbound events, action tokens,
//! rendered screens and the error taxonomy every component reports through.

mod access;
mod action;
mod audience;
mod error;
mod event;
mod render;
mod roles;

pub use access::{normalize_handle, AccessGate, Permission};
pub use action::{Action, ShortToken, MAX_ACTION_BYTES, TOKEN_LEN};
pub use audience::{Audience, RoleBucket, RoleFilter, TestScope};
pub use error::{DeskError, Result};
pub use event::{
    sanitize_file_name, Command, Event, EventKind, PhotoVariant, Sender, Upload, UploadKind,
    UserId,
};
pub use render::{Button, ButtonTarget, MessageRef, Screen};
pub use roles::{Role, RoleSecrets};
