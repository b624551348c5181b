//! Discrete action tokens attached to menu buttons.
//!
//! Wire grammar is `prefix` or `prefix|payload` (the legacy `prefix:payload` form is accepted
//! on input). Payloads are literals (role names, numeric ids) or short tokens issued by the
//! session's token registry.

use crate::audience::{RoleBucket, RoleFilter};
use crate::error::{DeskError, Result};
use crate::event::UserId;
use crate::roles::Role;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Upper bound for an encoded action, matching the callback size chat platforms accept.
pub const MAX_ACTION_BYTES: usize = 64;

/// Length of a short token: generation tag plus random body.
pub const TOKEN_LEN: usize = 8;

/// Fixed-length alphanumeric key that stands in for a longer value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortToken(String);

impl ShortToken {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.len() != TOKEN_LEN || !raw.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(DeskError::invalid(format!("malformed token '{raw}'")));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Main menu entries
    MainMenu,
    FilesShared,
    FilesRole,
    SearchStart,
    MailMain,
    AdminPanel,

    // Plain browsing
    BrowseDir(ShortToken),
    BrowseFile(ShortToken),
    BrowseUp,

    // Search
    SearchFile(ShortToken),
    SearchDir(ShortToken),
    SearchAgain,
    SearchFinish,

    // Mailbox
    MailUnread,
    MailRead,
    MailOpen(u64),
    MailAck(u64),
    MailView(u64),
    MailCompose,
    MailAll,
    MailTests,
    MailExit,

    // Composition
    ComposeGroup,
    ComposeOne,
    ComposeRole(RoleFilter),
    ComposeUser(ShortToken),
    ComposeAttachTest,
    ComposePickTest(ShortToken),
    ComposeSkip,
    ComposeBack,
    ComposeSend,

    // Tests
    TestView(u64),
    TestDelete(u64),
    TestsBack,
    TestCreate,
    TestScopeRole,
    TestScopeUser,
    TestScopeNone,
    TestRole(Role),
    TestUser(ShortToken),
    TestConfirm,
    TestCancel,

    // Audit of all messages
    AuditBucket(RoleBucket),
    AuditView(u64),
    AuditDelete(u64),
    AuditRefresh,
    AuditBack,

    // Admin console
    AdminRestart,
    AdminUsers,
    AdminReset(UserId),
    AdminBroadcast,
    AdminFiles,
    AdminResults,
    AdminExit,

    // File manager
    FmOpen(ShortToken),
    FmRemove(ShortToken),
    FmFile(ShortToken),
    FmFileDelete(ShortToken),
    FmFileSend(ShortToken),
    FmUp,
    FmUpload,
    FmExit,

    // Upload wizard
    UploadAttachYes,
    UploadAttachNo,
    UploadPickTest(ShortToken),
}

impl Action {
    /// Entry points of the main menu. They start or end conversations globally.
    pub const fn is_menu_entry(&self) -> bool {
        matches!(
            self,
            Action::MainMenu
                | Action::FilesShared
                | Action::FilesRole
                | Action::SearchStart
                | Action::MailMain
                | Action::AdminPanel
        )
    }

    pub const fn prefix(&self) -> &'static str {
        match self {
            Action::MainMenu => "main_menu",
            Action::FilesShared => "files_shared",
            Action::FilesRole => "files_role",
            Action::SearchStart => "search_files",
            Action::MailMain => "mail_main",
            Action::AdminPanel => "admin_panel",
            Action::BrowseDir(_) => "dir",
            Action::BrowseFile(_) => "file",
            Action::BrowseUp => "files_back",
            Action::SearchFile(_) => "search_file",
            Action::SearchDir(_) => "search_dir",
            Action::SearchAgain => "search_again",
            Action::SearchFinish => "search_back",
            Action::MailUnread => "mail_unread",
            Action::MailRead => "mail_read",
            Action::MailOpen(_) => "mail_open",
            Action::MailAck(_) => "mail_ack",
            Action::MailView(_) => "mail_view",
            Action::MailCompose => "mail_send",
            Action::MailAll => "mail_all",
            Action::MailTests => "mail_tests",
            Action::MailExit => "mail_exit",
            Action::ComposeGroup => "send_group",
            Action::ComposeOne => "send_one",
            Action::ComposeRole(_) => "group",
            Action::ComposeUser(_) => "to_user",
            Action::ComposeAttachTest => "attach_test",
            Action::ComposePickTest(_) => "pick_test",
            Action::ComposeSkip => "skip_attach",
            Action::ComposeBack => "compose_back",
            Action::ComposeSend => "send_confirm",
            Action::TestView(_) => "test_view",
            Action::TestDelete(_) => "test_del",
            Action::TestsBack => "tests_back",
            Action::TestCreate => "test_create",
            Action::TestScopeRole => "test_scope_role",
            Action::TestScopeUser => "test_scope_user",
            Action::TestScopeNone => "test_scope_none",
            Action::TestRole(_) => "test_role",
            Action::TestUser(_) => "test_user",
            Action::TestConfirm => "test_yes",
            Action::TestCancel => "test_no",
            Action::AuditBucket(_) => "audit_role",
            Action::AuditView(_) => "audit_view",
            Action::AuditDelete(_) => "audit_del",
            Action::AuditRefresh => "audit_refresh",
            Action::AuditBack => "audit_back",
            Action::AdminRestart => "admin_restart",
            Action::AdminUsers => "admin_users",
            Action::AdminReset(_) => "admin_reset",
            Action::AdminBroadcast => "admin_broadcast",
            Action::AdminFiles => "admin_files",
            Action::AdminResults => "admin_results",
            Action::AdminExit => "admin_exit",
            Action::FmOpen(_) => "fm_dir",
            Action::FmRemove(_) => "fm_rm",
            Action::FmFile(_) => "fm_file",
            Action::FmFileDelete(_) => "fm_file_rm",
            Action::FmFileSend(_) => "fm_file_get",
            Action::FmUp => "fm_up",
            Action::FmUpload => "fm_upload",
            Action::FmExit => "fm_exit",
            Action::UploadAttachYes => "upload_test_yes",
            Action::UploadAttachNo => "upload_test_no",
            Action::UploadPickTest(_) => "upload_test",
        }
    }

    fn payload(&self) -> Option<String> {
        match self {
            Action::BrowseDir(token)
            | Action::BrowseFile(token)
            | Action::SearchFile(token)
            | Action::SearchDir(token)
            | Action::ComposeUser(token)
            | Action::ComposePickTest(token)
            | Action::TestUser(token)
            | Action::FmOpen(token)
            | Action::FmRemove(token)
            | Action::FmFile(token)
            | Action::FmFileDelete(token)
            | Action::FmFileSend(token)
            | Action::UploadPickTest(token) => Some(token.to_string()),
            Action::MailOpen(id)
            | Action::MailAck(id)
            | Action::MailView(id)
            | Action::TestView(id)
            | Action::TestDelete(id)
            | Action::AuditView(id)
            | Action::AuditDelete(id) => Some(id.to_string()),
            Action::AdminReset(user) => Some(user.to_string()),
            Action::ComposeRole(filter) => Some(filter.to_string()),
            Action::TestRole(role) => Some(role.as_str().to_string()),
            Action::AuditBucket(bucket) => Some(bucket.to_string()),
            _ => None,
        }
    }

    /// Wire form `prefix` or `prefix|payload`.
    ///
    /// Every payload is bounded (tokens, integers, role names), so the result always fits
    /// within [`MAX_ACTION_BYTES`].
    pub fn encode(&self) -> String {
        match self.payload() {
            Some(payload) => format!("{}|{payload}", self.prefix()),
            None => self.prefix().to_string(),
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        if raw.len() > MAX_ACTION_BYTES {
            return Err(DeskError::invalid("action payload too long"));
        }
        let (prefix, payload) = split_action(raw);
        let unknown = || DeskError::invalid(format!("unknown action '{raw}'"));

        let action = match (prefix, payload) {
            ("main_menu", None) => Action::MainMenu,
            ("files_shared", None) => Action::FilesShared,
            ("files_role", None) => Action::FilesRole,
            ("search_files", None) => Action::SearchStart,
            ("mail_main", None) => Action::MailMain,
            ("admin_panel", None) => Action::AdminPanel,
            ("dir", Some(p)) => Action::BrowseDir(ShortToken::parse(p)?),
            ("file", Some(p)) => Action::BrowseFile(ShortToken::parse(p)?),
            ("files_back", None) => Action::BrowseUp,
            ("search_file", Some(p)) => Action::SearchFile(ShortToken::parse(p)?),
            ("search_dir", Some(p)) => Action::SearchDir(ShortToken::parse(p)?),
            ("search_again", None) => Action::SearchAgain,
            ("search_back", None) => Action::SearchFinish,
            ("mail_unread", None) => Action::MailUnread,
            ("mail_read", None) => Action::MailRead,
            ("mail_open", Some(p)) => Action::MailOpen(parse_id(p)?),
            ("mail_ack", Some(p)) => Action::MailAck(parse_id(p)?),
            ("mail_view", Some(p)) => Action::MailView(parse_id(p)?),
            ("mail_send", None) => Action::MailCompose,
            ("mail_all", None) => Action::MailAll,
            ("mail_tests", None) => Action::MailTests,
            ("mail_exit", None) => Action::MailExit,
            ("send_group", None) => Action::ComposeGroup,
            ("send_one", None) => Action::ComposeOne,
            ("group", Some(p)) => Action::ComposeRole(RoleFilter::parse(p).ok_or_else(unknown)?),
            ("to_user", Some(p)) => Action::ComposeUser(ShortToken::parse(p)?),
            ("attach_test", None) => Action::ComposeAttachTest,
            ("pick_test", Some(p)) => Action::ComposePickTest(ShortToken::parse(p)?),
            ("skip_attach", None) => Action::ComposeSkip,
            ("compose_back", None) => Action::ComposeBack,
            ("send_confirm", None) => Action::ComposeSend,
            ("test_view", Some(p)) => Action::TestView(parse_id(p)?),
            ("test_del", Some(p)) => Action::TestDelete(parse_id(p)?),
            ("tests_back", None) => Action::TestsBack,
            ("test_create", None) => Action::TestCreate,
            ("test_scope_role", None) => Action::TestScopeRole,
            ("test_scope_user", None) => Action::TestScopeUser,
            ("test_scope_none", None) => Action::TestScopeNone,
            ("test_role", Some(p)) => Action::TestRole(p.parse()?),
            ("test_user", Some(p)) => Action::TestUser(ShortToken::parse(p)?),
            ("test_yes", None) => Action::TestConfirm,
            ("test_no", None) => Action::TestCancel,
            ("audit_role", Some(p)) => {
                Action::AuditBucket(RoleBucket::parse(p).ok_or_else(unknown)?)
            }
            ("audit_view", Some(p)) => Action::AuditView(parse_id(p)?),
            ("audit_del", Some(p)) => Action::AuditDelete(parse_id(p)?),
            ("audit_refresh", None) => Action::AuditRefresh,
            ("audit_back", None) => Action::AuditBack,
            ("admin_restart", None) => Action::AdminRestart,
            ("admin_users", None) => Action::AdminUsers,
            ("admin_reset", Some(p)) => Action::AdminReset(
                p.trim()
                    .parse()
                    .map_err(|_| DeskError::invalid(format!("bad user id '{p}'")))?,
            ),
            ("admin_broadcast", None) => Action::AdminBroadcast,
            ("admin_files", None) => Action::AdminFiles,
            ("admin_results", None) => Action::AdminResults,
            ("admin_exit", None) => Action::AdminExit,
            ("fm_dir", Some(p)) => Action::FmOpen(ShortToken::parse(p)?),
            ("fm_rm", Some(p)) => Action::FmRemove(ShortToken::parse(p)?),
            ("fm_file", Some(p)) => Action::FmFile(ShortToken::parse(p)?),
            ("fm_file_rm", Some(p)) => Action::FmFileDelete(ShortToken::parse(p)?),
            ("fm_file_get", Some(p)) => Action::FmFileSend(ShortToken::parse(p)?),
            ("fm_up", None) => Action::FmUp,
            ("fm_upload", None) => Action::FmUpload,
            ("fm_exit", None) => Action::FmExit,
            ("upload_test_yes", None) => Action::UploadAttachYes,
            ("upload_test_no", None) => Action::UploadAttachNo,
            ("upload_test", Some(p)) => Action::UploadPickTest(ShortToken::parse(p)?),
            _ => return Err(unknown()),
        };
        Ok(action)
    }
}

/// Splits at the first `|` or `:`, whichever comes first.
fn split_action(raw: &str) -> (&str, Option<&str>) {
    let raw = raw.trim();
    match raw.find(|c: char| c == '|' || c == ':') {
        Some(idx) => (&raw[..idx], Some(&raw[idx + 1..])),
        None => (raw, None),
    }
}

fn parse_id(raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| DeskError::invalid(format!("bad id '{raw}'")))
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Action::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn token() -> ShortToken {
        ShortToken::parse("Ab3dEf9h").unwrap()
    }

    #[test]
    fn test_both_separators_parse() {
        assert_eq!(Action::parse("dir|Ab3dEf9h").unwrap(), Action::BrowseDir(token()));
        assert_eq!(Action::parse("dir:Ab3dEf9h").unwrap(), Action::BrowseDir(token()));
        assert_eq!(Action::parse("mail_ack:42").unwrap(), Action::MailAck(42));
        assert_eq!(
            Action::parse("group|assistant director").unwrap(),
            Action::ComposeRole(RoleFilter::Only(Role::AssistantDirector))
        );
        assert_eq!(
            Action::parse("group|ALL").unwrap(),
            Action::ComposeRole(RoleFilter::All)
        );
        assert_eq!(
            Action::parse("audit_role|none").unwrap(),
            Action::AuditBucket(RoleBucket::NoRole)
        );
    }

    #[test]
    fn test_rejects_unknown_and_malformed() {
        assert!(Action::parse("teleport").is_err());
        assert!(Action::parse("dir").is_err());
        assert!(Action::parse("main_menu|extra").is_err());
        assert!(Action::parse("dir|short").is_err());
        assert!(Action::parse("mail_open|abc").is_err());
        assert!(Action::parse(&"x".repeat(MAX_ACTION_BYTES + 1)).is_err());
    }

    #[test]
    fn test_encoded_actions_fit_and_parse_back() {
        let samples = vec![
            Action::MainMenu,
            Action::BrowseDir(token()),
            Action::MailOpen(u64::MAX),
            Action::AdminReset(i64::MIN),
            Action::ComposeRole(RoleFilter::Only(Role::ProductionWorker)),
            Action::TestRole(Role::AssistantDirector),
            Action::AuditBucket(RoleBucket::Role(Role::ProductionHead)),
            Action::UploadPickTest(token()),
        ];
        for action in samples {
            let wire = action.encode();
            assert!(wire.len() <= MAX_ACTION_BYTES, "{wire} too long");
            assert_eq!(Action::parse(&wire).unwrap(), action);
        }
    }

    #[test]
    fn test_menu_entries() {
        assert!(Action::MailMain.is_menu_entry());
        assert!(Action::AdminPanel.is_menu_entry());
        assert!(!Action::SearchAgain.is_menu_entry());
        assert!(!Action::BrowseUp.is_menu_entry());
    }
}
