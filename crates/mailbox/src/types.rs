use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use workdesk_protocol::{Role, TestScope, UserId};

pub(crate) const SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserRecord {
    /// `@handle` when known, otherwise the display name, otherwise the id.
    pub fn label(&self) -> String {
        match (&self.handle, self.display_name.trim()) {
            (Some(handle), _) => format!("@{handle}"),
            (None, name) if !name.is_empty() => name.to_string(),
            (None, _) => self.id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Unread,
    Read,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub recipient: UserId,
    pub subject: String,
    pub body: String,
    pub status: MessageStatus,
    /// Store-relative path of an attached file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_id: Option<u64>,
    #[serde(default)]
    pub created_at_ms: u64,
}

impl Message {
    pub fn is_unread(&self) -> bool {
        self.status == MessageStatus::Unread
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
    pub id: u64,
    pub header: String,
    pub link: String,
    pub scope: TestScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    #[serde(default)]
    pub created_at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: u64,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    pub score: u32,
    pub total: u32,
    #[serde(default)]
    pub recorded_at_ms: u64,
}

/// The whole durable state, persisted as one JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tables {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub tests: Vec<Test>,
    #[serde(default)]
    pub test_results: Vec<TestResult>,
    #[serde(default)]
    pub next_message_id: u64,
    #[serde(default)]
    pub next_test_id: u64,
    #[serde(default)]
    pub next_result_id: u64,
}

impl Tables {
    pub(crate) fn allocate_message_id(&mut self) -> u64 {
        self.next_message_id = self.next_message_id.max(1);
        let id = self.next_message_id;
        self.next_message_id += 1;
        id
    }

    pub(crate) fn allocate_test_id(&mut self) -> u64 {
        self.next_test_id = self.next_test_id.max(1);
        let id = self.next_test_id;
        self.next_test_id += 1;
        id
    }

    pub(crate) fn allocate_result_id(&mut self) -> u64 {
        self.next_result_id = self.next_result_id.max(1);
        let id = self.next_result_id;
        self.next_result_id += 1;
        id
    }

    pub fn user(&self, id: UserId) -> Option<&UserRecord> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Brings an older document up to the current schema. Counters are re-derived so ids
    /// never repeat even if the document was edited by hand.
    pub(crate) fn migrate(&mut self) -> bool {
        let mut changed = false;
        if self.version < SCHEMA_VERSION {
            self.version = SCHEMA_VERSION;
            changed = true;
        }
        let max_message = self.messages.iter().map(|m| m.id).max().unwrap_or(0);
        if self.next_message_id <= max_message {
            self.next_message_id = max_message + 1;
            changed = true;
        }
        let max_test = self.tests.iter().map(|t| t.id).max().unwrap_or(0);
        if self.next_test_id <= max_test {
            self.next_test_id = max_test + 1;
            changed = true;
        }
        let max_result = self.test_results.iter().map(|r| r.id).max().unwrap_or(0);
        if self.next_result_id <= max_result {
            self.next_result_id = max_result + 1;
            changed = true;
        }
        changed
    }
}

pub(crate) fn unix_ms(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
