#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use workdesk_bot::{ChatTransport, Desk, DeskConfig, TransportResult};
use workdesk_protocol::{
    Action, ButtonTarget, Command, Event, EventKind, MessageRef, Role, Screen, Sender, Upload,
    UploadKind, UserId,
};

#[derive(Debug, Clone)]
pub enum Record {
    Sent(MessageRef, Screen),
    Edited(MessageRef, Screen),
    Deleted(MessageRef),
    Alert(UserId, String),
    Document(UserId, PathBuf),
}

#[derive(Default)]
pub struct RecordingTransport {
    next_id: AtomicI64,
    records: Mutex<Vec<Record>>,
}

impl RecordingTransport {
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    fn push(&self, record: Record) {
        self.records.lock().unwrap().push(record);
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_screen(&self, chat: UserId, screen: &Screen) -> TransportResult<MessageRef> {
        let message = MessageRef {
            chat_id: chat,
            message_id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
        };
        self.push(Record::Sent(message, screen.clone()));
        Ok(message)
    }

    async fn edit_screen(&self, message: &MessageRef, screen: &Screen) -> TransportResult<()> {
        self.push(Record::Edited(*message, screen.clone()));
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> TransportResult<()> {
        self.push(Record::Deleted(*message));
        Ok(())
    }

    async fn alert(&self, chat: UserId, text: &str) -> TransportResult<()> {
        self.push(Record::Alert(chat, text.to_string()));
        Ok(())
    }

    async fn send_document(
        &self,
        chat: UserId,
        path: &Path,
        _caption: Option<&str>,
    ) -> TransportResult<()> {
        self.push(Record::Document(chat, path.to_path_buf()));
        Ok(())
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub desk: Desk,
    pub transport: Arc<RecordingTransport>,
}

pub const DEVELOPER: &str = "ops";

pub fn user(id: UserId, handle: &str) -> Sender {
    Sender {
        id,
        display_name: handle.to_string(),
        handle: Some(handle.to_string()),
    }
}

impl Harness {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let config = DeskConfig {
            base_dir: dir.path().to_path_buf(),
            developer_handle: Some(DEVELOPER.to_string()),
            ..DeskConfig::default()
        };
        let transport = Arc::new(RecordingTransport::default());
        let desk = Desk::open(config, transport.clone()).expect("desk opens");
        Self {
            dir,
            desk,
            transport,
        }
    }

    pub fn base(&self) -> &Path {
        self.dir.path()
    }

    /// Registers directly in the directory, skipping the chat wizard.
    pub fn enroll(&self, sender: &Sender, role: Role) {
        self.desk
            .users()
            .register(sender.id, &sender.display_name, sender.handle.as_deref(), role)
            .expect("register");
    }

    pub async fn command(&self, sender: &Sender, command: Command) {
        self.deliver(sender, EventKind::Command(command)).await;
    }

    pub async fn text(&self, sender: &Sender, text: &str) {
        self.deliver(sender, EventKind::Text(text.to_string())).await;
    }

    pub async fn action(&self, sender: &Sender, action: Action) {
        self.deliver(sender, EventKind::Action(action)).await;
    }

    pub async fn upload(&self, sender: &Sender, name: &str, bytes: &[u8]) {
        let upload = Upload {
            kind: UploadKind::Document,
            file_name: Some(name.to_string()),
            unique_id: format!("u{}", bytes.len()),
            bytes: bytes.to_vec(),
        };
        self.deliver(sender, EventKind::Upload(upload)).await;
    }

    async fn deliver(&self, sender: &Sender, kind: EventKind) {
        self.desk.handle(Event::new(sender.clone(), kind)).await;
    }

    /// Presses the newest visible button with `label`.
    pub async fn press(&self, sender: &Sender, label: &str) {
        let action = self
            .screens(sender.id)
            .iter()
            .rev()
            .find_map(|s| s.find_action(label).cloned())
            .unwrap_or_else(|| panic!("no button '{label}' for user {}", sender.id));
        self.action(sender, action).await;
    }

    /// Presses `label` in the row that also holds a button called `row`.
    pub async fn press_in_row(&self, sender: &Sender, row: &str, label: &str) {
        let action = self
            .screens(sender.id)
            .iter()
            .rev()
            .flat_map(|s| s.rows.iter())
            .find(|r| r.iter().any(|b| b.label == row))
            .and_then(|r| r.iter().find(|b| b.label == label))
            .and_then(|b| match &b.target {
                ButtonTarget::Action(action) => Some(action.clone()),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no '{label}' next to '{row}' for user {}", sender.id));
        self.action(sender, action).await;
    }

    /// Every screen shown to `chat`, in order (sends and edits).
    pub fn screens(&self, chat: UserId) -> Vec<Screen> {
        self.transport
            .records()
            .into_iter()
            .filter_map(|r| match r {
                Record::Sent(m, s) | Record::Edited(m, s) if m.chat_id == chat => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self, chat: UserId) -> String {
        self.screens(chat)
            .last()
            .map(|s| s.text.clone())
            .unwrap_or_default()
    }

    pub fn saw_text(&self, chat: UserId, needle: &str) -> bool {
        self.screens(chat).iter().any(|s| s.text.contains(needle))
    }

    pub fn alerts(&self, chat: UserId) -> Vec<String> {
        self.transport
            .records()
            .into_iter()
            .filter_map(|r| match r {
                Record::Alert(c, text) if c == chat => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn documents(&self, chat: UserId) -> Vec<PathBuf> {
        self.transport
            .records()
            .into_iter()
            .filter_map(|r| match r {
                Record::Document(c, path) if c == chat => Some(path),
                _ => None,
            })
            .collect()
    }
}
