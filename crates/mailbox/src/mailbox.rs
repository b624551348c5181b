use crate::error::{Result, StoreError};
use crate::store::DeskStore;
use crate::types::{unix_ms, Message, MessageStatus, Test};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;
use workdesk_protocol::{Audience, DeskError, Role, RoleBucket, UserId};

/// Push channel used to tell a recipient that mail arrived.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user: UserId, text: &str) -> std::result::Result<(), DeskError>;
}

/// Notifier that drops everything, for a mailbox opened without a chat attached.
pub struct SilentNotifier;

#[async_trait]
impl Notifier for SilentNotifier {
    async fn notify(&self, _user: UserId, _text: &str) -> std::result::Result<(), DeskError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMail {
    pub subject: String,
    pub body: String,
    pub attachment: Option<String>,
    pub test_id: Option<u64>,
}

impl OutgoingMail {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            attachment: None,
            test_id: None,
        }
    }

    pub fn with_test(mut self, test_id: Option<u64>) -> Self {
        self.test_id = test_id;
        self
    }

    pub fn with_attachment(mut self, attachment: Option<String>) -> Self {
        self.attachment = attachment;
        self
    }
}

/// Result of opening and acknowledging a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgement {
    Read(Message),
    WithTest { message: Message, test: Test },
    /// The message pointed at a test that has since been deleted
    TestMissing { message: Message, test_id: u64 },
}

impl Acknowledgement {
    pub fn message(&self) -> &Message {
        match self {
            Self::Read(message)
            | Self::WithTest { message, .. }
            | Self::TestMissing { message, .. } => message,
        }
    }
}

pub struct Mailbox {
    store: Arc<DeskStore>,
    notifier: Arc<dyn Notifier>,
}

impl Mailbox {
    pub fn new(store: Arc<DeskStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Stores an unread message, then pushes a best-effort notification.
    pub async fn send(&self, recipient: UserId, mail: &OutgoingMail) -> Result<Message> {
        let mut sent = self.send_to_many(&[recipient], mail).await?;
        sent.pop()
            .ok_or_else(|| StoreError::InvalidInput("no recipient".into()))
    }

    /// One independent message per recipient, stored in a single document write and then
    /// announced to each recipient.
    pub async fn send_to_many(&self, recipients: &[UserId], mail: &OutgoingMail) -> Result<Vec<Message>> {
        let subject = mail.subject.trim();
        if subject.is_empty() {
            return Err(StoreError::InvalidInput("subject must not be empty".into()));
        }
        if recipients.is_empty() {
            return Ok(Vec::new());
        }
        let created_at_ms = unix_ms(SystemTime::now());
        let sent = self.store.write(|t| {
            let mut sent = Vec::with_capacity(recipients.len());
            for &recipient in recipients {
                let message = Message {
                    id: t.allocate_message_id(),
                    recipient,
                    subject: subject.to_string(),
                    body: mail.body.clone(),
                    status: MessageStatus::Unread,
                    attachment: mail.attachment.clone(),
                    test_id: mail.test_id,
                    created_at_ms,
                };
                t.messages.push(message.clone());
                sent.push(message);
            }
            Ok(sent)
        })?;
        log::debug!("{} messages stored for '{subject}'", sent.len());

        let text = format!("New message: {subject}");
        for message in &sent {
            if let Err(err) = self.notifier.notify(message.recipient, &text).await {
                log::debug!("mail notification to {} failed: {err}", message.recipient);
            }
        }
        Ok(sent)
    }

    pub async fn send_to_role(&self, role: Role, mail: &OutgoingMail) -> Result<Vec<Message>> {
        let recipients = self.recipients(&Audience::Role(role));
        self.send_to_many(&recipients, mail).await
    }

    pub async fn send_to_audience(&self, audience: &Audience, mail: &OutgoingMail) -> Result<Vec<Message>> {
        let recipients = self.recipients(audience);
        if recipients.is_empty() {
            log::debug!("audience {audience:?} has no recipients");
        }
        self.send_to_many(&recipients, mail).await
    }

    pub fn recipients(&self, audience: &Audience) -> Vec<UserId> {
        self.store.read(|t| {
            let mut ids: Vec<UserId> = match audience {
                Audience::Everyone => t.users.iter().map(|u| u.id).collect(),
                Audience::Role(role) => t
                    .users
                    .iter()
                    .filter(|u| u.role == Some(*role))
                    .map(|u| u.id)
                    .collect(),
                Audience::User(id) => t.user(*id).map(|u| vec![u.id]).unwrap_or_default(),
            };
            ids.sort_unstable();
            ids
        })
    }

    pub fn list_unread(&self, user: UserId) -> Vec<Message> {
        self.list_with_status(user, MessageStatus::Unread)
    }

    pub fn list_read(&self, user: UserId) -> Vec<Message> {
        self.list_with_status(user, MessageStatus::Read)
    }

    fn list_with_status(&self, user: UserId, status: MessageStatus) -> Vec<Message> {
        self.store.read(|t| {
            let mut messages: Vec<Message> = t
                .messages
                .iter()
                .filter(|m| m.recipient == user && m.status == status)
                .cloned()
                .collect();
            messages.sort_by(|a, b| b.id.cmp(&a.id));
            messages
        })
    }

    pub fn get(&self, id: u64) -> Result<Message> {
        self.store
            .read(|t| t.messages.iter().find(|m| m.id == id).cloned())
            .ok_or_else(|| StoreError::not_found("message", id))
    }

    /// A message as seen by its recipient; other users' mail is reported as missing.
    pub fn get_for(&self, user: UserId, id: u64) -> Result<Message> {
        self.get(id)
            .ok()
            .filter(|m| m.recipient == user)
            .ok_or_else(|| StoreError::not_found("message", id))
    }

    /// Marks a message read. Reading it again is not an error.
    pub fn mark_read(&self, id: u64) -> Result<Message> {
        self.store.write(|t| {
            let message = t
                .messages
                .iter_mut()
                .find(|m| m.id == id)
                .ok_or_else(|| StoreError::not_found("message", id))?;
            message.status = MessageStatus::Read;
            Ok(message.clone())
        })
    }

    /// Marks the recipient's message read and resolves its linked test, if any.
    pub fn acknowledge(&self, user: UserId, id: u64) -> Result<Acknowledgement> {
        self.get_for(user, id)?;
        let message = self.mark_read(id)?;
        let Some(test_id) = message.test_id else {
            return Ok(Acknowledgement::Read(message));
        };
        let test = self
            .store
            .read(|t| t.tests.iter().find(|test| test.id == test_id).cloned());
        Ok(match test {
            Some(test) => Acknowledgement::WithTest { message, test },
            None => Acknowledgement::TestMissing { message, test_id },
        })
    }

    pub fn list_all(&self) -> Vec<Message> {
        let mut messages = self.store.read(|t| t.messages.clone());
        messages.sort_by(|a, b| b.id.cmp(&a.id));
        messages
    }

    /// Every message grouped by the recipient's current role, newest first in each group.
    pub fn group_by_role(&self) -> BTreeMap<RoleBucket, Vec<Message>> {
        let messages = self.list_all();
        self.store.read(|t| {
            let mut groups: BTreeMap<RoleBucket, Vec<Message>> = BTreeMap::new();
            for message in messages {
                let role = t.user(message.recipient).and_then(|u| u.role);
                groups.entry(RoleBucket::from(role)).or_default().push(message);
            }
            groups
        })
    }

    pub fn delete(&self, id: u64) -> Result<Message> {
        let removed = self.store.write(|t| {
            let idx = t
                .messages
                .iter()
                .position(|m| m.id == id)
                .ok_or_else(|| StoreError::not_found("message", id))?;
            Ok(t.messages.remove(idx))
        })?;
        log::info!("deleted message {id}");
        Ok(removed)
    }
}
