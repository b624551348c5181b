//! Chat transport seam.
//!
//! Handlers never talk to a chat platform directly; they render [`Screen`]s and hand them to a
//! [`ChatTransport`]. [`present`] implements the edit-in-place policy shared by every menu.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use workdesk_mailbox::Notifier;
use workdesk_protocol::{DeskError, MessageRef, Screen, UserId};

#[derive(Error, Debug)]
pub enum TransportError {
    /// The edit would not change the message
    #[error("message is not modified")]
    NotModified,

    /// The platform refused the operation (message too old, chat blocked, ...)
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TransportError> for DeskError {
    fn from(err: TransportError) -> Self {
        DeskError::TransportFailure(err.to_string())
    }
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_screen(&self, chat: UserId, screen: &Screen) -> TransportResult<MessageRef>;

    async fn edit_screen(&self, message: &MessageRef, screen: &Screen) -> TransportResult<()>;

    async fn delete_message(&self, message: &MessageRef) -> TransportResult<()>;

    /// Short popup answering a button press.
    async fn alert(&self, chat: UserId, text: &str) -> TransportResult<()>;

    async fn send_document(
        &self,
        chat: UserId,
        path: &Path,
        caption: Option<&str>,
    ) -> TransportResult<()>;
}

/// Shows `screen`, editing `current` in place when possible.
///
/// An unchanged edit counts as success. Any other edit failure falls back to deleting the
/// old message (best effort) and sending a fresh one.
pub async fn present(
    transport: &dyn ChatTransport,
    chat: UserId,
    current: Option<MessageRef>,
    screen: &Screen,
) -> TransportResult<MessageRef> {
    let Some(current) = current else {
        return transport.send_screen(chat, screen).await;
    };
    match transport.edit_screen(&current, screen).await {
        Ok(()) | Err(TransportError::NotModified) => Ok(current),
        Err(err) => {
            log::debug!(
                "edit of message {} failed ({err}), sending a new one",
                current.message_id
            );
            if let Err(err) = transport.delete_message(&current).await {
                log::debug!("delete of message {} failed: {err}", current.message_id);
            }
            transport.send_screen(chat, screen).await
        }
    }
}

/// Mail notifications delivered as plain chat messages.
pub struct TransportNotifier {
    transport: Arc<dyn ChatTransport>,
}

impl TransportNotifier {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Notifier for TransportNotifier {
    async fn notify(&self, user: UserId, text: &str) -> Result<(), DeskError> {
        self.transport
            .send_screen(user, &Screen::new(text))
            .await
            .map(|_| ())
            .map_err(DeskError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedTransport {
        edit_error: Mutex<Option<TransportError>>,
        log: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatTransport for ScriptedTransport {
        async fn send_screen(&self, chat: UserId, screen: &Screen) -> TransportResult<MessageRef> {
            self.log.lock().unwrap().push(format!("send {}", screen.text));
            Ok(MessageRef {
                chat_id: chat,
                message_id: 99,
            })
        }

        async fn edit_screen(&self, message: &MessageRef, screen: &Screen) -> TransportResult<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("edit {} {}", message.message_id, screen.text));
            match self.edit_error.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        async fn delete_message(&self, message: &MessageRef) -> TransportResult<()> {
            self.log
                .lock()
                .unwrap()
                .push(format!("delete {}", message.message_id));
            Ok(())
        }

        async fn alert(&self, _chat: UserId, _text: &str) -> TransportResult<()> {
            Ok(())
        }

        async fn send_document(
            &self,
            _chat: UserId,
            _path: &Path,
            _caption: Option<&str>,
        ) -> TransportResult<()> {
            Ok(())
        }
    }

    const OLD: MessageRef = MessageRef {
        chat_id: 5,
        message_id: 10,
    };

    #[tokio::test]
    async fn test_present_edits_in_place() {
        let transport = ScriptedTransport::default();
        let shown = present(&transport, 5, Some(OLD), &Screen::new("menu"))
            .await
            .unwrap();
        assert_eq!(shown, OLD);
        assert_eq!(*transport.log.lock().unwrap(), vec!["edit 10 menu"]);
    }

    #[tokio::test]
    async fn test_not_modified_is_success() {
        let transport = ScriptedTransport::default();
        *transport.edit_error.lock().unwrap() = Some(TransportError::NotModified);
        let shown = present(&transport, 5, Some(OLD), &Screen::new("menu"))
            .await
            .unwrap();
        assert_eq!(shown, OLD);
    }

    #[tokio::test]
    async fn test_failed_edit_falls_back_to_resend() {
        let transport = ScriptedTransport::default();
        *transport.edit_error.lock().unwrap() = Some(TransportError::Rejected("too old".into()));
        let shown = present(&transport, 5, Some(OLD), &Screen::new("menu"))
            .await
            .unwrap();
        assert_eq!(shown.message_id, 99);
        assert_eq!(
            *transport.log.lock().unwrap(),
            vec!["edit 10 menu", "delete 10", "send menu"]
        );
    }
}
