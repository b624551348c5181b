//! Newline-delimited JSON transport over stdin/stdout.
//!
//! Inbound, one update per line:
//!
//! ```text
//! {"from":{"id":7,"display_name":"Dana","handle":"dana"},"command":"start"}
//! {"from":{...},"text":"Driver"}
//! {"from":{...},"action":"dir|aB3dE9xY"}
//! {"from":{...},"document":{"file_name":"a.pdf","unique_id":"u1","data":"<base64>"}}
//! {"from":{...},"photo":[{"width":90,"height":90,"unique_id":"p1","data":"<base64>"}]}
//! ```
//!
//! Outbound lines carry an `op` tag: `send`, `edit`, `delete`, `alert` or `document`.

use crate::desk::Desk;
use crate::transport::{ChatTransport, TransportError, TransportResult};
use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use workdesk_protocol::{
    Action, Command, DeskError, Event, EventKind, MessageRef, PhotoVariant, Screen, Sender,
    Upload, UploadKind, UserId,
};

#[derive(Debug, Deserialize)]
pub struct InboundUpdate {
    pub from: Sender,
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    document: Option<InboundFile>,
    #[serde(default)]
    video: Option<InboundFile>,
    #[serde(default)]
    photo: Option<Vec<InboundPhoto>>,
}

#[derive(Debug, Deserialize)]
struct InboundFile {
    #[serde(default)]
    file_name: Option<String>,
    unique_id: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct InboundPhoto {
    width: u32,
    height: u32,
    unique_id: String,
    data: String,
}

fn decode(data: &str) -> Result<Vec<u8>, DeskError> {
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|err| DeskError::invalid(format!("attachment is not valid base64: {err}")))
}

impl InboundFile {
    fn into_upload(self, kind: UploadKind) -> Result<Upload, DeskError> {
        Ok(Upload {
            kind,
            file_name: self.file_name,
            unique_id: self.unique_id,
            bytes: decode(&self.data)?,
        })
    }
}

impl InboundUpdate {
    pub fn into_event(self) -> Result<Event, DeskError> {
        let kind = if let Some(command) = self.command {
            EventKind::Command(Command::parse(&command)?)
        } else if let Some(text) = self.text {
            // Slash-prefixed text that names a known command is a command
            match text.trim().starts_with('/').then(|| Command::parse(&text)) {
                Some(Ok(command)) => EventKind::Command(command),
                _ => EventKind::Text(text),
            }
        } else if let Some(action) = self.action {
            EventKind::Action(Action::parse(&action)?)
        } else if let Some(document) = self.document {
            EventKind::Upload(document.into_upload(UploadKind::Document)?)
        } else if let Some(video) = self.video {
            EventKind::Upload(video.into_upload(UploadKind::Video)?)
        } else if let Some(photo) = self.photo {
            let variants = photo
                .into_iter()
                .map(|p| {
                    Ok(PhotoVariant {
                        width: p.width,
                        height: p.height,
                        unique_id: p.unique_id,
                        bytes: decode(&p.data)?,
                    })
                })
                .collect::<Result<Vec<_>, DeskError>>()?;
            let upload = Upload::from_photo_variants(variants)
                .ok_or_else(|| DeskError::invalid("photo without variants"))?;
            EventKind::Upload(upload)
        } else {
            return Err(DeskError::invalid("update carries no content"));
        };
        Ok(Event::new(self.from, kind))
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Outbound<'a> {
    Send {
        chat_id: UserId,
        message_id: i64,
        screen: &'a Screen,
    },
    Edit {
        chat_id: UserId,
        message_id: i64,
        screen: &'a Screen,
    },
    Delete {
        chat_id: UserId,
        message_id: i64,
    },
    Alert {
        chat_id: UserId,
        text: &'a str,
    },
    Document {
        chat_id: UserId,
        path: &'a Path,
        #[serde(skip_serializing_if = "Option::is_none")]
        caption: Option<&'a str>,
    },
}

/// Writes rendered output as JSON lines. Only the newest message of each chat stays editable;
/// editing anything else is rejected and identical content is reported as not modified.
pub struct StdioTransport<W> {
    writer: tokio::sync::Mutex<W>,
    next_id: AtomicI64,
    live: Mutex<HashMap<UserId, (MessageRef, Screen)>>,
}

impl<W> StdioTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer: tokio::sync::Mutex::new(writer),
            next_id: AtomicI64::new(1),
            live: Mutex::new(HashMap::new()),
        }
    }

    async fn emit(&self, line: &Outbound<'_>) -> TransportResult<()> {
        let mut encoded = serde_json::to_vec(line)
            .map_err(|err| TransportError::Rejected(format!("unencodable output: {err}")))?;
        encoded.push(b'\n');
        let mut writer = self.writer.lock().await;
        writer.write_all(&encoded).await?;
        writer.flush().await?;
        Ok(())
    }

    fn live(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, (MessageRef, Screen)>> {
        self.live
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl<W> ChatTransport for StdioTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn send_screen(&self, chat: UserId, screen: &Screen) -> TransportResult<MessageRef> {
        let message = MessageRef {
            chat_id: chat,
            message_id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };
        self.emit(&Outbound::Send {
            chat_id: chat,
            message_id: message.message_id,
            screen,
        })
        .await?;
        self.live().insert(chat, (message, screen.clone()));
        Ok(message)
    }

    async fn edit_screen(&self, message: &MessageRef, screen: &Screen) -> TransportResult<()> {
        let editable = {
            let live = self.live();
            match live.get(&message.chat_id) {
                Some((newest, current)) if newest == message => {
                    if current == screen {
                        Err(TransportError::NotModified)
                    } else {
                        Ok(())
                    }
                }
                _ => Err(TransportError::Rejected(format!(
                    "message {} cannot be edited",
                    message.message_id
                ))),
            }
        };
        editable?;
        self.emit(&Outbound::Edit {
            chat_id: message.chat_id,
            message_id: message.message_id,
            screen,
        })
        .await?;
        self.live()
            .insert(message.chat_id, (*message, screen.clone()));
        Ok(())
    }

    async fn delete_message(&self, message: &MessageRef) -> TransportResult<()> {
        {
            let mut live = self.live();
            if live.get(&message.chat_id).is_some_and(|(newest, _)| newest == message) {
                live.remove(&message.chat_id);
            }
        }
        self.emit(&Outbound::Delete {
            chat_id: message.chat_id,
            message_id: message.message_id,
        })
        .await
    }

    async fn alert(&self, chat: UserId, text: &str) -> TransportResult<()> {
        self.emit(&Outbound::Alert {
            chat_id: chat,
            text,
        })
        .await
    }

    async fn send_document(
        &self,
        chat: UserId,
        path: &Path,
        caption: Option<&str>,
    ) -> TransportResult<()> {
        self.emit(&Outbound::Document {
            chat_id: chat,
            path,
            caption,
        })
        .await
    }
}

/// Reads updates until EOF. Each user gets a worker so their updates are handled in order
/// while different users proceed concurrently.
pub async fn serve<R>(desk: Arc<Desk>, input: R) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut workers: HashMap<UserId, mpsc::UnboundedSender<Event>> = HashMap::new();
    let mut handles = Vec::new();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let update: InboundUpdate = match serde_json::from_str(line) {
            Ok(update) => update,
            Err(err) => {
                log::warn!("skipping malformed update: {err}");
                continue;
            }
        };
        let sender = update.from.clone();
        let event = match update.into_event() {
            Ok(event) => event,
            Err(err) => {
                log::warn!("unusable update from {}: {err}", sender.id);
                desk.reject(&sender).await;
                continue;
            }
        };

        let queue = workers.entry(sender.id).or_insert_with(|| {
            let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
            let desk = desk.clone();
            handles.push(tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    desk.handle(event).await;
                }
            }));
            tx
        });
        if queue.send(event).is_err() {
            log::error!("worker for user {} stopped", sender.id);
        }
    }

    drop(workers);
    for handle in handles {
        if let Err(err) = handle.await {
            log::error!("update worker panicked: {err}");
        }
    }
    log::info!("input closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn update(json: &str) -> Result<Event, DeskError> {
        serde_json::from_str::<InboundUpdate>(json)
            .expect("valid json")
            .into_event()
    }

    #[test]
    fn test_commands_and_slash_text() {
        let event = update(r#"{"from":{"id":1},"command":"/start@desk_bot"}"#).unwrap();
        assert_eq!(event.kind, EventKind::Command(Command::Start));

        let event = update(r#"{"from":{"id":1},"text":"/mail"}"#).unwrap();
        assert_eq!(event.kind, EventKind::Command(Command::Mail));

        let event = update(r#"{"from":{"id":1},"text":"/unknown"}"#).unwrap();
        assert_eq!(event.kind, EventKind::Text("/unknown".into()));
    }

    #[test]
    fn test_photo_keeps_largest_variant() {
        let event = update(
            r#"{"from":{"id":1},"photo":[
                {"width":90,"height":90,"unique_id":"small","data":"AQ=="},
                {"width":1280,"height":720,"unique_id":"big","data":"AQID"}
            ]}"#,
        )
        .unwrap();
        let EventKind::Upload(upload) = event.kind else {
            panic!("expected upload");
        };
        assert_eq!(upload.unique_id, "big");
        assert_eq!(upload.bytes, vec![1, 2, 3]);
        assert_eq!(upload.stored_name(), "photo_big.jpg");
    }

    #[test]
    fn test_bad_payloads_are_rejected() {
        assert!(update(r#"{"from":{"id":1}}"#).is_err());
        assert!(update(r#"{"from":{"id":1},"action":"nope|x"}"#).is_err());
        assert!(update(r#"{"from":{"id":1},"document":{"unique_id":"d","data":"!!"}}"#).is_err());
    }

    #[tokio::test]
    async fn test_edit_semantics() {
        let transport = StdioTransport::new(Vec::<u8>::new());
        let screen = Screen::new("hello");
        let sent = transport.send_screen(3, &screen).await.unwrap();

        assert!(matches!(
            transport.edit_screen(&sent, &screen).await,
            Err(TransportError::NotModified)
        ));
        transport
            .edit_screen(&sent, &Screen::new("changed"))
            .await
            .unwrap();
        transport.delete_message(&sent).await.unwrap();
        assert!(matches!(
            transport.edit_screen(&sent, &screen).await,
            Err(TransportError::Rejected(_))
        ));

        let written = String::from_utf8(transport.writer.lock().await.clone()).unwrap();
        let ops: Vec<String> = written
            .lines()
            .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["op"].to_string())
            .collect();
        assert_eq!(ops, vec!["\"send\"", "\"edit\"", "\"delete\""]);
    }

    #[tokio::test]
    async fn test_only_newest_message_per_chat_is_tracked() {
        let transport = StdioTransport::new(tokio::io::sink());
        let menu = transport.send_screen(1, &Screen::new("menu")).await.unwrap();
        for n in 0..300 {
            for chat in 1..=3 {
                transport
                    .send_screen(chat, &Screen::new(format!("note {n}")))
                    .await
                    .unwrap();
            }
        }
        assert_eq!(transport.live().len(), 3);

        assert!(matches!(
            transport.edit_screen(&menu, &Screen::new("menu 2")).await,
            Err(TransportError::Rejected(_))
        ));
        let newest = transport.send_screen(1, &Screen::new("menu")).await.unwrap();
        transport.delete_message(&menu).await.unwrap();
        transport
            .edit_screen(&newest, &Screen::new("menu 2"))
            .await
            .unwrap();
    }
}
