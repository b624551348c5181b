use crate::action::Action;
use crate::error::{DeskError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Chat-platform user id; private chats share the id of their user.
pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: UserId,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    Help,
    Admin,
    Mail,
    Search,
}

impl Command {
    /// Accepts `/start`, `start` and `/start@botname`.
    pub fn parse(raw: &str) -> Result<Self> {
        let name = raw.trim().trim_start_matches('/');
        let name = name.split('@').next().unwrap_or_default();
        match name.to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "help" => Ok(Self::Help),
            "admin" => Ok(Self::Admin),
            "mail" => Ok(Self::Mail),
            "search" => Ok(Self::Search),
            _ => Err(DeskError::invalid(format!("unknown command '{raw}'"))),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "/start",
            Self::Help => "/help",
            Self::Admin => "/admin",
            Self::Mail => "/mail",
            Self::Search => "/search",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadKind {
    Document,
    Photo,
    Video,
}

/// One inbound file. Photos are already reduced to their largest variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub kind: UploadKind,
    pub file_name: Option<String>,
    pub unique_id: String,
    pub bytes: Vec<u8>,
}

/// One resolution of an inbound photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoVariant {
    pub width: u32,
    pub height: u32,
    pub unique_id: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Keeps the largest variant by pixel count.
    pub fn from_photo_variants(variants: Vec<PhotoVariant>) -> Option<Self> {
        let largest = variants
            .into_iter()
            .max_by_key(|v| u64::from(v.width) * u64::from(v.height))?;
        Some(Self {
            kind: UploadKind::Photo,
            file_name: None,
            unique_id: largest.unique_id,
            bytes: largest.bytes,
        })
    }

    /// Name the file is stored under.
    pub fn stored_name(&self) -> String {
        let delivered = self
            .file_name
            .as_deref()
            .and_then(sanitize_file_name);
        match (self.kind, delivered) {
            (UploadKind::Photo, _) => format!("photo_{}.jpg", self.unique_id),
            (_, Some(name)) => name,
            (UploadKind::Document, None) => format!("doc_{}", self.unique_id),
            (UploadKind::Video, None) => format!("video_{}.mp4", self.unique_id),
        }
    }
}

/// Reduces a delivered name to its final component; `None` when nothing usable remains.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let normalized = raw.replace('\\', "/");
    let name = Path::new(&normalized).file_name()?.to_str()?.trim();
    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Command(Command),
    Text(String),
    Action(Action),
    Upload(Upload),
}

/// One inbound update, already decoded by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub sender: Sender,
    pub kind: EventKind,
}

impl Event {
    pub fn new(sender: Sender, kind: EventKind) -> Self {
        Self { sender, kind }
    }

    pub fn describe(&self) -> String {
        match &self.kind {
            EventKind::Command(cmd) => cmd.as_str().to_string(),
            EventKind::Text(_) => "text".to_string(),
            EventKind::Action(action) => action.prefix().to_string(),
            EventKind::Upload(upload) => format!("upload:{:?}", upload.kind).to_lowercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(kind: UploadKind, file_name: Option<&str>) -> Upload {
        Upload {
            kind,
            file_name: file_name.map(str::to_string),
            unique_id: "AQAD".to_string(),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn test_stored_names() {
        assert_eq!(
            upload(UploadKind::Document, Some("report.pdf")).stored_name(),
            "report.pdf"
        );
        assert_eq!(upload(UploadKind::Document, None).stored_name(), "doc_AQAD");
        assert_eq!(
            upload(UploadKind::Photo, Some("ignored.png")).stored_name(),
            "photo_AQAD.jpg"
        );
        assert_eq!(upload(UploadKind::Video, None).stored_name(), "video_AQAD.mp4");
        assert_eq!(
            upload(UploadKind::Video, Some("clip.mov")).stored_name(),
            "clip.mov"
        );
    }

    #[test]
    fn test_stored_name_drops_directories() {
        assert_eq!(
            upload(UploadKind::Document, Some("../../etc/passwd")).stored_name(),
            "passwd"
        );
        assert_eq!(
            upload(UploadKind::Document, Some("C:\\tmp\\a.txt")).stored_name(),
            "a.txt"
        );
        assert_eq!(upload(UploadKind::Document, Some("..")).stored_name(), "doc_AQAD");
    }

    #[test]
    fn test_largest_photo_variant_wins() {
        let variant = |w: u32, id: &str| PhotoVariant {
            width: w,
            height: w,
            unique_id: id.to_string(),
            bytes: vec![],
        };
        let picked =
            Upload::from_photo_variants(vec![variant(90, "s"), variant(1280, "x"), variant(320, "m")])
                .unwrap();
        assert_eq!(picked.unique_id, "x");
        assert!(Upload::from_photo_variants(Vec::new()).is_none());
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("/start").unwrap(), Command::Start);
        assert_eq!(Command::parse("/MAIL@desk_bot").unwrap(), Command::Mail);
        assert!(Command::parse("/unknown").is_err());
    }
}
