//! Workdesk front end: configuration, the chat transport seam, the per-user dispatcher and
//! the conversation flows built on the protocol, session, navigator, search and mailbox
//! crates.

mod config;
mod desk;
mod dispatch;
mod flows;
mod screens;
mod stdio;
mod transport;

pub use config::DeskConfig;
pub use desk::Desk;
pub use stdio::{serve, InboundUpdate, StdioTransport};
pub use transport::{present, ChatTransport, TransportError, TransportNotifier, TransportResult};
