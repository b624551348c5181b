//! Interactive session engine
//!
//! ```text
//! Event ──► route(state, trigger) ──► Handle(state) ──► handler ──► Step ──► SessionContext
//!                  │                    Global      ──► main-menu dispatcher
//!                  │                    Blocked     ──► "finish search first"
//!                  └──────────────────► Unrecognized ─► notice, state unchanged
//! ```
//!
//! Each user owns a [`SessionContext`]: the active [`State`], wizard [`Scratch`] fields, the
//! browse cursor and a [`ShortTokenRegistry`] that maps bounded action payloads back to
//! paths, user ids and test ids. Nothing here is durable.

mod context;
mod error;
mod machine;
mod store;
mod tokens;

pub use context::{
    BrowseCursor, BrowseMode, MailDraft, Scratch, SessionContext, TestDraft, TokenTarget,
    UploadBatch,
};
pub use error::{Result, SessionError};
pub use machine::{route, route_command, Conversation, Route, State, Step, Trigger};
pub use store::SessionStore;
pub use tokens::ShortTokenRegistry;
