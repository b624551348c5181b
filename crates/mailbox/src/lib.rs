//! Durable side of the workdesk: registered users, the internal mailbox and the test
//! registry, all backed by one JSON document under the store's internal folder.

mod error;
mod mailbox;
mod registry;
mod store;
mod types;
mod users;

pub use error::{Result, StoreError};
pub use mailbox::{Acknowledgement, Mailbox, Notifier, OutgoingMail, SilentNotifier};
pub use registry::{validate_link, NewTest, TestRegistry};
pub use store::DeskStore;
pub use types::{Message, MessageStatus, Tables, Test, TestResult, UserRecord};
pub use users::UserDirectory;
