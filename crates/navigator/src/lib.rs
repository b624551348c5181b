//! Role-scoped file store browsing.
//!
//! Every operation takes a `root` and a store-relative path; the path must resolve inside
//! the root or the call fails with [`NavigatorError::OutsideRoot`].

mod error;
mod layout;
mod navigator;

pub use error::{NavigatorError, Result};
pub use layout::{
    display_rel, is_within, join_rel, normalize_rel, parent_within, top_role_folder,
    StoreLayout, PERSONAL_FOLDER, RESERVED_FOLDER, SHARED_ROOT,
};
pub use navigator::{Entry, Listing, Navigator, Received, Removed, UpTarget};
