//! Resource models for the Workspace administrative APIs.
//!
//! - `User`, `UserName`, `UsersList`: Directory API user resources
//! - `ImapSettings`: Gmail mailbox IMAP settings

pub mod mailbox;
pub mod user;

pub use mailbox::ImapSettings;
pub use user::{User, UserName, UsersList};
