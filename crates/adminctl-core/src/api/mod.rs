//! REST clients for the Google Workspace administrative APIs.
//!
//! Both clients share an `ApiClient`, which sends JSON requests through an
//! `AuthorizedTransport` so every call carries the current bearer token.
//!
//! - `DirectoryClient`: Admin SDK Directory API user management
//! - `GmailSettingsClient`: Gmail API mailbox IMAP settings

pub mod client;
pub mod directory;
pub mod error;
pub mod gmail;

pub use client::ApiClient;
pub use directory::{DirectoryClient, ListUsersQuery, ADMIN_DIRECTORY_USER_SCOPE, MY_CUSTOMER};
pub use error::ApiError;
pub use gmail::{GmailSettingsClient, GMAIL_SETTINGS_BASIC_SCOPE};
