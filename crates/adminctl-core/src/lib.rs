//! adminctl-core - OAuth credential caching and Workspace admin API clients.
//!
//! The credential flow lives in [`auth`]: a cached token is loaded from
//! `~/.credentials`, or obtained once through a browser consent grant and
//! saved, and then wrapped in an [`auth::AuthorizedTransport`] that signs
//! and refreshes every request. [`api`] builds the Directory and Gmail
//! clients on top of that transport.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError, DirectoryClient, GmailSettingsClient};
pub use auth::{AuthError, AuthorizedTransport, Credential, CredentialProvider, TokenStore};
pub use config::{AppConfig, ClientRegistration};
