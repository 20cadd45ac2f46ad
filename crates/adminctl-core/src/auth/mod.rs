//! OAuth2 credential acquisition and caching.
//!
//! This module provides:
//! - `TokenStore`: the cached credential file under `~/.credentials`
//! - `ConsentFlow`: browser consent and authorization-code exchange
//! - `CredentialProvider`: cache first, consent on a miss
//! - `AuthorizedTransport`: bearer-signed requests with refresh on expiry

pub mod consent;
pub mod credential;
pub mod error;
pub mod provider;
pub mod store;
pub mod transport;

pub use consent::{CodePrompt, ConsentFlow, ConsentState, TerminalPrompt};
pub use credential::Credential;
pub use error::AuthError;
pub use provider::CredentialProvider;
pub use store::TokenStore;
pub use transport::AuthorizedTransport;
