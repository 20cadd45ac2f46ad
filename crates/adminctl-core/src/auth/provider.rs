use std::path::PathBuf;

use reqwest::Client;
use tracing::{info, warn};

use super::consent::{CodePrompt, ConsentFlow, TerminalPrompt};
use super::error::Result;
use super::store::TokenStore;
use super::transport::AuthorizedTransport;
use crate::config::ClientRegistration;

/// Produces an [`AuthorizedTransport`], from the cache when possible and
/// through the consent flow otherwise.
pub struct CredentialProvider {
    cache_path: Option<PathBuf>,
    prompt: Box<dyn CodePrompt>,
}

impl Default for CredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialProvider {
    pub fn new() -> Self {
        Self {
            cache_path: None,
            prompt: Box::new(TerminalPrompt),
        }
    }

    /// Use `path` instead of the per-user cache location
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    pub fn with_prompt(mut self, prompt: impl CodePrompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    /// Load the cached credential or run the consent flow once, then wrap
    /// the credential in a transport bound to `http`.
    ///
    /// An expired cached credential is returned as-is; the transport
    /// refreshes it on first use.
    pub async fn acquire(
        &mut self,
        http: Client,
        registration: ClientRegistration,
    ) -> Result<AuthorizedTransport> {
        let path = match self.cache_path {
            Some(ref path) => path.clone(),
            None => TokenStore::locate()?,
        };

        let credential = match TokenStore::load(&path) {
            Ok(credential) => {
                info!(
                    path = %path.display(),
                    expires_in_secs = ?credential.seconds_until_expiry(),
                    "Using cached credential"
                );
                if credential.is_dead() {
                    warn!("Cached credential has expired and cannot be refreshed; remove the cache file to re-consent");
                }
                credential
            }
            Err(e) => {
                if e.is_cache_miss() {
                    info!(reason = %e, "No usable cached credential, starting consent flow");
                } else {
                    warn!(error = %e, "Could not read cached credential, starting consent flow");
                }
                let credential = ConsentFlow::new(&registration)
                    .run(&http, self.prompt.as_mut())
                    .await?;
                TokenStore::save(&path, &credential)?;
                credential
            }
        };

        Ok(AuthorizedTransport::new(http, registration, credential).with_cache_path(path))
    }
}
