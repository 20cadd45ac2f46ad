//! Application configuration and client registration loading.
//!
//! `AppConfig` is stored at `~/.config/adminctl/config.json` and holds
//! local preferences. `ClientRegistration` is read from the client-secret
//! JSON document downloaded from the provider's developer console.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;

/// Application name used for config directory paths
const APP_NAME: &str = "adminctl";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Client-secret file looked up in the working directory by default
pub const DEFAULT_CLIENT_SECRET_FILE: &str = "client_secret.json";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Path to the client-secret document
    pub client_secret_path: Option<PathBuf>,
    /// Root used in place of the home directory for the credential cache
    pub credentials_dir: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn client_secret_path(&self) -> PathBuf {
        self.client_secret_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CLIENT_SECRET_FILE))
    }
}

/// The caller's registered identity with the authorization server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRegistration {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub auth_uri: String,
    pub token_uri: String,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecretEntry>,
    web: Option<ClientSecretEntry>,
}

#[derive(Debug, Deserialize)]
struct ClientSecretEntry {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
}

impl ClientRegistration {
    /// Parse a client-secret document. The first redirect URI is used.
    pub fn from_client_secret_json(
        json: &[u8],
        scopes: &[&str],
    ) -> std::result::Result<Self, AuthError> {
        let file: ClientSecretFile = serde_json::from_slice(json)
            .map_err(|e| AuthError::InvalidRegistration(e.to_string()))?;

        let entry = file.installed.or(file.web).ok_or_else(|| {
            AuthError::InvalidRegistration("no \"installed\" or \"web\" credentials found".to_string())
        })?;

        let redirect_uri = entry.redirect_uris.into_iter().next().ok_or_else(|| {
            AuthError::InvalidRegistration("missing redirect URL".to_string())
        })?;

        Ok(Self {
            client_id: entry.client_id,
            client_secret: entry.client_secret,
            redirect_uri,
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            auth_uri: entry.auth_uri.unwrap_or_else(|| DEFAULT_AUTH_URI.to_string()),
            token_uri: entry.token_uri.unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
        })
    }

    /// Read and parse the client-secret document at `path`
    pub fn from_file(path: &Path, scopes: &[&str]) -> Result<Self> {
        let contents = std::fs::read(path)
            .with_context(|| format!("Unable to read client secret file {}", path.display()))?;
        Self::from_client_secret_json(&contents, scopes)
            .context("Unable to parse client secret file to config")
    }
}
