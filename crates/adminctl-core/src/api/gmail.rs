//! Gmail API: per-mailbox settings.

use super::client::{endpoint, ApiClient};
use super::ApiError;
use crate::models::ImapSettings;

/// Scope for managing basic mail settings
pub const GMAIL_SETTINGS_BASIC_SCOPE: &str = "https://www.googleapis.com/auth/gmail.settings.basic";

const GMAIL_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

#[derive(Clone)]
pub struct GmailSettingsClient {
    api: ApiClient,
    base_url: String,
}

impl GmailSettingsClient {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            base_url: GMAIL_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn get_imap(&self, user_id: &str) -> Result<ImapSettings, ApiError> {
        let url = endpoint(&self.base_url, &["users", user_id, "settings", "imap"])?;
        self.api.get(url.as_str()).await
    }

    pub async fn update_imap(
        &self,
        user_id: &str,
        settings: &ImapSettings,
    ) -> Result<ImapSettings, ApiError> {
        let url = endpoint(&self.base_url, &["users", user_id, "settings", "imap"])?;
        self.api.put(url.as_str(), settings).await
    }
}
