use serde::{Deserialize, Serialize};

/// Gmail IMAP settings for one mailbox
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImapSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(rename = "autoExpunge", skip_serializing_if = "Option::is_none")]
    pub auto_expunge: Option<bool>,
    /// One of `archive`, `trash`, `deleteForever`
    #[serde(rename = "expungeBehavior", skip_serializing_if = "Option::is_none")]
    pub expunge_behavior: Option<String>,
    #[serde(rename = "maxFolderSize", skip_serializing_if = "Option::is_none")]
    pub max_folder_size: Option<i64>,
}

impl ImapSettings {
    pub fn enabled() -> Self {
        Self {
            enabled: Some(true),
            ..Default::default()
        }
    }
}
