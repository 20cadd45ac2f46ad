//! Provisioning plan: which administrative calls a run performs.

use std::path::Path;

use adminctl_core::api::ListUsersQuery;
use adminctl_core::models::{ImapSettings, User};
use adminctl_core::{DirectoryClient, GmailSettingsClient};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct ProvisioningPlan {
    /// Primary email of the account the plan acts on
    pub email: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    /// Initial password when creating the account
    pub password: Option<String>,
    /// Password to set on an existing account
    pub new_password: Option<String>,
    #[serde(default)]
    pub create_user: bool,
    #[serde(default)]
    pub enable_imap: bool,
    #[serde(default)]
    pub list_users: bool,
}

impl ProvisioningPlan {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan file {}", path.display()))?;
        let plan: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse plan file {}", path.display()))?;
        plan.validate()?;
        Ok(plan)
    }

    fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            bail!("Plan email must not be empty");
        }
        if self.create_user
            && (self.given_name.is_none() || self.family_name.is_none() || self.password.is_none())
        {
            bail!("create_user requires given_name, family_name and password");
        }
        Ok(())
    }

    fn new_account(&self) -> Option<User> {
        match (&self.given_name, &self.family_name, &self.password) {
            (Some(given), Some(family), Some(password)) => {
                Some(User::new_account(&self.email, given, family, password))
            }
            _ => None,
        }
    }

    pub async fn execute(
        &self,
        directory: &DirectoryClient,
        gmail: &GmailSettingsClient,
    ) -> Result<()> {
        if self.list_users {
            let list = directory
                .list_users(&ListUsersQuery::default())
                .await
                .context("Unable to retrieve users in domain")?;
            if list.users.is_empty() {
                println!("No users found.");
            } else {
                println!("Users:");
                for user in &list.users {
                    println!("{}", user.display_line());
                }
            }
        }

        if self.create_user {
            if let Some(account) = self.new_account() {
                let created = directory
                    .insert_user(&account)
                    .await
                    .context("Cannot create user in domain")?;
                println!("Created user: {}", created.display_line());
            }
        }

        if let Some(ref password) = self.new_password {
            directory
                .patch_user(&self.email, &User::password_reset(&self.email, password))
                .await
                .with_context(|| format!("Unable to reset password for {}", self.email))?;
            info!(email = %self.email, "Password reset");
            println!("Password reset for {}", self.email);
        }

        if self.enable_imap {
            let updated = gmail
                .update_imap(&self.email, &ImapSettings::enabled())
                .await
                .with_context(|| format!("Unable to update IMAP settings for {}", self.email))?;
            println!("{:?}", updated);

            let current = gmail
                .get_imap(&self.email)
                .await
                .with_context(|| format!("Unable to read IMAP settings for {}", self.email))?;
            println!("{:?}", current);
        }

        Ok(())
    }
}
