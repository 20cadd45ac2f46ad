use serde::{Deserialize, Serialize};

/// A Directory API user resource.
///
/// Every field is optional so the same type serves as a full insert body and
/// as a sparse patch body; absent fields are left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "primaryEmail", skip_serializing_if = "Option::is_none")]
    pub primary_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<UserName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(
        rename = "changePasswordAtNextLogin",
        skip_serializing_if = "Option::is_none"
    )]
    pub change_password_at_next_login: Option<bool>,
    #[serde(rename = "isAdmin", skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended: Option<bool>,
    #[serde(rename = "orgUnitPath", skip_serializing_if = "Option::is_none")]
    pub org_unit_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserName {
    #[serde(rename = "givenName", skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(rename = "familyName", skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(rename = "fullName", skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsersList {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
}

impl User {
    /// Body for creating a new account
    pub fn new_account(email: &str, given_name: &str, family_name: &str, password: &str) -> Self {
        Self {
            primary_email: Some(email.to_string()),
            name: Some(UserName {
                given_name: Some(given_name.to_string()),
                family_name: Some(family_name.to_string()),
                full_name: None,
            }),
            password: Some(password.to_string()),
            change_password_at_next_login: Some(false),
            ..Default::default()
        }
    }

    /// Patch body that only resets the password
    pub fn password_reset(email: &str, password: &str) -> Self {
        Self {
            primary_email: Some(email.to_string()),
            password: Some(password.to_string()),
            ..Default::default()
        }
    }

    pub fn full_name(&self) -> String {
        match self.name {
            Some(ref name) => match name.full_name {
                Some(ref full) => full.clone(),
                None => format!(
                    "{} {}",
                    name.given_name.as_deref().unwrap_or(""),
                    name.family_name.as_deref().unwrap_or("")
                )
                .trim()
                .to_string(),
            },
            None => String::new(),
        }
    }

    /// One-line summary for terminal output
    pub fn display_line(&self) -> String {
        let email = self.primary_email.as_deref().unwrap_or("(no email)");
        let admin = if self.is_admin.unwrap_or(false) { "yes" } else { "no" };
        format!("{} ({})\tAdmin:({})", email, self.full_name(), admin)
    }
}
