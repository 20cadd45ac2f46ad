//! Browser-based authorization-code consent flow.
//!
//! The operator opens the printed URL, grants access, and pastes the
//! one-time code back into the terminal. The code is then traded for a
//! [`Credential`] at the token endpoint.

use std::io::{self, BufRead, Write};

use chrono::{Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::credential::{Credential, DEFAULT_TOKEN_TYPE};
use super::error::{AuthError, Result};
use crate::config::ClientRegistration;

/// Anti-forgery state value sent with the authorization request
pub const STATE_TOKEN: &str = "state-token";

/// Requests a refresh token alongside the access token
const ACCESS_TYPE_OFFLINE: &str = "offline";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentState {
    NoCode,
    UrlIssued,
    CodeEntered,
    Exchanged,
    Failed,
}

/// Source of the authorization code typed by the operator.
pub trait CodePrompt {
    /// Show `auth_url` and block until a code has been entered.
    fn prompt(&mut self, auth_url: &Url) -> Result<String>;
}

/// Prompts on the controlling terminal (stdout/stdin).
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl CodePrompt for TerminalPrompt {
    fn prompt(&mut self, auth_url: &Url) -> Result<String> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        prompt_for_code(stdin.lock(), stdout.lock(), auth_url)
    }
}

/// Build the URL the operator opens to grant consent.
pub fn build_authorization_url(registration: &ClientRegistration) -> Result<Url> {
    let mut url = Url::parse(&registration.auth_uri).map_err(|e| {
        AuthError::InvalidRegistration(format!(
            "bad authorization endpoint {:?}: {}",
            registration.auth_uri, e
        ))
    })?;

    url.query_pairs_mut()
        .append_pair("access_type", ACCESS_TYPE_OFFLINE)
        .append_pair("client_id", &registration.client_id)
        .append_pair("redirect_uri", &registration.redirect_uri)
        .append_pair("response_type", "code")
        .append_pair("scope", &registration.scopes.join(" "))
        .append_pair("state", STATE_TOKEN);

    Ok(url)
}

/// Print the authorization URL to `output` and read one whitespace-delimited
/// token from `input`.
pub fn prompt_for_code<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    auth_url: &Url,
) -> Result<String> {
    write!(
        output,
        "Go to the following link in your browser then type the authorization code: \n{}\n",
        auth_url
    )
    .and_then(|_| output.flush())
    .map_err(|e| AuthError::Input(e.to_string()))?;

    let mut line = String::new();
    loop {
        line.clear();
        let read = input
            .read_line(&mut line)
            .map_err(|e| AuthError::Input(e.to_string()))?;
        if read == 0 {
            return Err(AuthError::Input("input closed before a code was entered".to_string()));
        }
        if let Some(code) = line.split_whitespace().next() {
            return Ok(code.to_string());
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    token_type: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_credential(self) -> Result<Credential> {
        let access_token = self
            .access_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AuthError::AuthExchange("server response missing access_token".to_string())
            })?;

        let expiry = match self.expires_in {
            Some(secs) if secs > 0 => Some(
                Duration::try_seconds(secs)
                    .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
                    .ok_or_else(|| {
                        AuthError::AuthExchange(format!("expires_in out of range: {}", secs))
                    })?,
            ),
            _ => None,
        };

        Ok(Credential {
            access_token,
            token_type: self
                .token_type
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            expiry,
        })
    }
}

async fn request_token(
    http: &Client,
    registration: &ClientRegistration,
    form: &[(&str, &str)],
) -> Result<Credential> {
    let response = http
        .post(&registration.token_uri)
        .header(reqwest::header::ACCEPT, "application/json")
        .form(form)
        .send()
        .await
        .map_err(|e| AuthError::AuthExchange(format!("token request failed: {}", e)))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AuthError::AuthExchange(format!("failed to read token response: {}", e)))?;

    if !status.is_success() {
        return Err(AuthError::from_token_endpoint(status, &body));
    }

    let parsed: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| AuthError::AuthExchange(format!("malformed token response: {}", e)))?;
    parsed.into_credential()
}

/// Trade a one-time authorization code for a credential. Not retried.
pub async fn exchange(
    http: &Client,
    registration: &ClientRegistration,
    code: &str,
) -> Result<Credential> {
    let code = code.trim();
    request_token(
        http,
        registration,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", registration.redirect_uri.as_str()),
            ("client_id", registration.client_id.as_str()),
            ("client_secret", registration.client_secret.as_str()),
        ],
    )
    .await
}

/// Mint a new access token from the credential's refresh token.
///
/// The previous refresh token is kept when the server does not rotate it.
pub async fn refresh(
    http: &Client,
    registration: &ClientRegistration,
    credential: &Credential,
) -> Result<Credential> {
    let refresh_token = credential
        .refresh_token
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AuthError::AuthExchange("credential has no refresh token".to_string()))?;

    let mut renewed = request_token(
        http,
        registration,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", registration.client_id.as_str()),
            ("client_secret", registration.client_secret.as_str()),
        ],
    )
    .await?;

    if renewed.refresh_token.is_none() {
        renewed.refresh_token = Some(refresh_token.to_string());
    }
    Ok(renewed)
}

/// One pass through the consent flow. Not resumable; a new attempt starts
/// from [`ConsentState::NoCode`].
pub struct ConsentFlow<'a> {
    registration: &'a ClientRegistration,
    state: ConsentState,
}

impl<'a> ConsentFlow<'a> {
    pub fn new(registration: &'a ClientRegistration) -> Self {
        Self {
            registration,
            state: ConsentState::NoCode,
        }
    }

    pub fn state(&self) -> ConsentState {
        self.state
    }

    fn advance(&mut self, next: ConsentState) {
        debug!(from = ?self.state, to = ?next, "Consent flow transition");
        self.state = next;
    }

    pub async fn run(&mut self, http: &Client, prompt: &mut dyn CodePrompt) -> Result<Credential> {
        let result = self.run_steps(http, prompt).await;
        if result.is_err() {
            self.advance(ConsentState::Failed);
        }
        result
    }

    async fn run_steps(&mut self, http: &Client, prompt: &mut dyn CodePrompt) -> Result<Credential> {
        let auth_url = build_authorization_url(self.registration)?;
        self.advance(ConsentState::UrlIssued);

        let code = prompt.prompt(&auth_url)?;
        self.advance(ConsentState::CodeEntered);

        let credential = exchange(http, self.registration, &code).await?;
        self.advance(ConsentState::Exchanged);
        Ok(credential)
    }
}
