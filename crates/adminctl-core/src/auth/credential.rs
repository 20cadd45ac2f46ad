use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Token type assumed when the token endpoint omits one.
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// A token is treated as expired this many seconds before its stated expiry,
/// so it does not lapse while a request is in flight.
const EXPIRY_SKEW_SECONDS: i64 = 10;

/// A granted authorization, as persisted in the credential cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Absolute expiry. `None` means the token does not expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            refresh_token: None,
            expiry: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            // An expiry too close to the minimum date to apply the skew is long past
            Some(expiry) => expiry
                .checked_sub_signed(Duration::seconds(EXPIRY_SKEW_SECONDS))
                .map_or(true, |deadline| deadline <= now),
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Whether a refresh token is available to mint a new access token
    pub fn is_renewable(&self) -> bool {
        self.refresh_token
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }

    /// Expired with no way to renew; only a new consent grant helps.
    pub fn is_dead(&self) -> bool {
        self.is_expired() && !self.is_renewable()
    }

    /// Value for the `Authorization` header.
    ///
    /// Servers commonly answer `"bearer"` in lowercase; the header is always
    /// sent with the canonical scheme name for bearer tokens.
    pub fn authorization_value(&self) -> String {
        let scheme = if self.token_type.is_empty() || self.token_type.eq_ignore_ascii_case("bearer")
        {
            DEFAULT_TOKEN_TYPE
        } else {
            self.token_type.as_str()
        };
        format!("{} {}", scheme, self.access_token)
    }

    /// Seconds until expiry (negative once expired), for display.
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expiry
            .map(|e| e.signed_duration_since(Utc::now()).num_seconds())
    }
}
