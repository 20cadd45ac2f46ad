use std::path::PathBuf;

use thiserror::Error;

/// Maximum length for token endpoint bodies quoted in error messages
const MAX_ERROR_BODY_LENGTH: usize = 300;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Environment error: {0}")]
    Environment(String),

    #[error("No cached credential at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Cached credential at {} is unreadable: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Unable to read authorization code: {0}")]
    Input(String),

    #[error("Token exchange failed: {0}")]
    AuthExchange(String),

    #[error("Invalid client registration: {0}")]
    InvalidRegistration(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

impl AuthError {
    /// Cache misses are the designed path into the consent flow, not a fault.
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, AuthError::NotFound(_) | AuthError::Corrupt { .. })
    }

    /// Build an exchange error from a token endpoint rejection.
    ///
    /// OAuth servers report failures as `{"error": "...", "error_description": "..."}`;
    /// those fields are preferred over the raw body when present.
    pub fn from_token_endpoint(status: reqwest::StatusCode, body: &str) -> Self {
        #[derive(serde::Deserialize)]
        struct OAuthErrorBody {
            error: Option<String>,
            error_description: Option<String>,
        }

        let detail = match serde_json::from_str::<OAuthErrorBody>(body) {
            Ok(OAuthErrorBody {
                error: Some(code),
                error_description,
            }) => match error_description {
                Some(description) => format!("{}: {}", code, description),
                None => code,
            },
            _ => truncate_body(body),
        };

        AuthError::AuthExchange(format!("status {}: {}", status.as_u16(), detail))
    }
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_LENGTH {
        body.to_string()
    } else {
        let cut: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
        format!("{}... (truncated, {} total bytes)", cut, body.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_miss_classification() {
        assert!(AuthError::NotFound(PathBuf::from("/tmp/x")).is_cache_miss());
        assert!(AuthError::Corrupt {
            path: PathBuf::from("/tmp/x"),
            reason: "bad json".to_string(),
        }
        .is_cache_miss());
        assert!(!AuthError::Environment("no home".to_string()).is_cache_miss());
        assert!(!AuthError::Input("eof".to_string()).is_cache_miss());
    }

    #[test]
    fn test_from_token_endpoint_prefers_oauth_error_fields() {
        let err = AuthError::from_token_endpoint(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Bad Request"}"#,
        );
        assert_eq!(
            err.to_string(),
            "Token exchange failed: status 400: invalid_grant: Bad Request"
        );
    }

    #[test]
    fn test_from_token_endpoint_truncates_raw_body() {
        let body = "x".repeat(1000);
        let err = AuthError::from_token_endpoint(reqwest::StatusCode::BAD_GATEWAY, &body);
        let msg = err.to_string();
        assert!(msg.contains("status 502"));
        assert!(msg.contains("truncated, 1000 total bytes"));
    }

    #[test]
    fn test_from_token_endpoint_keeps_short_multibyte_body() {
        // 200 chars, 400 bytes
        let body = "é".repeat(200);
        let msg = AuthError::from_token_endpoint(reqwest::StatusCode::BAD_GATEWAY, &body).to_string();
        assert!(msg.ends_with(&body));
        assert!(!msg.contains("truncated"));
    }
}
