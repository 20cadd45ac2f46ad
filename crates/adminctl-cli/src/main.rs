//! adminctl - Google Workspace administration from the terminal.
//!
//! Obtains (or reuses) an OAuth consent grant for the Directory and Gmail
//! APIs, then carries out the calls described by a provisioning plan.

mod plan;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use adminctl_core::api::{ADMIN_DIRECTORY_USER_SCOPE, GMAIL_SETTINGS_BASIC_SCOPE};
use adminctl_core::{
    ApiClient, AppConfig, ClientRegistration, CredentialProvider, DirectoryClient,
    GmailSettingsClient, TokenStore,
};
use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use plan::ProvisioningPlan;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Account looked up when no plan is given
const EMAIL_ENV_VAR: &str = "ADMINCTL_EMAIL";

const USAGE: &str = "Usage: adminctl [--client-secret <path>] [--plan <path>] [--credentials-dir <dir>]";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    client_secret: Option<PathBuf>,
    plan: Option<PathBuf>,
    credentials_dir: Option<PathBuf>,
    help: bool,
}

impl CliArgs {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = Self::default();
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.help = true,
                "--client-secret" => parsed.client_secret = Some(Self::value(&arg, iter.next())?),
                "--plan" => parsed.plan = Some(Self::value(&arg, iter.next())?),
                "--credentials-dir" => {
                    parsed.credentials_dir = Some(Self::value(&arg, iter.next())?)
                }
                other => bail!("Unknown argument: {}\n{}", other, USAGE),
            }
        }
        Ok(parsed)
    }

    fn value(flag: &str, value: Option<String>) -> Result<PathBuf> {
        match value {
            Some(v) if !v.starts_with("--") => Ok(PathBuf::from(v)),
            _ => bail!("{} requires a value\n{}", flag, USAGE),
        }
    }
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args = CliArgs::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = AppConfig::load().context("Unable to load adminctl config")?;

    // If modifying these scopes, delete the previously saved credential file
    // at ~/.credentials/admin-directory_v1-go-quickstart.json
    let secret_path = args
        .client_secret
        .clone()
        .unwrap_or_else(|| config.client_secret_path());
    let registration = ClientRegistration::from_file(
        &secret_path,
        &[ADMIN_DIRECTORY_USER_SCOPE, GMAIL_SETTINGS_BASIC_SCOPE],
    )?;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")?;

    let mut provider = CredentialProvider::new();
    if let Some(dir) = args.credentials_dir.as_ref().or(config.credentials_dir.as_ref()) {
        provider = provider.with_cache_path(TokenStore::locate_in(dir)?);
    }

    let transport = provider
        .acquire(http, registration)
        .await
        .context("Unable to obtain OAuth credentials")?;
    info!(cache = ?transport.cache_path(), "Credentials ready");

    let api = ApiClient::new(Arc::new(transport));
    let directory = DirectoryClient::new(api.clone());
    let gmail = GmailSettingsClient::new(api);

    match args.plan {
        Some(ref path) => {
            let plan = ProvisioningPlan::load(path)?;
            plan.execute(&directory, &gmail).await?;
        }
        None => match std::env::var(EMAIL_ENV_VAR) {
            Ok(email) if !email.trim().is_empty() => {
                let user = directory
                    .get_user(email.trim())
                    .await
                    .with_context(|| format!("Unable to retrieve user {}", email.trim()))?;
                println!("{}", user.display_line());
            }
            _ => println!("Credentials are cached; pass --plan <path> to run a provisioning plan."),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_no_args() {
        assert_eq!(CliArgs::parse(args(&[])).unwrap(), CliArgs::default());
    }

    #[test]
    fn test_parse_all_flags() {
        let parsed = CliArgs::parse(args(&[
            "--client-secret",
            "secret.json",
            "--plan",
            "plan.json",
            "--credentials-dir",
            "/tmp/home",
        ]))
        .unwrap();
        assert_eq!(parsed.client_secret, Some(PathBuf::from("secret.json")));
        assert_eq!(parsed.plan, Some(PathBuf::from("plan.json")));
        assert_eq!(parsed.credentials_dir, Some(PathBuf::from("/tmp/home")));
        assert!(!parsed.help);
    }

    #[test]
    fn test_parse_missing_value() {
        assert!(CliArgs::parse(args(&["--plan"])).is_err());
        assert!(CliArgs::parse(args(&["--plan", "--help"])).is_err());
    }

    #[test]
    fn test_parse_unknown_flag() {
        assert!(CliArgs::parse(args(&["--verbose"])).is_err());
    }

    #[test]
    fn test_parse_help() {
        assert!(CliArgs::parse(args(&["-h"])).unwrap().help);
    }
}
