use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::credential::Credential;
use super::error::{AuthError, Result};

/// Directory under the user's home holding cached credentials
const CREDENTIALS_DIR: &str = ".credentials";

/// Cache file name. Fixed, so it does not change with the requested scopes.
const CACHE_FILE_NAME: &str = "admin-directory_v1-go-quickstart.json";

/// Reads and writes the single cached credential file.
pub struct TokenStore;

impl TokenStore {
    /// Compute the cache file path under the current user's home directory,
    /// creating the credentials directory if needed.
    pub fn locate() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            AuthError::Environment("Could not determine home directory".to_string())
        })?;
        Self::locate_in(&home)
    }

    /// Same derivation as [`TokenStore::locate`], rooted at `home`.
    pub fn locate_in(home: &Path) -> Result<PathBuf> {
        let dir = home.join(CREDENTIALS_DIR);
        create_private_dir(&dir).map_err(|e| {
            AuthError::Environment(format!(
                "Failed to create credentials directory {}: {}",
                dir.display(),
                e
            ))
        })?;
        Ok(dir.join(escaped_file_name()))
    }

    /// Load a credential from disk
    pub fn load(path: &Path) -> Result<Credential> {
        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AuthError::NotFound(path.to_path_buf()));
            }
            Err(e) => {
                return Err(AuthError::Environment(format!(
                    "Failed to read credential file {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let credential: Credential =
            serde_json::from_slice(&contents).map_err(|e| AuthError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        debug!(path = %path.display(), "Loaded cached credential");
        Ok(credential)
    }

    /// Save a credential to disk, replacing any previous contents
    pub fn save(path: &Path, credential: &Credential) -> Result<()> {
        info!(path = %path.display(), "Saving credential file");

        let contents = serde_json::to_vec_pretty(credential).map_err(|e| {
            AuthError::Environment(format!("Failed to serialize credential: {}", e))
        })?;

        let mut file = open_private_file(path).map_err(|e| {
            AuthError::Environment(format!(
                "Unable to cache oauth token at {}: {}",
                path.display(),
                e
            ))
        })?;
        file.write_all(&contents)
            .and_then(|_| file.sync_all())
            .map_err(|e| {
                AuthError::Environment(format!(
                    "Unable to cache oauth token at {}: {}",
                    path.display(),
                    e
                ))
            })?;
        Ok(())
    }
}

fn escaped_file_name() -> String {
    url::form_urlencoded::byte_serialize(CACHE_FILE_NAME.as_bytes()).collect()
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)
}

#[cfg(unix)]
fn open_private_file(path: &Path) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private_file(path: &Path) -> std::io::Result<fs::File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
