use crate::error::{DocSyncError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// The one durable key holding the bearer token across restarts.
///
/// All methods are synchronous so the in-memory and durable views of the
/// session agree as soon as a caller's `login`/`logout` returns.
pub trait TokenPersistence: Send + Sync {
    fn load(&self) -> Result<Option<String>>;

    fn store(&self, token: &str) -> Result<()>;

    /// Removing an absent token is not an error.
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    token: String,
}

/// JSON file holding `{ "token": "..." }`, mode 0600 on unix.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn persistence_error(action: &str, path: &Path, error: impl std::fmt::Display) -> DocSyncError {
    DocSyncError::Persistence(format!(
        "failed to {action} session file '{}': {error}",
        path.display()
    ))
}

impl TokenPersistence for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(persistence_error("read", &self.path, error)),
        };
        let persisted: PersistedSession = serde_json::from_str(&contents)
            .map_err(|error| persistence_error("parse", &self.path, error))?;
        let token = persisted.token.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    fn store(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|error| persistence_error("create directory for", &self.path, error))?;
        }

        let json = serde_json::to_string_pretty(&PersistedSession {
            token: token.to_string(),
        })
        .map_err(|error| persistence_error("serialize", &self.path, error))?;
        fs::write(&self.path, json).map_err(|error| persistence_error("write", &self.path, error))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|error| persistence_error("restrict permissions on", &self.path, error))?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(error) => Err(persistence_error("remove", &self.path, error)),
        }
    }
}

/// In-process token slot for embedders and tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenPersistence for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn store(&self, token: &str) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
