//! # Session Store
//!
//! The signed-in user and their bearer token, persisted between CLI runs as
//! a small TOML file.
//!
//! Writes go to a sibling temp file that is renamed over the target, so a
//! crash never leaves a half-written session. On Unix the file is created
//! with mode `0600`.

use crate::error::SessionError;
use pathyvo_core::{LoginResponse, User};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
    token_type: String,
    user: User,
}

/// File-backed authentication state.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    current: Option<StoredSession>,
}

impl SessionStore {
    /// Open the store at `path`. A missing file means signed out.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let current = match std::fs::read_to_string(&path) {
            Ok(content) => Some(toml::from_str(&content).map_err(|e| SessionError::Corrupt {
                path: path.clone(),
                message: e.to_string(),
            })?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                return Err(SessionError::Io {
                    path,
                    message: e.to_string(),
                });
            }
        };
        Ok(Self { path, current })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn token(&self) -> Option<&str> {
        self.current.as_ref().map(|s| s.access_token.as_str())
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current.as_ref().map(|s| &s.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Store the credentials from a successful login.
    pub fn login(&mut self, response: &LoginResponse) -> Result<(), SessionError> {
        let session = StoredSession {
            access_token: response.access_token.clone(),
            token_type: response.token_type.clone(),
            user: response.user(),
        };
        self.write(&session)?;
        self.current = Some(session);
        Ok(())
    }

    /// Refresh the stored user profile, keeping the token.
    pub fn update_user(&mut self, user: User) -> Result<(), SessionError> {
        let Some(mut session) = self.current.clone() else {
            return Ok(());
        };
        session.user = user;
        self.write(&session)?;
        self.current = Some(session);
        Ok(())
    }

    /// Forget the session and remove the file.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.current = None;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write(&self, session: &StoredSession) -> Result<(), SessionError> {
        let body = toml::to_string(session).map_err(|e| SessionError::Corrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        write_private(&tmp, body.as_bytes()).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    fn io_error(&self, e: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            message: e.to_string(),
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, bytes)
}
