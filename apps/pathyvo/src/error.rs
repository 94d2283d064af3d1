//! # Error Types
//!
//! Errors raised by the client, configuration and session layers, and the
//! `AppError` that the CLI reports.

use pathyvo_core::PathyvoError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the HTTP client layer.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Cannot reach the backend, or the request timed out.
    #[error("Cannot connect to Pathyvo at {0}")]
    ConnectionFailed(String),

    /// 401: missing, expired or rejected credentials. The session is cleared.
    #[error("Unauthorized: please log in again")]
    Unauthorized,

    /// 403: the resource belongs to another user.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 404.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend returned a 5xx error.
    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    /// Any other non-success status.
    #[error("Unexpected status ({0}): {1}")]
    UnexpectedStatus(u16, String),

    /// The response body did not match the expected shape.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The command needs a signed-in user.
    #[error("Not logged in")]
    NotLoggedIn,

    /// The session file could not be updated.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("Invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Errors reading or writing the stored session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No session location: set PATHYVO_SESSION_FILE or a config directory")]
    NoLocation,

    #[error("Session file {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Corrupt session file {path}: {message}")]
    Corrupt { path: PathBuf, message: String },
}

/// Top-level error reported by the CLI.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] PathyvoError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    /// A view operation failed; carries the user-facing message.
    #[error("{0}")]
    View(String),

    /// A destructive command was run without confirmation.
    #[error("{0} (pass --yes to confirm)")]
    NotConfirmed(String),
}

impl AppError {
    /// Whether the error means the user must log in again.
    pub fn needs_login(&self) -> bool {
        matches!(
            self,
            AppError::Client(ClientError::Unauthorized | ClientError::NotLoggedIn)
        )
    }
}
