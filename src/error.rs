//! Global error handling for backutil
//!
//! This module provides a centralized error type that can represent errors
//! from all modules in the project.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Global error type for backutil operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Archive file name does not end in a valid timestamp
    #[error("Unable to parse archive name \"{name}\": {reason}")]
    Parse { name: String, reason: String },

    /// Latest-file lookup on a backup directory without files
    #[error("Backup directory contains no archives: {}", .0.display())]
    EmptyDirectory(PathBuf),

    /// Server directory without any regular file to archive
    #[error("Server directory contains no files: {}", .0.display())]
    NothingToArchive(PathBuf),

    /// Zip writer errors
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed settings file
    #[error("Configuration format error: {0}")]
    ConfigFormat(#[from] toml::de::Error),

    /// Settings could not be serialized
    #[error("Configuration write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    /// JSON processing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Directory cannot be written to
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

/// Specialized Result type for backutil operations
pub type Result<T> = std::result::Result<T, BackupError>;

/// Creates a BackupError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::BackupError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

impl BackupError {
    /// Build a parse error for the given archive name
    pub(crate) fn parse(name: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
