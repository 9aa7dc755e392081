//! Centralized error handling for the outliner
//!
//! This module provides a unified error type that covers all error scenarios
//! in the application: configuration, durable storage, and the remote
//! course service.

use log::warn;
use std::fmt;
use std::io;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Custom Result Type Alias
// ─────────────────────────────────────────────────────────────────────────────

/// A specialized `Result` type for the application.
pub type Result<T> = std::result::Result<T, Error>;

/// The centralized error type for the application.
#[derive(Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Generic I/O error wrapper
    Io(io::Error),

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to load configuration file
    ConfigLoad {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to save configuration file
    ConfigSave {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to parse configuration or stored data (invalid JSON/format)
    ConfigParse {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration directory not found or inaccessible
    ConfigDirNotFound,

    // ─────────────────────────────────────────────────────────────────────────
    // Durable Storage Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to read the durable key/value store
    StorageLoad {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to write the durable key/value store
    StorageSave {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Remote Service Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// The requested node does not exist in the course
    NodeNotFound(String),

    /// The operation is not allowed on this node (e.g. deleting the course root)
    InvalidOperation(String),

    /// The transport worker is gone or the request could not be delivered
    Transport(String),

    // ─────────────────────────────────────────────────────────────────────────
    // Application Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Generic application error with a message
    Application(String),
}

// Implement From traits for convenient error conversion
impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigParse {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Display trait implementation for user-friendly error messages
// ─────────────────────────────────────────────────────────────────────────────
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),

            // Configuration Errors
            Error::ConfigLoad { path, source } => {
                write!(
                    f,
                    "Failed to load configuration from '{}': {}",
                    path.display(),
                    source
                )
            }
            Error::ConfigSave { path, source } => {
                write!(
                    f,
                    "Failed to save configuration to '{}': {}",
                    path.display(),
                    source
                )
            }
            Error::ConfigParse { message, .. } => {
                write!(f, "Invalid data format: {}", message)
            }
            Error::ConfigDirNotFound => {
                write!(f, "Configuration directory not found")
            }

            // Storage Errors
            Error::StorageLoad { path, source } => {
                write!(f, "Failed to read storage '{}': {}", path.display(), source)
            }
            Error::StorageSave { path, source } => {
                write!(f, "Failed to write storage '{}': {}", path.display(), source)
            }

            // Remote Service Errors
            Error::NodeNotFound(locator) => write!(f, "No outline item with locator '{}'", locator),
            Error::InvalidOperation(msg) => write!(f, "Operation not allowed: {}", msg),
            Error::Transport(msg) => write!(f, "Request failed: {}", msg),

            // Application Errors
            Error::Application(msg) => write!(f, "{}", msg),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// std::error::Error trait implementation for error chaining
// ─────────────────────────────────────────────────────────────────────────────
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::ConfigLoad { source, .. }
            | Error::ConfigSave { source, .. }
            | Error::StorageLoad { source, .. }
            | Error::StorageSave { source, .. } => Some(source.as_ref()),
            Error::ConfigParse { source, .. } => source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn std::error::Error + 'static)),
            Error::ConfigDirNotFound
            | Error::NodeNotFound(_)
            | Error::InvalidOperation(_)
            | Error::Transport(_)
            | Error::Application(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Graceful Degradation Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for Result to support graceful degradation.
pub trait ResultExt<T> {
    /// If the result is an error, log it at warning level and return the provided default.
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T;

    /// Log an error at warning level and drop it.
    ///
    /// Used for best-effort side work (ledger bookkeeping) that must never
    /// block the primary outcome.
    fn log_and_discard(self, context: &str) -> Option<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                warn!("{}: {}. Using default.", context, err);
                default
            }
        }
    }

    fn log_and_discard(self, context: &str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("{}: {}", context, err);
                None
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_creation() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "test error");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_result: std::result::Result<String, _> = serde_json::from_str("invalid json");
        let err = Error::from(json_result.unwrap_err());
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_display_node_not_found() {
        let err = Error::NodeNotFound("chapter-3".to_string());
        assert_eq!(
            format!("{}", err),
            "No outline item with locator 'chapter-3'"
        );
    }

    #[test]
    fn test_display_storage_save() {
        let err = Error::StorageSave {
            path: PathBuf::from("/tmp/local_storage.json"),
            source: Box::new(io::Error::new(io::ErrorKind::Other, "disk full")),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("local_storage.json"));
        assert!(msg.contains("disk full"));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error as StdError;
        let err = Error::StorageLoad {
            path: PathBuf::from("/x"),
            source: Box::new(io::Error::new(io::ErrorKind::NotFound, "gone")),
        };
        assert!(err.source().is_some());

        let err = Error::Transport("worker stopped".to_string());
        assert!(err.source().is_none());
    }

    #[test]
    fn test_unwrap_or_warn_default_err() {
        let result: super::Result<i32> = Err(Error::Application("test".to_string()));
        assert_eq!(result.unwrap_or_warn_default(7, "test context"), 7);
    }

    #[test]
    fn test_log_and_discard() {
        let ok: super::Result<i32> = Ok(3);
        assert_eq!(ok.log_and_discard("ctx"), Some(3));

        let err: super::Result<i32> = Err(Error::ConfigDirNotFound);
        assert_eq!(err.log_and_discard("ctx"), None);
    }
}
