//! Error types for Vitrine operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used
//! across all Vitrine crates. Uses `thiserror` for derive macros.
//!
//! Every variant maps onto one [`ErrorKind`], which is what callers at the
//! edge of the system (CLI, HTTP layer) switch on.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur in Vitrine operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The caller supplied an empty or malformed request.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing credentials, bad settings, or a provider contract violation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A store or embedding provider call failed.
    #[error("Upstream dependency '{service}' failed: {message}")]
    Upstream {
        /// Which dependency failed (e.g. "lexical store", "embedding provider").
        service: String,
        /// Failure detail.
        message: String,
    },

    /// The storage backend cannot upsert (no unique constraint on url).
    #[error("Upsert not supported: {0}")]
    UpsertUnsupported(String),

    /// I/O error, optionally tied to a path.
    #[error("I/O error{}: {source}", path_suffix(.path))]
    Io {
        /// Path involved in the failed operation, when known.
        path: Option<PathBuf>,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Content not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn path_suffix(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" at {}", p.display()))
        .unwrap_or_default()
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Empty or malformed query.
    InvalidInput,
    /// Missing provider credentials or dimension mismatch.
    Configuration,
    /// Lexical store, vector store, or embedding provider failure.
    UpstreamDependency,
    /// Local storage failure (files, backend capabilities).
    Storage,
    /// Malformed data.
    InvalidData,
    /// Requested item does not exist.
    NotFound,
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an upstream dependency error.
    pub fn upstream(service: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Upstream {
            service: service.into(),
            message: msg.into(),
        }
    }

    /// Create an upsert-unsupported error.
    pub fn upsert_unsupported(msg: impl Into<String>) -> Self {
        Self::UpsertUnsupported(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Wrap an I/O error with the path that caused it.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::Io {
            path: Some(path.as_ref().to_path_buf()),
            source,
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Config(_) => ErrorKind::Configuration,
            Self::Upstream { .. } => ErrorKind::UpstreamDependency,
            Self::UpsertUnsupported(_) | Self::Io { .. } => ErrorKind::Storage,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidData(_) | Self::Serialization(_) => ErrorKind::InvalidData,
        }
    }

    /// Re-label a dependency failure as [`Error::Upstream`] for `service`.
    ///
    /// Configuration and input errors pass through untouched so they keep
    /// their kind; everything else is attributed to the dependency.
    pub fn into_upstream(self, service: &str) -> Self {
        match self {
            Self::Config(_) | Self::InvalidInput(_) | Self::Upstream { .. } => self,
            other => Self::upstream(service, other.to_string()),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using Vitrine's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::invalid_input("x").kind(), ErrorKind::InvalidInput);
        assert_eq!(Error::config("x").kind(), ErrorKind::Configuration);
        assert_eq!(
            Error::upstream("vector store", "down").kind(),
            ErrorKind::UpstreamDependency
        );
        assert_eq!(Error::upsert_unsupported("x").kind(), ErrorKind::Storage);
        assert_eq!(Error::not_found("x").kind(), ErrorKind::NotFound);
        assert_eq!(Error::invalid_data("x").kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_upstream_display_names_service() {
        let err = Error::upstream("lexical store", "connection refused");
        let msg = err.to_string();
        assert!(msg.contains("lexical store"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_into_upstream_wraps_storage_errors() {
        let err = Error::invalid_data("bad row").into_upstream("product store");
        assert_eq!(err.kind(), ErrorKind::UpstreamDependency);
        assert!(err.to_string().contains("product store"));
    }

    #[test]
    fn test_into_upstream_keeps_configuration() {
        let err = Error::config("dimension mismatch").into_upstream("embedding provider");
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_io_with_path_display() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::io_with_path(io, "/tmp/catalog.json");
        assert!(err.to_string().contains("/tmp/catalog.json"));
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_from_serde_json() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{nope");
        let err: Error = parse.unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
