//! Error types for schema compilation and loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while compiling a schema into a validator.
///
/// Compilation either succeeds completely or fails with one of these; there
/// is no partial validator. Every variant carries the JSON Pointer of the
/// schema location that caused it.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unresolvable $ref {reference:?} at {pointer:?}: {reason}")]
    UnresolvableRef {
        reference: String,
        pointer: String,
        reason: String,
    },

    #[error("cannot fetch {uri}: {message}")]
    Fetch { uri: String, message: String },

    #[error("no fetcher configured for remote reference {uri}")]
    NoFetcher { uri: String },

    #[error("invalid {keyword:?} at {pointer:?}: expected {expected}, got {found}")]
    InvalidKeyword {
        keyword: &'static str,
        pointer: String,
        expected: &'static str,
        found: String,
    },

    #[error("invalid pattern {pattern:?} at {pointer:?}: {source}")]
    InvalidPattern {
        pattern: String,
        pointer: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("invalid URI {uri:?} at {pointer:?}: {source}")]
    InvalidUri {
        uri: String,
        pointer: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid schema at {pointer:?}: {message}")]
    InvalidSchema { pointer: String, message: String },
}

impl CompileError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Fetch { .. } | Self::NoFetcher { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors while loading JSON documents from files, strings, or URLs.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } | Self::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            Self::NetworkError { .. } => 3,
            Self::InvalidJson { .. } => 2,
        }
    }
}
