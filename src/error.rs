//! Error types for submission-harvest
//!
//! This module defines the error hierarchy for the harvester:
//! - Feed errors (upstream unreachable, bad status, malformed listing)
//! - SQLite store errors
//! - Configuration and CLI errors
//! - Worker thread errors
//!
//! Feed errors and per-row store errors are contained where they happen
//! (worker boundary and drain loop respectively). Only an unavailable store,
//! bad configuration or a failed thread spawn reaches the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the harvester
#[derive(Error, Debug)]
pub enum HarvestError {
    /// Feed errors
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    /// Store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),
}

/// Upstream feed errors
#[derive(Error, Debug)]
pub enum FeedError {
    /// Could not build the HTTP client
    #[error("Failed to build feed client: {0}")]
    Client(String),

    /// Transport-level failure (DNS, connect, timeout, body read)
    #[error("Request for '{source_name}' failed: {reason}")]
    Request { source_name: String, reason: String },

    /// Non-success HTTP status
    #[error("Feed '{source_name}' returned HTTP {status}")]
    Status { source_name: String, status: u16 },

    /// Listing could not be decoded
    #[error("Malformed listing for '{source_name}': {reason}")]
    Decode { source_name: String, reason: String },

    /// Source has no fixture registered (in-memory feed)
    #[error("Unknown source '{0}'")]
    UnknownSource(String),
}

impl FeedError {
    /// Name of the source the error belongs to, if any
    pub fn source_name(&self) -> Option<&str> {
        match self {
            FeedError::Client(_) => None,
            FeedError::Request { source_name, .. }
            | FeedError::Status { source_name, .. }
            | FeedError::Decode { source_name, .. } => Some(source_name),
            FeedError::UnknownSource(name) => Some(name),
        }
    }
}

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Store file could not be opened or created
    #[error("Cannot open store at '{path}': {reason}")]
    Unavailable { path: PathBuf, reason: String },

    /// Table not registered with the store
    #[error("Unknown table '{0}'")]
    UnknownTable(String),

    /// Column not part of the table's declared schema
    #[error("Unknown column '{column}' for table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// Identifier contains characters outside [A-Za-z0-9_]
    #[error("Invalid SQL identifier '{0}'")]
    InvalidIdentifier(String),

    /// Insert values do not line up with the declared columns
    #[error("Table '{table}' has {expected} columns, got {actual} values")]
    ColumnCount {
        table: String,
        expected: usize,
        actual: usize,
    },

    /// Stored row could not be converted back into a submission
    #[error("Malformed row in '{table}': {reason}")]
    MalformedRow { table: String, reason: String },
}

impl StoreError {
    /// Check if this error leaves the store unusable for the rest of the run
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid fetch limit
    #[error("Invalid fetch limit {0}: must be at least 1")]
    InvalidLimit(usize),

    /// Invalid database name
    #[error("Invalid database name '{name}': {reason}")]
    InvalidDbName { name: String, reason: String },

    /// Output path error
    #[error("Invalid output path '{path}': {reason}")]
    InvalidOutputPath { path: PathBuf, reason: String },

    /// Invalid feed base URL
    #[error("Invalid feed base URL '{0}': expected http:// or https://")]
    InvalidBaseUrl(String),

    /// Invalid timeout
    #[error("Invalid {name} timeout {secs}s: must be at least 1")]
    InvalidTimeout { name: &'static str, secs: u64 },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker for '{source_name}' panicked: {message}")]
    Panicked {
        source_name: String,
        message: String,
    },

    /// Worker thread could not be spawned
    #[error("Failed to spawn worker for '{source_name}': {reason}")]
    SpawnFailed {
        source_name: String,
        reason: String,
    },
}

/// Result type alias for HarvestError
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for FeedError
pub type FeedResult<T> = std::result::Result<T, FeedError>;

/// Result type alias for StoreError
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_fatal() {
        let unavailable = StoreError::Unavailable {
            path: "/nope/admin.db".into(),
            reason: "unable to open database file".into(),
        };
        assert!(unavailable.is_fatal());

        let unknown = StoreError::UnknownTable("posts".into());
        assert!(!unknown.is_fatal());
    }

    #[test]
    fn test_error_conversion() {
        let feed_err = FeedError::Status {
            source_name: "aww".into(),
            status: 503,
        };
        assert_eq!(feed_err.source_name(), Some("aww"));

        let harvest_err: HarvestError = feed_err.into();
        assert!(matches!(harvest_err, HarvestError::Feed(_)));
    }
}
