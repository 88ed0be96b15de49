//! Configuration Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Explicitly requested configuration file does not exist
    #[display("configuration file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Providers could not be merged or extracted (syntax, wrong types)
    #[display("could not load configuration")]
    Load,
    /// A per-item ceiling that doesn't fit inside the per-batch ceiling
    #[display("max_item_size ({max_item_size}) must be non-zero and below max_batch_payload ({max_batch_payload})")]
    InvalidLimits { max_item_size: usize, max_batch_payload: usize },
    /// A value that must be at least one
    #[display("{_0} must be at least 1")]
    Zero(#[error(not(source))] &'static str),
    /// A namespace identifier was left empty
    #[display("namespace `{_0}` is not configured")]
    MissingNamespace(#[error(not(source))] &'static str),
    /// Aggregated metadata would share a namespace with index documents or
    /// files, so a package key could overwrite one of them
    #[display("namespace `aggregated` must differ from `{_0}`")]
    SharedNamespace(#[error(not(source))] &'static str),
    /// Unknown compression format
    #[display("invalid compression format")]
    Compression,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
