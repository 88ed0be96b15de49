//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! [`ErrorKind::NotFound`] is deliberately its own variant: callers building
//! documents read-modify-write treat a missing key as "start from empty",
//! while every other failure must abort before anything gets written.

use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Key does not exist in the namespace
    #[display("key not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// Access denied (bad credentials, wrong account)
    #[display("permission denied: {_0}")]
    PermissionDenied(#[error(not(source))] String),
    /// Network-related error (connection reset, timeouts, etc.)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// The store accepted the request but reported it as unsuccessful
    #[display("request rejected: {_0}")]
    Rejected(#[error(not(source))] String),
    /// Key is empty, too long, or contains forbidden characters
    #[display("invalid key: {_0:?}")]
    InvalidKey(#[error(not(source))] String),
    /// Request body exceeds the hard ceiling of the store
    #[display("payload too large: {size} bytes (limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Rejected(_))
    }

    /// Returns `true` for the expected "key does not exist" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
