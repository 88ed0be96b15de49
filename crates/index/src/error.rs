//! Index Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Failures from the store, compression and
//! configuration crates are kept as children in the error tree.
//!
//! A missing key is not an error at this level: reads that come back with
//! the store's `NotFound` drive the "create new document" paths instead.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An index error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a failure.
///
/// ### Precondition Errors
/// Raised before any request is sent to the store.
/// - [`ErrorKind::OversizedItem`]
/// - [`ErrorKind::InvalidKey`]
/// - [`ErrorKind::MissingField`] / [`ErrorKind::InvalidField`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Read`] / [`ErrorKind::List`]: nothing has been written.
/// - [`ErrorKind::Write`] / [`ErrorKind::Delete`]: earlier batches of the
///   same call were submitted and are not rolled back.
/// - [`ErrorKind::Serialization`] / [`ErrorKind::Compression`]: corrupt
///   stored data or a programming error; never retried.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A single value is larger than the per-item ceiling once encoded.
    #[display("oversized item {key}: {size} bytes encoded (limit {limit})")]
    OversizedItem { key: String, size: usize, limit: usize },
    /// A key could not be built from a package name, version or file path.
    #[display("invalid key: {_0:?}")]
    InvalidKey(#[error(not(source))] String),
    /// Reading an existing document failed for a reason other than the key
    /// not existing.
    #[display("failed to read {namespace}:{key}")]
    Read { namespace: String, key: String },
    /// A bulk write request was rejected.
    #[display("bulk write {batch}/{batches} ({items} items) to {namespace} failed; {committed} keys already written")]
    Write { namespace: String, batch: usize, batches: usize, items: usize, committed: usize },
    /// Listing the keys of a namespace failed.
    #[display("failed to list keys of {_0}")]
    List(#[error(not(source))] String),
    /// A bulk delete request was rejected.
    #[display("bulk delete {batch}/{batches} in {namespace} failed; {committed} keys already deleted")]
    Delete { namespace: String, batch: usize, batches: usize, committed: usize },
    /// A document could not be serialized, or a stored one could not be parsed.
    #[display("invalid document: {_0}")]
    Serialization(#[error(not(source))] String),
    /// A stored document could not be decompressed, or a new one compressed.
    #[display("compression failed for {_0}")]
    Compression(#[error(not(source))] String),
    /// Reading a version's files from disk failed.
    #[display("I/O error: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// A required field is absent from event metadata.
    #[display("missing field `{_0}`")]
    MissingField(#[error(not(source))] &'static str),
    /// An event metadata field has the wrong shape.
    #[display("invalid field `{_0}`")]
    InvalidField(#[error(not(source))] &'static str),
    /// Ingesting one version failed; the cause is the child error.
    ///
    /// `written` holds every key accepted by the store before the failure,
    /// in write order. `found` is `None` if the job stopped before the
    /// aggregated document was read.
    #[display("failed to ingest {package}@{version}; {} keys already written", written.len())]
    Ingest { package: String, version: String, written: Vec<String>, found: Option<bool> },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Only transport failures qualify; retrying is the caller's decision,
    /// nothing in this crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Write { .. } | Self::List(_) | Self::Delete { .. })
    }
}
