//! Key-value store trait and implementations.
//!
//! The [`KvStore`] trait is the only way the rest of the workspace talks to
//! the remote store: single-key reads, bulk writes, listing and bulk deletes,
//! each scoped to a namespace. Implementations own transport concerns (HTTP,
//! credentials, retries); callers own request sizing.

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use self::mock::{MockStore, RecordedBatch};
use crate::error::{ErrorKind, Result};
use crate::models::BulkEntry;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;

/// Hard ceiling of a single bulk request body: 100 MiB.
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 104_857_600;

pub type KeyStream<'a> = Pin<Box<dyn Stream<Item = Result<String>> + Send + 'a>>;

/// Unified interface for key-value stores.
///
/// All operations are asynchronous and take `&self`; implementations must be
/// safe to share between concurrently running ingestion jobs. No client-side
/// locking is expected: the store serializes conflicting writes itself.
///
/// # Examples
///
/// ```
/// use pkgkv_store::{KvStore, error::{ErrorKind, Result}};
///
/// async fn read_or_empty(store: &dyn KvStore, namespace: &str, key: &str) -> Result<Vec<u8>> {
///     match store.read(namespace, key).await {
///         Ok(bytes) => Ok(bytes),
///         Err(e) if e.is_not_found() => Ok(Vec::new()),
///         Err(e) => Err(e),
///     }
/// }
/// ```
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Name of the configured store (used for logging only).
    fn name(&self) -> &str;

    /// Largest request body (in bytes) a single [`write_batch()`](Self::write_batch)
    /// call may carry before the store refuses it outright.
    fn max_request_bytes(&self) -> usize {
        DEFAULT_MAX_REQUEST_BYTES
    }

    /// Read the value stored under `key`.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the key does
    /// not exist; every other variant means the read itself failed and says
    /// nothing about whether the key exists.
    async fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>>;

    /// Check if a key exists.
    ///
    /// Default implementation performs a full [`read()`](Self::read).
    async fn exists(&self, namespace: &str, key: &str) -> Result<bool> {
        match self.read(namespace, key).await {
            Ok(_) => Ok(true),
            Err(e) if matches!(&*e, ErrorKind::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Write all entries in a single bulk request.
    ///
    /// Either the whole request is accepted or an error is returned; there is
    /// no per-entry status. Values flagged with `base64` are decoded by the
    /// store before being persisted.
    async fn write_batch(&self, namespace: &str, entries: &[BulkEntry]) -> Result<()>;

    /// Stream every key in a namespace.
    fn list_stream<'a>(&'a self, namespace: &'a str) -> KeyStream<'a>;

    /// List every key in a namespace.
    ///
    /// Default implementation collects [`list_stream()`](Self::list_stream).
    async fn list_keys(&self, namespace: &str) -> Result<Vec<String>> {
        self.list_stream(namespace).try_collect().await
    }

    /// Delete all given keys in a single bulk request. Missing keys are
    /// ignored.
    async fn delete_batch(&self, namespace: &str, keys: &[String]) -> Result<()>;
}
