//! Emptying a namespace. Administrative only; publishing never deletes.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use pkgkv_config::Limits;
use pkgkv_store::StoreHandle;
use tracing::instrument;

/// Delete every key in `namespace`, at most `limits.max_delete_keys()` per
/// request. Returns the number of keys deleted.
///
/// Chunks are deleted in listing order; a rejected chunk aborts the purge
/// with earlier chunks already gone.
#[instrument(skip(store, limits))]
pub async fn purge_namespace(store: &StoreHandle, namespace: &str, limits: &Limits) -> Result<usize> {
    let keys = store.list_keys(namespace).await.or_raise(|| ErrorKind::List(namespace.to_string()))?;
    let batches = keys.len().div_ceil(limits.max_delete_keys());
    tracing::info!(keys = keys.len(), batches, "Purging namespace");
    let mut deleted = 0;
    for (index, chunk) in keys.chunks(limits.max_delete_keys()).enumerate() {
        store.delete_batch(namespace, chunk).await.or_raise(|| ErrorKind::Delete {
            namespace: namespace.to_string(),
            batch: index + 1,
            batches,
            committed: deleted,
        })?;
        deleted += chunk.len();
        tracing::debug!(batch = index + 1, batches, deleted, "Deleted keys");
    }
    Ok(deleted)
}
