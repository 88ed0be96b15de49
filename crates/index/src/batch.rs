//! Size-bounded bulk writes.
//!
//! The store limits both single values and whole bulk requests. Items are
//! packed greedily in input order: a batch is closed as soon as the next
//! item would push its encoded total over the batch budget, and that item
//! opens the next batch. Items are never reordered, so the same input always
//! yields the same batches.

use crate::encode::{Encoded, encoded_len};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use pkgkv_config::Limits;
use pkgkv_store::{BulkEntry, StoreHandle};
use tracing::instrument;

/// A single key/value write, value in raw (unencoded) form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteItem {
    pub key: String,
    pub value: Vec<u8>,
}
impl WriteItem {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into(), value: value.into() }
    }

    /// Size of the value once encoded for transport.
    pub fn encoded_size(&self) -> usize {
        encoded_len(self.value.len())
    }
}

/// One bulk request worth of encoded entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub entries: Vec<BulkEntry>,
    /// Sum of the encoded value sizes of `entries`.
    pub size: usize,
}
impl Batch {
    fn new() -> Self {
        Self { entries: Vec::new(), size: 0 }
    }
}

/// Split `items` into batches that respect `limits`.
///
/// Every item is checked against the per-item ceiling before anything is
/// encoded; the first offender fails the whole plan with
/// [`OversizedItem`](ErrorKind::OversizedItem).
///
/// ```
/// use pkgkv_config::Limits;
/// use pkgkv_index::{WriteItem, plan_batches};
///
/// let limits = Limits::new(1000, 2500).unwrap();
/// // 675 raw bytes encode to 900 base64 bytes.
/// let items: Vec<_> = (0..4).map(|i| WriteItem::new(format!("k{i}"), vec![0; 675])).collect();
/// let batches = plan_batches(items, &limits).unwrap();
/// assert_eq!(batches.iter().map(|b| b.size).collect::<Vec<_>>(), [1800, 1800]);
/// ```
pub fn plan_batches(items: Vec<WriteItem>, limits: &Limits) -> Result<Vec<Batch>> {
    for item in &items {
        let size = item.encoded_size();
        if size > limits.max_item_size() {
            exn::bail!(ErrorKind::OversizedItem { key: item.key.clone(), size, limit: limits.max_item_size() });
        }
    }
    let mut batches = Vec::new();
    let mut current = Batch::new();
    for item in items {
        let encoded = Encoded::encode(&item.value);
        let size = encoded.len();
        // Never true for the first item of a batch: the per-item ceiling is
        // strictly below the batch budget.
        if current.size + size > limits.max_batch_payload() {
            batches.push(std::mem::replace(&mut current, Batch::new()));
        }
        current.entries.push(BulkEntry::new(item.key, encoded.into_string(), true));
        current.size += size;
    }
    if !current.entries.is_empty() {
        batches.push(current);
    }
    Ok(batches)
}

/// Writes item sets to one namespace, one bulk request per batch.
pub struct BulkWriter<'a> {
    store: &'a StoreHandle,
    namespace: &'a str,
    limits: Limits,
}
impl<'a> BulkWriter<'a> {
    pub fn new(store: &'a StoreHandle, namespace: &'a str, limits: Limits) -> Self {
        if exceeds_ceiling(&limits, store.max_request_bytes()) {
            tracing::warn!(
                store = store.name(),
                budget = limits.max_batch_payload(),
                ceiling = store.max_request_bytes(),
                "Batch budget leaves no room under the store's request ceiling"
            );
        }
        Self { store, namespace, limits }
    }

    /// Write every item, returning all keys in input order.
    ///
    /// Batches are submitted sequentially in order. The first rejected batch
    /// aborts the call with [`Write`](ErrorKind::Write); batches submitted
    /// before it stay written. Nothing is retried.
    pub async fn write_all(&self, items: Vec<WriteItem>) -> Result<Vec<String>> {
        let mut written = Vec::new();
        self.write_into(items, &mut written).await?;
        Ok(written)
    }

    /// Same as [`write_all`](Self::write_all), but keys are appended to
    /// `written` as each batch is accepted, so on failure `written` still
    /// holds every key that reached the store.
    #[instrument(skip(self, items, written), fields(namespace = self.namespace, items = items.len()))]
    pub async fn write_into(&self, items: Vec<WriteItem>, written: &mut Vec<String>) -> Result<()> {
        let batches = plan_batches(items, &self.limits)?;
        let total = batches.len();
        let start = written.len();
        for (index, batch) in batches.into_iter().enumerate() {
            let items = batch.entries.len();
            tracing::debug!(batch = index + 1, batches = total, items, bytes = batch.size, "Submitting bulk write");
            self.store.write_batch(self.namespace, &batch.entries).await.or_raise(|| ErrorKind::Write {
                namespace: self.namespace.to_string(),
                batch: index + 1,
                batches: total,
                items,
                committed: written.len() - start,
            })?;
            written.extend(batch.entries.into_iter().map(|entry| entry.key));
        }
        tracing::info!(namespace = self.namespace, keys = written.len() - start, batches = total, "Bulk write complete");
        Ok(())
    }
}

/// A full batch plus its keys and framing must stay strictly below the
/// store's request ceiling, so a budget equal to the ceiling is already too
/// large.
fn exceeds_ceiling(limits: &Limits, ceiling: usize) -> bool {
    limits.max_batch_payload() >= ceiling
}
