//! In-memory store for testing.

use super::{DEFAULT_MAX_REQUEST_BYTES, KeyStream};
use crate::KvStore;
use crate::error::{ErrorKind, Result};
use crate::key::validate as validate_key;
use crate::models::BulkEntry;
use async_stream::stream;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

type ReadFailure = Box<dyn Fn(&str) -> Option<ErrorKind> + Send + Sync>;

/// A bulk write request as received by the [`MockStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedBatch {
    pub namespace: String,
    pub keys: Vec<String>,
    /// Sum of [`BulkEntry::request_size`] over all entries.
    pub request_size: usize,
}

/// In-memory key-value store for testing.
///
/// Values are stored per namespace in a map behind a [`RwLock`], so all trait
/// methods operate on `&self`. Every accepted bulk write is recorded and can
/// be inspected with [`batches()`](Self::batches). Failures can be injected
/// for a specific bulk write call or for reads.
///
/// # Examples
///
/// ```
/// use pkgkv_store::{BulkEntry, KvStore, backend::MockStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockStore::with_values("index", [("/", br#"{"packages":[]}"#)]);
/// assert!(store.exists("index", "/").await?);
///
/// store.write_batch("index", &[BulkEntry::new("foo", r#"{"versions":[]}"#, false)]).await?;
/// assert_eq!(store.read("index", "foo").await?, br#"{"versions":[]}"#);
/// # Ok(())
/// # }
/// ```
pub struct MockStore {
    name: String,
    max_request_bytes: usize,
    storage: RwLock<HashMap<String, BTreeMap<String, Vec<u8>>>>,
    batches: RwLock<Vec<RecordedBatch>>,
    write_calls: AtomicUsize,
    fail_write_call: Option<usize>,
    read_failure: Option<ReadFailure>,
}

impl MockStore {
    /// Create a mock store pre-populated with values in one namespace.
    ///
    /// Panics if any key fails validation. If test setup is wrong, then test
    /// should not pass.
    pub fn with_values(
        namespace: impl Into<String>,
        values: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>,
    ) -> Self {
        let mut map = BTreeMap::new();
        for (key, value) in values {
            let key = key.into();
            if validate_key(&key).is_err() {
                // Deliberate: MockStore is only used in tests.
                panic!("MockStore::with_values: invalid key {key:?}");
            }
            map.insert(key, value.into());
        }
        let mut storage = HashMap::new();
        storage.insert(namespace.into(), map);
        Self {
            name: "mock".to_string(),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            storage: RwLock::new(storage),
            batches: RwLock::new(Vec::new()),
            write_calls: AtomicUsize::new(0),
            fail_write_call: None,
            read_failure: None,
        }
    }

    /// Change the name of the mock store.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Lower the hard request ceiling.
    pub fn with_max_request_bytes(mut self, limit: usize) -> Self {
        self.max_request_bytes = limit;
        self
    }

    /// Reject the `n`-th (1-based) call to [`write_batch()`](KvStore::write_batch).
    pub fn fail_write_call(mut self, n: usize) -> Self {
        self.fail_write_call = Some(n);
        self
    }

    /// Fail reads for which `failure` returns an error kind.
    ///
    /// ```
    /// use pkgkv_store::{backend::MockStore, error::ErrorKind};
    ///
    /// let store = MockStore::default()
    ///     .fail_reads(|key| (key == "/").then(|| ErrorKind::PermissionDenied(key.to_string())));
    /// ```
    pub fn fail_reads(mut self, failure: impl Fn(&str) -> Option<ErrorKind> + Send + Sync + 'static) -> Self {
        self.read_failure = Some(Box::new(failure));
        self
    }

    /// Insert a value directly, bypassing bulk writes and recording.
    pub async fn insert(&self, namespace: &str, key: &str, value: impl Into<Vec<u8>>) {
        self.storage.write().await.entry(namespace.to_string()).or_default().insert(key.to_string(), value.into());
    }

    /// Every bulk write accepted so far, in submission order.
    pub async fn batches(&self) -> Vec<RecordedBatch> {
        self.batches.read().await.clone()
    }

    /// Number of calls to [`write_batch()`](KvStore::write_batch), including rejected ones.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of all keys in a namespace, sorted.
    pub async fn keys(&self, namespace: &str) -> Vec<String> {
        self.storage.read().await.get(namespace).map(|m| m.keys().cloned().collect()).unwrap_or_default()
    }
}
impl Default for MockStore {
    fn default() -> Self {
        let values: [(&str, &[u8]); 0] = [];
        Self::with_values("default", values)
    }
}

#[async_trait]
impl KvStore for MockStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_request_bytes(&self) -> usize {
        self.max_request_bytes
    }

    async fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>> {
        let key = validate_key(key)?;
        if let Some(kind) = self.read_failure.as_ref().and_then(|f| f(key)) {
            exn::bail!(kind);
        }
        let guard = self.storage.read().await;
        guard
            .get(namespace)
            .and_then(|m| m.get(key))
            .cloned()
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(key.to_string())))
    }

    async fn write_batch(&self, namespace: &str, entries: &[BulkEntry]) -> Result<()> {
        let call = self.write_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_write_call == Some(call) {
            exn::bail!(ErrorKind::Rejected(format!("injected failure on bulk write #{call}")));
        }
        let request_size: usize = entries.iter().map(BulkEntry::request_size).sum();
        if request_size > self.max_request_bytes {
            exn::bail!(ErrorKind::PayloadTooLarge { size: request_size, limit: self.max_request_bytes });
        }
        // Decode everything before touching storage, a bulk write is all or nothing.
        let mut decoded = Vec::with_capacity(entries.len());
        for entry in entries {
            validate_key(&entry.key)?;
            let value = match entry.base64 {
                true => STANDARD
                    .decode(&entry.value)
                    .map_err(|_| exn::Exn::from(ErrorKind::Rejected(format!("invalid base64 for {}", entry.key))))?,
                false => entry.value.clone().into_bytes(),
            };
            decoded.push((entry.key.clone(), value));
        }
        let mut guard = self.storage.write().await;
        let map = guard.entry(namespace.to_string()).or_default();
        map.extend(decoded);
        self.batches.write().await.push(RecordedBatch {
            namespace: namespace.to_string(),
            keys: entries.iter().map(|e| e.key.clone()).collect(),
            request_size,
        });
        Ok(())
    }

    fn list_stream<'a>(&'a self, namespace: &'a str) -> KeyStream<'a> {
        Box::pin(stream! {
            // Snapshot under the read lock, then drop it before yielding.
            let keys = self.keys(namespace).await;
            for key in keys {
                yield Ok(key);
            }
        })
    }

    async fn delete_batch(&self, namespace: &str, keys: &[String]) -> Result<()> {
        let mut guard = self.storage.write().await;
        if let Some(map) = guard.get_mut(namespace) {
            for key in keys {
                map.remove(key);
            }
        }
        Ok(())
    }
}
