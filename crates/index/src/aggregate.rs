//! Aggregated metadata: one compressed document per package holding its
//! descriptor and the file listing of every ingested version.

use crate::batch::{BulkWriter, WriteItem};
use crate::error::{ErrorKind, Result};
use crate::models::{Asset, Package};
use crate::records::{read_optional, segment};
use exn::ResultExt;
use pkgkv_config::Config;
use pkgkv_store::StoreHandle;
use tracing::instrument;

/// Result of [`update_aggregated_metadata`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOutcome {
    /// Keys written to the aggregated namespace.
    pub written: Vec<String>,
    /// Whether an aggregated document existed before this update.
    pub found: bool,
}

/// Merge `asset` for `version` into an aggregated document.
///
/// - No existing document: `base` becomes the document with `asset` as its
///   only entry.
/// - Existing document without `version`: `asset` is appended.
/// - Existing document with `version`: that entry is replaced in place.
///
/// In all cases `version` becomes the document's current version. Returns
/// the merged document and whether `existing` was present.
///
/// ```
/// use pkgkv_index::merge_aggregated;
/// use pkgkv_index::models::{Asset, Package};
///
/// let asset = Asset { version: "1.0.0".into(), files: vec!["a.js".into()] };
/// let (merged, found) = merge_aggregated(None, &Package::new("foo"), "1.0.0", asset.clone());
/// assert!(!found);
/// assert_eq!(merged.assets, [asset]);
/// assert_eq!(merged.version.as_deref(), Some("1.0.0"));
/// ```
pub fn merge_aggregated(existing: Option<Package>, base: &Package, version: &str, asset: Asset) -> (Package, bool) {
    let (mut merged, found) = match existing {
        None => {
            let mut merged = base.clone();
            merged.assets = vec![asset];
            (merged, false)
        },
        Some(mut merged) => {
            merged.upsert_asset(asset);
            (merged, true)
        },
    };
    merged.version = Some(version.to_string());
    (merged, found)
}

/// Read and decode the aggregated document of `package`, if there is one.
pub async fn read_aggregated(store: &StoreHandle, config: &Config, package: &str) -> Result<Option<Package>> {
    let namespace = config.namespaces.aggregated.as_str();
    let Some(bytes) = read_optional(store, namespace, package).await? else {
        return Ok(None);
    };
    let json = config.compression.decompress(&bytes).or_raise(|| ErrorKind::Compression(package.to_string()))?;
    let document = serde_json::from_slice(&json).or_raise(|| ErrorKind::Serialization(package.to_string()))?;
    Ok(Some(document))
}

/// Merge `asset` into the stored aggregated document of `base.name` and
/// write it back compressed.
///
/// A read failure other than the key not existing aborts without writing.
/// A stored document that fails to decompress or parse is never
/// overwritten.
#[instrument(skip(store, config, base, asset), fields(package = %base.name, files = asset.files.len()))]
pub async fn update_aggregated_metadata(
    store: &StoreHandle,
    config: &Config,
    base: &Package,
    version: &str,
    asset: Asset,
) -> Result<AggregateOutcome> {
    let (item, found) = prepare_aggregated(store, config, base, version, asset).await?;
    let written = BulkWriter::new(store, &config.namespaces.aggregated, config.limits).write_all(vec![item]).await?;
    Ok(AggregateOutcome { written, found })
}

/// Everything in [`update_aggregated_metadata`] short of writing: the
/// compressed merged document and whether one was stored before.
pub(crate) async fn prepare_aggregated(
    store: &StoreHandle,
    config: &Config,
    base: &Package,
    version: &str,
    asset: Asset,
) -> Result<(WriteItem, bool)> {
    let package = segment(&base.name)?;
    let existing = read_aggregated(store, config, package).await?;
    match &existing {
        None => tracing::info!(package, "Aggregated metadata not found, inserting"),
        Some(document) if document.has_version(version) => {
            tracing::info!(package, version, "Aggregated metadata found, replacing existing version")
        },
        Some(_) => tracing::info!(package, version, "Aggregated metadata found, appending version"),
    }
    let (merged, found) = merge_aggregated(existing, base, version, asset);

    let json = serde_json::to_vec(&merged).or_raise(|| ErrorKind::Serialization(package.to_string()))?;
    let value = config.compression.compress(&json).or_raise(|| ErrorKind::Compression(package.to_string()))?;
    tracing::debug!(raw = json.len(), compressed = value.len(), "Compressed aggregated metadata");
    Ok((WriteItem::new(package, value), found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgkv_compress::Compression;
    use pkgkv_config::{Limits, Namespaces};
    use pkgkv_store::KvStore;
    use pkgkv_store::backend::MockStore;
    use pkgkv_store::error::ErrorKind as StoreErrorKind;
    use serde_json::json;
    use std::sync::Arc;

    fn config() -> Config {
        let namespaces = Namespaces { files: "files".into(), index: "index".into(), aggregated: "agg".into() };
        Config::new(namespaces, Limits::default()).unwrap()
    }

    fn asset(version: &str, files: &[&str]) -> Asset {
        Asset { version: version.into(), files: files.iter().map(|f| f.to_string()).collect() }
    }

    fn base() -> Package {
        serde_json::from_value(json!({"name": "foo", "description": "Foo", "license": "MIT"})).unwrap()
    }

    fn gzipped(package: &Package) -> Vec<u8> {
        Compression::Gzip.compress(&serde_json::to_vec(package).unwrap()).unwrap()
    }

    async fn stored(mock: &MockStore) -> Package {
        let bytes = mock.read("agg", "foo").await.unwrap();
        serde_json::from_slice(&Compression::Gzip.decompress(&bytes).unwrap()).unwrap()
    }

    #[test]
    fn test_merge_new_document() {
        let (merged, found) = merge_aggregated(None, &base(), "1.0.0", asset("1.0.0", &["a.js"]));
        assert!(!found);
        assert_eq!(merged.assets, [asset("1.0.0", &["a.js"])]);
        assert_eq!(merged.version.as_deref(), Some("1.0.0"));
        assert_eq!(merged.extra["license"], "MIT");
    }

    #[test]
    fn test_merge_appends() {
        let mut existing = base();
        existing.assets = vec![asset("1.0.0", &["a.js"])];
        let (merged, found) = merge_aggregated(Some(existing), &base(), "2.0.0", asset("2.0.0", &["b.js"]));
        assert!(found);
        assert_eq!(merged.assets, [asset("1.0.0", &["a.js"]), asset("2.0.0", &["b.js"])]);
        assert_eq!(merged.version.as_deref(), Some("2.0.0"));
    }

    #[test]
    fn test_merge_replaces_in_place() {
        let mut existing = base();
        existing.version = Some("2.0.0".into());
        existing.assets = vec![asset("1.0.0", &["a.js"]), asset("2.0.0", &["b.js"])];
        let (merged, found) = merge_aggregated(Some(existing), &base(), "1.0.0", asset("1.0.0", &["c.js"]));
        assert!(found);
        assert_eq!(merged.assets, [asset("1.0.0", &["c.js"]), asset("2.0.0", &["b.js"])]);
        // Most recently ingested, not highest.
        assert_eq!(merged.version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_merge_keeps_existing_descriptor() {
        let mut existing = base();
        existing.extra.insert("description".into(), json!("Stored"));
        existing.assets = vec![asset("1.0.0", &[])];
        let (merged, _) = merge_aggregated(Some(existing), &base(), "1.0.0", asset("1.0.0", &[]));
        assert_eq!(merged.extra["description"], "Stored");
    }

    #[test]
    fn test_remerge_is_idempotent() {
        let (first, _) = merge_aggregated(None, &base(), "1.0.0", asset("1.0.0", &["a.js"]));
        let (second, found) = merge_aggregated(Some(first), &base(), "1.0.0", asset("1.0.0", &["a.js", "b.js"]));
        assert!(found);
        assert_eq!(second.assets, [asset("1.0.0", &["a.js", "b.js"])]);
    }

    #[tokio::test]
    async fn test_update_not_found_inserts() {
        let mock = Arc::new(MockStore::default());
        let store: StoreHandle = mock.clone();
        let outcome = update_aggregated_metadata(&store, &config(), &base(), "1.0.0", asset("1.0.0", &["a.js"]))
            .await
            .unwrap();
        assert_eq!(outcome, AggregateOutcome { written: vec!["foo".into()], found: false });
        let document = stored(&mock).await;
        assert_eq!(document.assets, [asset("1.0.0", &["a.js"])]);
        assert_eq!(document.extra["description"], "Foo");
    }

    #[tokio::test]
    async fn test_update_existing() {
        let mut existing = base();
        existing.assets = vec![asset("1.0.0", &["a.js"])];
        let mock = Arc::new(MockStore::with_values("agg", [("foo", gzipped(&existing))]));
        let store: StoreHandle = mock.clone();
        let outcome = update_aggregated_metadata(&store, &config(), &base(), "2.0.0", asset("2.0.0", &["b.js"]))
            .await
            .unwrap();
        assert!(outcome.found);
        let document = stored(&mock).await;
        assert_eq!(document.versions().collect::<Vec<_>>(), ["1.0.0", "2.0.0"]);
        assert_eq!(document.version.as_deref(), Some("2.0.0"));
    }

    #[tokio::test]
    async fn test_read_failure_writes_nothing() {
        let mock = Arc::new(
            MockStore::default().fail_reads(|key| Some(StoreErrorKind::Network(format!("timeout reading {key}")))),
        );
        let store: StoreHandle = mock.clone();
        let err = update_aggregated_metadata(&store, &config(), &base(), "1.0.0", asset("1.0.0", &[]))
            .await
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Read { namespace, .. } if namespace == "agg"));
        assert_eq!(mock.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_document_is_not_overwritten() {
        let mock = Arc::new(MockStore::with_values("agg", [("foo", b"{\"name\":\"foo\"}".to_vec())]));
        let store: StoreHandle = mock.clone();
        let err = update_aggregated_metadata(&store, &config(), &base(), "1.0.0", asset("1.0.0", &[]))
            .await
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Compression(key) if key == "foo"));
        assert_eq!(mock.write_calls(), 0);
    }

    #[tokio::test]
    async fn test_unparsable_document() {
        let mock = Arc::new(MockStore::with_values("agg", [("foo", Compression::Gzip.compress(b"[1,2]").unwrap())]));
        let store: StoreHandle = mock.clone();
        let err = update_aggregated_metadata(&store, &config(), &base(), "1.0.0", asset("1.0.0", &[]))
            .await
            .unwrap_err();
        assert!(matches!(&*err, ErrorKind::Serialization(_)));
    }
}
