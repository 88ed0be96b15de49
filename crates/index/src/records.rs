//! Index Builder: the write items that publish one version.

use crate::batch::WriteItem;
use crate::error::{ErrorKind, Result};
use crate::files::VersionFile;
use crate::models::{Asset, FileRecord, PackageIndex, Root, VersionIndex};
use exn::ResultExt;
use pkgkv_config::Config;
use pkgkv_store::{StoreHandle, join_key, normalize_path};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

/// Key of the root document.
pub const ROOT_KEY: &str = "/";

/// Items for the two index-side namespaces, each in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    /// One raw-bytes item per file (`<package>/<version>/<file>`).
    pub files: Vec<WriteItem>,
    /// Version, package and root documents, in that order.
    pub index: Vec<WriteItem>,
    /// Normalised file names in listing order, as recorded in the version
    /// document.
    pub names: Vec<String>,
}
impl RecordSet {
    /// The aggregated metadata entry listing the same names as the version
    /// document.
    pub fn asset(&self, version: &str) -> Asset {
        Asset { version: version.to_string(), files: self.names.clone() }
    }

    /// All items, file items first.
    pub fn into_items(self) -> Vec<WriteItem> {
        let mut items = self.files;
        items.extend(self.index);
        items
    }

    pub fn len(&self) -> usize {
        self.files.len() + self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.index.is_empty()
    }
}

/// A package name or version usable as a single key segment.
pub(crate) fn segment(value: &str) -> Result<&str> {
    if value.is_empty() || value.contains('/') || value == "." || value == ".." || value.contains('\0') {
        exn::bail!(ErrorKind::InvalidKey(value.to_string()));
    }
    Ok(value)
}

/// Read a key, mapping the store's `NotFound` to `None`.
pub(crate) async fn read_optional(store: &StoreHandle, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
    match store.read(namespace, key).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.is_not_found() => {
            tracing::debug!(namespace, key, "Key not found");
            Ok(None)
        },
        Err(e) => Err(e).or_raise(|| ErrorKind::Read { namespace: namespace.to_string(), key: key.to_string() }),
    }
}

async fn read_document<T: DeserializeOwned + Default>(store: &StoreHandle, namespace: &str, key: &str) -> Result<T> {
    match read_optional(store, namespace, key).await? {
        Some(bytes) => serde_json::from_slice(&bytes).or_raise(|| ErrorKind::Serialization(key.to_string())),
        None => Ok(T::default()),
    }
}

fn document<T: Serialize>(key: String, document: &T) -> Result<WriteItem> {
    let value = serde_json::to_vec(document).or_raise(|| ErrorKind::Serialization(key.clone()))?;
    Ok(WriteItem::new(key, value))
}

/// Build every write item needed to publish `version` of `package`.
///
/// The package and root documents are read from the index namespace and
/// merged; a missing document counts as empty, any other read failure aborts
/// before anything has been written. The version document is rebuilt from
/// `files` alone.
#[instrument(skip(store, config, files), fields(files = files.len()))]
pub async fn build_records_for_version(
    store: &StoreHandle,
    config: &Config,
    package: &str,
    version: &str,
    files: &[VersionFile],
) -> Result<RecordSet> {
    let package = segment(package)?;
    let version = segment(version)?;
    let version_key = join_key([package, version]).or_raise(|| ErrorKind::InvalidKey(format!("{package}/{version}")))?;

    let mut file_items = Vec::with_capacity(files.len());
    let mut records = Vec::with_capacity(files.len());
    for file in files {
        let name = normalize_path(&file.name).or_raise(|| ErrorKind::InvalidKey(file.name.clone()))?;
        let key = join_key([version_key.as_str(), name.as_str()])
            .or_raise(|| ErrorKind::InvalidKey(format!("{version_key}/{name}")))?;
        file_items.push(WriteItem::new(key, file.bytes.clone()));
        records.push(FileRecord { name, sri: file.sri.clone() });
    }

    let namespace = config.namespaces.index.as_str();
    let versions: PackageIndex = read_document(store, namespace, package).await?;
    let root: Root = read_document(store, namespace, ROOT_KEY).await?;
    tracing::debug!(known_versions = versions.versions.len(), known_packages = root.packages.len(), "Merging index documents");

    let names = records.iter().map(|r| r.name.clone()).collect();
    let index = vec![
        document(version_key, &VersionIndex { files: records })?,
        document(package.to_string(), &versions.with_version(version))?,
        document(ROOT_KEY.to_string(), &root.with_package(package))?,
    ];
    Ok(RecordSet { files: file_items, index, names })
}
