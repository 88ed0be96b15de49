//! Files of one version, read from a local directory.

use crate::error::{ErrorKind, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use exn::ResultExt;
use pkgkv_store::normalize_path;
use sha2::{Digest, Sha512};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::instrument;

/// A single published file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFile {
    /// Path relative to the version directory, normalised and `/`-separated.
    pub name: String,
    pub bytes: Vec<u8>,
    /// Subresource integrity digest of `bytes`.
    pub sri: String,
}
impl VersionFile {
    /// Build a file entry, normalising `name` and computing its digest.
    pub fn new(name: &str, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let name = normalize_path(name).or_raise(|| ErrorKind::InvalidKey(name.to_string()))?;
        let bytes = bytes.into();
        let sri = sri(&bytes);
        Ok(Self { name, bytes, sri })
    }
}

/// SHA-512 digest in subresource integrity form.
///
/// ```
/// let digest = pkgkv_index::sri(b"");
/// assert!(digest.starts_with("sha512-z4PhNX7vuL3xVChQ1m2AB9Yg5AULVxXcg/SpIdNs6c5H0NE8"));
/// ```
pub fn sri(bytes: &[u8]) -> String {
    format!("sha512-{}", STANDARD.encode(Sha512::digest(bytes)))
}

/// Read every regular file below `root`, sorted by relative name.
///
/// Symlinks and other special files are skipped. A missing or unreadable
/// directory is an error rather than an empty version.
#[instrument(skip(root), fields(root = %root.display()))]
pub async fn load_version_dir(root: &Path) -> Result<Vec<VersionFile>> {
    let mut files = Vec::new();
    let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];
    while let Some(current) = stack.pop() {
        let mut entries = fs::read_dir(&current).await.or_raise(|| ErrorKind::Io(current.clone()))?;
        while let Some(entry) = entries.next_entry().await.or_raise(|| ErrorKind::Io(current.clone()))? {
            let path = entry.path();
            // file_type() does not follow symlinks.
            let file_type = entry.file_type().await.or_raise(|| ErrorKind::Io(path.clone()))?;
            if file_type.is_dir() {
                stack.push(path);
                continue;
            }
            if !file_type.is_file() {
                tracing::debug!(path = %path.display(), "Skipping non-regular file");
                continue;
            }
            let relative = path.strip_prefix(root).or_raise(|| ErrorKind::Io(path.clone()))?;
            let name = normalize_path(relative).or_raise(|| ErrorKind::InvalidKey(relative.display().to_string()))?;
            let bytes = fs::read(&path).await.or_raise(|| ErrorKind::Io(path.clone()))?;
            let sri = sri(&bytes);
            files.push(VersionFile { name, bytes, sri });
        }
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    tracing::debug!(files = files.len(), "Loaded version directory");
    Ok(files)
}
