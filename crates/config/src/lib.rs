//! Configuration loading and validation.
//!
//! Configuration is layered with [`figment`], later layers overriding earlier
//! ones:
//!
//! 1. Built-in defaults (see [`Limits::default`]).
//! 2. A TOML file, either given explicitly or found in the platform config
//!    directory (`pkgkv/config.toml`).
//! 3. Environment variables prefixed with `PKGKV_`, using `__` for nesting
//!    (`PKGKV_LIMITS__MAX_ITEM_SIZE=1048576`).
//!
//! The result is validated once into a [`Config`] which is then passed by
//! reference into every component; nothing reads the environment after that.
//!
//! ```toml
//! workers = 10
//! compression = "gzip"
//!
//! [limits]
//! max_item_size = 26214400
//! max_batch_payload = 100000000
//!
//! [namespaces]
//! files = "4fe1c2..."
//! index = "4fe1c2..."
//! aggregated = "9b03aa..."
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use pkgkv_compress::Compression;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest single value the store accepts: 25 MiB.
pub const DEFAULT_MAX_ITEM_SIZE: usize = 26_214_400;
/// Bulk request budget. The hard limit is 100 MiB, but every entry also
/// carries its key and encoding flag, so stay at a round 100 MB.
pub const DEFAULT_MAX_BATCH_PAYLOAD: usize = 100_000_000;
/// Keys per bulk delete request.
pub const DEFAULT_MAX_DELETE_KEYS: usize = 10_000;
pub const DEFAULT_WORKERS: usize = 10;

const ENV_PREFIX: &str = "PKGKV_";

/// Size ceilings for bulk writes.
///
/// Invariant: `0 < max_item_size < max_batch_payload`, so any item that
/// passes the per-item check fits into an empty batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    max_item_size: usize,
    max_batch_payload: usize,
    max_delete_keys: usize,
}
impl Limits {
    pub fn new(max_item_size: usize, max_batch_payload: usize) -> Result<Self> {
        Self { max_item_size, max_batch_payload, max_delete_keys: DEFAULT_MAX_DELETE_KEYS }.validate()
    }

    pub fn with_max_delete_keys(mut self, max_delete_keys: usize) -> Result<Self> {
        self.max_delete_keys = max_delete_keys;
        self.validate()
    }

    fn validate(self) -> Result<Self> {
        if self.max_item_size == 0 || self.max_item_size >= self.max_batch_payload {
            exn::bail!(ErrorKind::InvalidLimits {
                max_item_size: self.max_item_size,
                max_batch_payload: self.max_batch_payload,
            });
        }
        if self.max_delete_keys == 0 {
            exn::bail!(ErrorKind::Zero("max_delete_keys"));
        }
        Ok(self)
    }

    /// Largest encoded size of a single value.
    pub fn max_item_size(&self) -> usize {
        self.max_item_size
    }

    /// Largest sum of encoded value sizes in one bulk request.
    pub fn max_batch_payload(&self) -> usize {
        self.max_batch_payload
    }

    pub fn max_delete_keys(&self) -> usize {
        self.max_delete_keys
    }
}
impl Default for Limits {
    fn default() -> Self {
        Self {
            max_item_size: DEFAULT_MAX_ITEM_SIZE,
            max_batch_payload: DEFAULT_MAX_BATCH_PAYLOAD,
            max_delete_keys: DEFAULT_MAX_DELETE_KEYS,
        }
    }
}

/// Store namespace identifiers for each kind of document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespaces {
    /// Raw file blobs (`<package>/<version>/<file>`).
    pub files: String,
    /// Root, package and version documents.
    pub index: String,
    /// Gzipped aggregated metadata (`<package>`).
    pub aggregated: String,
}
impl Namespaces {
    /// Files and index documents may share a namespace. Aggregated
    /// documents are keyed by bare package name, which is also the key of a
    /// package document, so they need a namespace of their own.
    fn validate(self) -> Result<Self> {
        for (name, value) in [("files", &self.files), ("index", &self.index), ("aggregated", &self.aggregated)] {
            if value.trim().is_empty() {
                exn::bail!(ErrorKind::MissingNamespace(name));
            }
        }
        for (name, value) in [("index", &self.index), ("files", &self.files)] {
            if value.trim() == self.aggregated.trim() {
                exn::bail!(ErrorKind::SharedNamespace(name));
            }
        }
        Ok(self)
    }
}

/// Shape of the configuration as it appears in files and the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawConfig {
    workers: usize,
    compression: String,
    limits: Limits,
    namespaces: Namespaces,
}
impl Default for RawConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            compression: Compression::Gzip.to_string(),
            limits: Limits::default(),
            namespaces: Namespaces::default(),
        }
    }
}

/// Validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub limits: Limits,
    pub namespaces: Namespaces,
    /// Maximum number of ingestion jobs in flight.
    pub workers: usize,
    /// Compression applied to aggregated metadata documents.
    pub compression: Compression,
}
impl Config {
    /// Build a configuration directly, with default worker count and
    /// compression.
    pub fn new(namespaces: Namespaces, limits: Limits) -> Result<Self> {
        Ok(Self {
            limits,
            namespaces: namespaces.validate()?,
            workers: DEFAULT_WORKERS,
            compression: Compression::Gzip,
        })
    }

    /// Load from defaults, a TOML file and the environment.
    ///
    /// An explicit `path` must exist. Without one, the default location in
    /// the platform config directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_path().filter(|p| p.is_file()),
        };
        let mut figment = Figment::from(Serialized::defaults(RawConfig::default()));
        if let Some(file) = &file {
            tracing::debug!(path = %file.display(), "Loading configuration file");
            figment = figment.merge(Toml::file(file));
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract and validate a configuration from an arbitrary figment.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let raw: RawConfig = figment.extract().or_raise(|| ErrorKind::Load)?;
        if raw.workers == 0 {
            exn::bail!(ErrorKind::Zero("workers"));
        }
        Ok(Self {
            limits: raw.limits.validate()?,
            namespaces: raw.namespaces.validate()?,
            workers: raw.workers,
            compression: raw.compression.parse::<Compression>().or_raise(|| ErrorKind::Compression)?,
        })
    }

    pub fn with_workers(mut self, workers: usize) -> Result<Self> {
        if workers == 0 {
            exn::bail!(ErrorKind::Zero("workers"));
        }
        self.workers = workers;
        Ok(self)
    }
}

/// `<platform config dir>/pkgkv/config.toml`, if a home directory is known.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "pkgkv").map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    const NAMESPACES: &str = r#"
        [namespaces]
        files = "files-ns"
        index = "index-ns"
        aggregated = "aggregated-ns"
    "#;

    fn figment_from(toml: &str) -> Figment {
        Figment::from(Serialized::defaults(RawConfig::default())).merge(Toml::string(toml))
    }

    #[test]
    fn test_defaults_with_namespaces() {
        let config = Config::from_figment(figment_from(NAMESPACES)).unwrap();
        assert_eq!(config.limits, Limits::default());
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.compression, Compression::Gzip);
        assert_eq!(config.namespaces.aggregated, "aggregated-ns");
    }

    #[test]
    fn test_missing_namespace() {
        let err = Config::from_figment(figment_from("")).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingNamespace("files")));
    }

    #[test]
    fn test_overrides() {
        let toml = format!(
            "workers = 3\ncompression = \"none\"\n[limits]\nmax_item_size = 1000\nmax_batch_payload = 2500\nmax_delete_keys = 5\n{NAMESPACES}"
        );
        let config = Config::from_figment(figment_from(&toml)).unwrap();
        assert_eq!(config.workers, 3);
        assert_eq!(config.compression, Compression::None);
        assert_eq!(config.limits.max_item_size(), 1000);
        assert_eq!(config.limits.max_batch_payload(), 2500);
        assert_eq!(config.limits.max_delete_keys(), 5);
    }

    #[test]
    fn test_invalid_compression() {
        let toml = format!("compression = \"lz4\"\n{NAMESPACES}");
        let err = Config::from_figment(figment_from(&toml)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Compression));
    }

    #[test]
    fn test_wrong_type() {
        let toml = format!("workers = \"many\"\n{NAMESPACES}");
        let err = Config::from_figment(figment_from(&toml)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load));
    }

    #[test]
    fn test_zero_workers() {
        let toml = format!("workers = 0\n{NAMESPACES}");
        let err = Config::from_figment(figment_from(&toml)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Zero("workers")));
    }

    #[rstest]
    #[case(1000, 2500, true)]
    #[case(2499, 2500, true)]
    #[case(2500, 2500, false)]
    #[case(3000, 2500, false)]
    #[case(0, 2500, false)]
    fn test_limits(#[case] item: usize, #[case] batch: usize, #[case] valid: bool) {
        assert_eq!(Limits::new(item, batch).is_ok(), valid);
    }

    #[test]
    fn test_limits_delete_keys() {
        let limits = Limits::new(1000, 2500).unwrap();
        assert_eq!(limits.max_delete_keys(), DEFAULT_MAX_DELETE_KEYS);
        assert!(limits.with_max_delete_keys(0).is_err());
        assert_eq!(limits.with_max_delete_keys(2).unwrap().max_delete_keys(), 2);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "workers = 4\n{NAMESPACES}").unwrap();
        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.namespaces.files, "files-ns");
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_new_validates_namespaces() {
        let namespaces = Namespaces { files: "f".into(), index: " ".into(), aggregated: "a".into() };
        let err = Config::new(namespaces, Limits::default()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingNamespace("index")));
    }

    #[rstest]
    #[case("kv", "kv", "kv", "index")]
    #[case("f", "i", "i", "index")]
    #[case("f", "i", "f", "files")]
    #[case("f", "i", " f ", "files")]
    fn test_aggregated_namespace_must_be_separate(
        #[case] files: &str,
        #[case] index: &str,
        #[case] aggregated: &str,
        #[case] clash: &str,
    ) {
        let namespaces = Namespaces { files: files.into(), index: index.into(), aggregated: aggregated.into() };
        let err = Config::new(namespaces, Limits::default()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::SharedNamespace(name) if *name == clash));
    }

    #[test]
    fn test_files_and_index_may_share() {
        let namespaces = Namespaces { files: "kv".into(), index: "kv".into(), aggregated: "agg".into() };
        assert!(Config::new(namespaces, Limits::default()).is_ok());
    }

    #[test]
    fn test_shared_aggregated_namespace_from_figment() {
        let toml = "[namespaces]\nfiles = \"kv\"\nindex = \"kv\"\naggregated = \"kv\"\n";
        let err = Config::from_figment(figment_from(toml)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::SharedNamespace("index")));
    }
}
