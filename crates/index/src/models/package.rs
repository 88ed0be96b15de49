use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Files published for one version of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub version: String,
    pub files: Vec<String>,
}

/// A package descriptor.
///
/// Only the fields this crate acts on are typed; every other descriptor
/// field (description, homepage, license, autoupdate, ...) is carried in
/// `extra` and written back untouched.
///
/// Stored under `<package>` in the aggregated namespace, with one [`Asset`]
/// per ingested version and `version` holding the most recently ingested
/// version (not necessarily the highest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), version: None, assets: Vec::new(), extra: Map::new() }
    }

    pub fn has_version(&self, version: &str) -> bool {
        self.asset(version).is_some()
    }

    pub fn asset(&self, version: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.version == version)
    }

    /// Replace the asset for `asset.version` in place, or append it if that
    /// version has none yet. Returns `true` if an asset was replaced.
    pub fn upsert_asset(&mut self, asset: Asset) -> bool {
        match self.assets.iter_mut().find(|a| a.version == asset.version) {
            Some(existing) => {
                *existing = asset;
                true
            },
            None => {
                self.assets.push(asset);
                false
            },
        }
    }

    /// Every version with an asset, in asset order.
    pub fn versions(&self) -> impl Iterator<Item = &str> {
        self.assets.iter().map(|a| a.version.as_str())
    }
}
