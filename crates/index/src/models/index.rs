use crate::sorted::insert_if_absent;
use serde::{Deserialize, Serialize};

/// Every known package name, sorted and unique. Stored under `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Root {
    #[serde(default)]
    pub packages: Vec<String>,
}
impl Root {
    /// Copy of this document including `package`.
    #[must_use]
    pub fn with_package(&self, package: &str) -> Self {
        Self { packages: insert_if_absent(&self.packages, package) }
    }
}

/// Every known version of one package, sorted and unique. Stored under
/// `<package>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageIndex {
    #[serde(default)]
    pub versions: Vec<String>,
}
impl PackageIndex {
    /// Copy of this document including `version`.
    #[must_use]
    pub fn with_version(&self, version: &str) -> Self {
        Self { versions: insert_if_absent(&self.versions, version) }
    }
}

/// Files of one published version. Stored under `<package>/<version>` and
/// always rewritten from the current listing, never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionIndex {
    pub files: Vec<FileRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the version directory, `/`-separated.
    pub name: String,
    /// Subresource integrity digest (`sha512-<base64>`).
    pub sri: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_scenario() {
        let root: Root = serde_json::from_str(r#"{"packages":[]}"#).unwrap();
        let root = root.with_package("foo");
        assert_eq!(root.packages, ["foo"]);
        let root = root.with_package("bar");
        assert_eq!(root.packages, ["bar", "foo"]);
        assert_eq!(root.with_package("foo"), root);
        assert_eq!(serde_json::to_string(&root).unwrap(), r#"{"packages":["bar","foo"]}"#);
    }

    #[test]
    fn test_missing_list_is_empty() {
        assert_eq!(serde_json::from_str::<Root>("{}").unwrap(), Root::default());
        assert_eq!(serde_json::from_str::<PackageIndex>("{}").unwrap(), PackageIndex::default());
    }

    #[test]
    fn test_version_wire_format() {
        let version = VersionIndex {
            files: vec![FileRecord { name: "dist/a.js".into(), sri: "sha512-abc".into() }],
        };
        assert_eq!(serde_json::to_string(&version).unwrap(), r#"{"files":[{"name":"dist/a.js","sri":"sha512-abc"}]}"#);
    }
}
