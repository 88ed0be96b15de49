//! Decoding of "new version published" notifications.
//!
//! Notifications arrive as a flat string map of object metadata. Everything
//! is validated here, once, so the rest of the crate only ever sees a
//! well-formed [`VersionEvent`].

use crate::error::{ErrorKind, Result};
use crate::models::Package;
use crate::records::segment;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use exn::{OptionExt, ResultExt};
use serde_json::{Map, Value};

/// A validated notification.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionEvent {
    pub package: String,
    pub version: String,
    /// The package descriptor; its name always equals `package`.
    pub config: Package,
}
impl VersionEvent {
    /// Decode `package`, `version` and `config` from event metadata.
    ///
    /// `config` may be the descriptor object itself, or a string holding its
    /// JSON either verbatim or base64 encoded.
    ///
    /// ```
    /// use pkgkv_index::VersionEvent;
    /// use serde_json::json;
    ///
    /// let metadata = json!({"package": "foo", "version": "1.0.0", "config": r#"{"name":"foo"}"#});
    /// let event = VersionEvent::from_metadata(metadata.as_object().unwrap()).unwrap();
    /// assert_eq!(event.config.name, "foo");
    /// ```
    pub fn from_metadata(metadata: &Map<String, Value>) -> Result<Self> {
        let package = string_field(metadata, "package")?;
        let version = string_field(metadata, "version")?;
        let config = match metadata.get("config").ok_or_raise(|| ErrorKind::MissingField("config"))? {
            Value::Object(object) => {
                serde_json::from_value(Value::Object(object.clone())).or_raise(|| ErrorKind::InvalidField("config"))?
            },
            Value::String(encoded) => decode_descriptor(encoded)?,
            _ => exn::bail!(ErrorKind::InvalidField("config")),
        };
        if config.name != package {
            tracing::warn!(package, descriptor = %config.name, "Descriptor name does not match event package");
            exn::bail!(ErrorKind::InvalidField("config"));
        }
        Ok(Self { package, version, config })
    }
}

fn string_field(metadata: &Map<String, Value>, name: &'static str) -> Result<String> {
    let value = metadata.get(name).ok_or_raise(|| ErrorKind::MissingField(name))?;
    let value = value.as_str().ok_or_raise(|| ErrorKind::InvalidField(name))?;
    segment(value).or_raise(|| ErrorKind::InvalidField(name))?;
    Ok(value.to_string())
}

fn decode_descriptor(encoded: &str) -> Result<Package> {
    if let Ok(package) = serde_json::from_str(encoded) {
        return Ok(package);
    }
    let bytes = STANDARD.decode(encoded.trim()).or_raise(|| ErrorKind::InvalidField("config"))?;
    serde_json::from_slice(&bytes).or_raise(|| ErrorKind::InvalidField("config"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn metadata(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("metadata must be an object"),
        }
    }

    #[test]
    fn test_object_config() {
        let event = VersionEvent::from_metadata(&metadata(json!({
            "package": "foo",
            "version": "1.0.0",
            "config": {"name": "foo", "license": "MIT"},
        })))
        .unwrap();
        assert_eq!(event.package, "foo");
        assert_eq!(event.version, "1.0.0");
        assert_eq!(event.config.extra["license"], "MIT");
    }

    #[test]
    fn test_base64_config() {
        let encoded = STANDARD.encode(br#"{"name":"foo","homepage":"https://example.com"}"#);
        let event =
            VersionEvent::from_metadata(&metadata(json!({"package": "foo", "version": "2.0.0", "config": encoded})))
                .unwrap();
        assert_eq!(event.config.extra["homepage"], "https://example.com");
    }

    #[rstest]
    #[case(json!({"version": "1.0.0", "config": {"name": "foo"}}), ErrorKind::MissingField("package"))]
    #[case(json!({"package": "foo", "config": {"name": "foo"}}), ErrorKind::MissingField("version"))]
    #[case(json!({"package": "foo", "version": "1.0.0"}), ErrorKind::MissingField("config"))]
    #[case(json!({"package": 1, "version": "1.0.0", "config": {"name": "foo"}}), ErrorKind::InvalidField("package"))]
    #[case(json!({"package": "foo", "version": "a/b", "config": {"name": "foo"}}), ErrorKind::InvalidField("version"))]
    #[case(json!({"package": "foo", "version": "1.0.0", "config": ["foo"]}), ErrorKind::InvalidField("config"))]
    #[case(json!({"package": "foo", "version": "1.0.0", "config": "%%%"}), ErrorKind::InvalidField("config"))]
    #[case(json!({"package": "foo", "version": "1.0.0", "config": {"license": "MIT"}}), ErrorKind::InvalidField("config"))]
    #[case(json!({"package": "foo", "version": "1.0.0", "config": {"name": "bar"}}), ErrorKind::InvalidField("config"))]
    fn test_rejected(#[case] value: Value, #[case] expected: ErrorKind) {
        let err = VersionEvent::from_metadata(&metadata(value)).unwrap_err();
        assert_eq!((*err).to_string(), expected.to_string());
    }
}
