//! Key validation and construction.
//!
//! Keys are plain strings, but most of them are built from untrusted file
//! listings (`<package>/<version>/<file path>`), so file paths are normalised
//! component-wise before being joined into a key.

use std::path::{Component, Path};

use crate::error::{ErrorKind, Result};

/// Longest key (in bytes) the store accepts.
pub const MAX_KEY_BYTES: usize = 512;

/// Validates a complete key.
///
/// Rejects empty keys, keys longer than [`MAX_KEY_BYTES`], keys containing
/// null bytes and the reserved keys `.` and `..`. The root key `/` is valid.
///
/// # Examples
///
/// ```
/// use pkgkv_store::validate_key;
/// assert!(validate_key("/").is_ok());
/// assert!(validate_key("jquery/3.5.1/jquery.min.js").is_ok());
/// assert!(validate_key("").is_err());
/// assert!(validate_key("..").is_err());
/// ```
pub fn validate(key: &str) -> Result<&str> {
    if key.is_empty() || key.len() > MAX_KEY_BYTES || key.contains('\0') || key == "." || key == ".." {
        exn::bail!(ErrorKind::InvalidKey(key.to_string()));
    }
    Ok(key)
}

/// Normalises a relative file path into the `/`-separated form used in keys.
///
/// Ensures that paths don't escape their version directory (no `..`
/// traversal past the start), strips `.` components and duplicate or
/// trailing separators.
///
/// # Examples
///
/// ```
/// use pkgkv_store::normalize_path;
/// assert_eq!(normalize_path("dist/./js//app.min.js").unwrap(), "dist/js/app.min.js");
/// assert_eq!(normalize_path("dist/../app.js").unwrap(), "app.js");
/// assert!(normalize_path("../escape.js").is_err());
/// assert!(normalize_path("a\0b").is_err());
/// ```
pub fn normalize_path(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let invalid = || ErrorKind::InvalidKey(path.to_string_lossy().into_owned());
    let mut components: Vec<&str> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix.
                let Some(s) = s.to_str().filter(|s| !s.contains('\0')) else {
                    exn::bail!(invalid());
                };
                components.push(s);
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(invalid()),
        false => Ok(components.join("/")),
    }
}

/// Joins key segments with `/` and validates the result.
///
/// ```
/// use pkgkv_store::join_key;
/// assert_eq!(join_key(["jquery", "3.5.1"]).unwrap(), "jquery/3.5.1");
/// assert!(join_key(["jquery", ""]).is_err());
/// ```
pub fn join<'a>(segments: impl IntoIterator<Item = &'a str>) -> Result<String> {
    let mut key = String::new();
    for segment in segments {
        if segment.is_empty() {
            exn::bail!(ErrorKind::InvalidKey(key));
        }
        if !key.is_empty() {
            key.push('/');
        }
        key.push_str(segment);
    }
    validate(&key)?;
    Ok(key)
}
