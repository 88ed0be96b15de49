//! Compression of stored documents.
//!
//! Aggregated metadata is stored gzipped to stay well under the per-value
//! ceiling of the key-value store. [`Compression`] names the format used
//! for a namespace and converts whole documents in memory; documents are
//! small enough that streaming buys nothing.

mod codec;
pub mod error;

use crate::error::{Error, ErrorKind};
use derive_more::Display;
use std::str::FromStr;

/// Leading bytes of every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Format of a stored document. Defaults to [`Gzip`](Self::Gzip).
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Stored as-is.
    #[display("none")]
    None,
    /// Gzip at the highest level.
    #[default]
    #[display("gzip")]
    Gzip,
}
impl Compression {
    /// Whether `stored` looks like it was written in this format.
    ///
    /// Gzip is recognised by its magic bytes; anything that is not gzip is
    /// taken to be uncompressed.
    ///
    /// ```
    /// use pkgkv_compress::Compression;
    ///
    /// assert!(Compression::Gzip.matches(&[0x1F, 0x8B, 0x08]));
    /// assert!(Compression::None.matches(br#"{"name":"foo"}"#));
    /// assert!(!Compression::Gzip.matches(br#"{"name":"foo"}"#));
    /// ```
    #[must_use]
    pub fn matches(&self, stored: &[u8]) -> bool {
        let gzip = stored.starts_with(&GZIP_MAGIC);
        match self {
            Compression::None => !gzip,
            Compression::Gzip => gzip,
        }
    }
}
impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "identity" => Ok(Compression::None),
            "gzip" | "gz" => Ok(Compression::Gzip),
            _ => exn::bail!(ErrorKind::Unsupported(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_is_gzip() {
        assert_eq!(Compression::default(), Compression::Gzip);
    }

    #[rstest]
    #[case("none", Compression::None)]
    #[case("identity", Compression::None)]
    #[case("gzip", Compression::Gzip)]
    #[case(" GZ ", Compression::Gzip)]
    fn test_parse(#[case] input: &str, #[case] expected: Compression) {
        assert_eq!(input.parse::<Compression>().unwrap(), expected);
    }

    #[rstest]
    #[case("zstd")]
    #[case("")]
    fn test_parse_unsupported(#[case] input: &str) {
        let err = input.parse::<Compression>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Unsupported(name) if name == input));
    }

    #[test]
    fn test_display_parses_back() {
        for format in [Compression::None, Compression::Gzip] {
            assert_eq!(format.to_string().parse::<Compression>().unwrap(), format);
        }
    }
}
