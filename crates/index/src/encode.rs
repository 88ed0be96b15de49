//! Transport encoding of bulk values.
//!
//! Bulk requests carry values as JSON strings, so arbitrary bytes are sent
//! as standard (padded) base64 and decoded by the store on arrival.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// A value encoded for a bulk request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded(String);
impl Encoded {
    /// Encode raw bytes. Never fails.
    ///
    /// ```
    /// use pkgkv_index::encode::Encoded;
    ///
    /// let encoded = Encoded::encode(b"hello");
    /// assert_eq!(encoded.as_str(), "aGVsbG8=");
    /// assert_eq!(encoded.len(), 8);
    /// ```
    pub fn encode(bytes: &[u8]) -> Self {
        Self(STANDARD.encode(bytes))
    }

    /// Size of the encoded value in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Size of `len` raw bytes once encoded, without encoding them.
#[inline]
#[must_use]
pub const fn encoded_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}
