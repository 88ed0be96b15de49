use crate::Compression;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::io::{Read, Write};
use tracing::instrument;

impl Compression {
    /// Compress a whole document.
    ///
    /// ```
    /// use pkgkv_compress::Compression;
    ///
    /// let stored = Compression::Gzip.compress(br#"{"name":"foo","assets":[]}"#).unwrap();
    /// assert!(Compression::Gzip.matches(&stored));
    /// ```
    #[instrument(skip(document), fields(format = %self, size = document.len()))]
    pub fn compress(&self, document: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(document.to_vec()),
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::with_capacity(document.len() / 4), flate2::Compression::best());
                encoder.write_all(document).or_raise(|| ErrorKind::Encode)?;
                let stored = encoder.finish().or_raise(|| ErrorKind::Encode)?;
                tracing::trace!(stored = stored.len(), "Compressed document");
                Ok(stored)
            },
        }
    }

    /// Decompress a whole stored document.
    ///
    /// Input that does not carry this format's signature is rejected as
    /// [`Corrupt`](ErrorKind::Corrupt) without being decoded, as is a
    /// truncated or damaged gzip stream.
    #[instrument(skip(stored), fields(format = %self, size = stored.len()))]
    pub fn decompress(&self, stored: &[u8]) -> Result<Vec<u8>> {
        if !self.matches(stored) {
            exn::bail!(ErrorKind::Corrupt);
        }
        match self {
            Compression::None => Ok(stored.to_vec()),
            Compression::Gzip => {
                let mut document = Vec::with_capacity(stored.len() * 4);
                GzDecoder::new(stored).read_to_end(&mut document).or_raise(|| ErrorKind::Corrupt)?;
                Ok(document)
            },
        }
    }
}
