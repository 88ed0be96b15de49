//! Compression errors.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Stored bytes are not a valid document in the expected format.
    #[display("stored document is corrupt or in another format")]
    Corrupt,
    /// Unknown format name in configuration.
    #[display("unsupported compression: {_0:?}")]
    Unsupported(#[error(not(source))] String),
    /// The encoder failed while writing to memory.
    #[display("failed to encode document")]
    Encode,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed. Stored data and
    /// configuration do not change between attempts.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Encode)
    }
}
