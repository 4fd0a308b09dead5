//! Error types for shardline-transfer.

use thiserror::Error;

/// Why a shard's bytes could not be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("received more bytes than declared ({received} > {declared})")]
    Overflow { declared: u64, received: u64 },

    #[error("short content: received {received} of {declared} bytes")]
    ShortContent { declared: u64, received: u64 },

    #[error("hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },

    #[error("buffer holds {buffer} bytes but shard declares {declared}")]
    BufferSize { declared: u64, buffer: u64 },
}

#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP exchange did not complete.
    #[error("request error: {0}")]
    Request(String),

    #[error("integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("transfer canceled")]
    Canceled,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn is_integrity(&self) -> bool { matches!(self, Error::Integrity(_)) }

    pub fn is_canceled(&self) -> bool { matches!(self, Error::Canceled) }

    pub fn is_request(&self) -> bool { matches!(self, Error::Request(_)) }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self { Error::Config(e.to_string()) }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self { Error::Config(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, Error>;
