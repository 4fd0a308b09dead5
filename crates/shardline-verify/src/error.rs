use std::io;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("content mismatch: expected {expected}, got {actual}")]
    Mismatch {
        expected: String,
        actual:   String,
    },

    #[error("invalid content identifier: {0:?}")]
    InvalidId(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, VerifyError>;
