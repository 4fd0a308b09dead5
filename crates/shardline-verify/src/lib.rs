//! Content identifiers and streaming verification for storage shards.
//!
//! A shard is named by the RIPEMD-160 digest of the SHA-256 digest of its
//! bytes, rendered as 40 lowercase hex characters. The same computation is
//! available one-shot ([`ContentId::compute`]) and incrementally
//! ([`ShardHasher`]), so downloads can be verified while bytes stream in.
//!
//! # Example
//!
//! ```
//! use shardline_verify::{ContentId, Hasher, ShardHasher};
//!
//! let expected = ContentId::compute(b"hello world");
//!
//! let mut hasher = ShardHasher::new();
//! hasher.update(b"hello ");
//! hasher.update(b"world");
//!
//! assert_eq!(hasher.finalize_id(), expected);
//! ```

pub use self::error::{Result, VerifyError};
pub use self::hasher::{Hasher, Ripemd160Hasher, Sha256Hasher, ShardHasher};
pub use self::id::{CONTENT_ID_LEN, ContentId};
pub use self::reader::VerifiedReader;

mod error;
mod hasher;
mod id;
mod reader;

/// Lowercase hex SHA-256 of a bridge password, as sent in basic-auth credentials.
pub fn hash_password(password: &str) -> String { hex::encode(Sha256Hasher::digest(password.as_bytes())) }
