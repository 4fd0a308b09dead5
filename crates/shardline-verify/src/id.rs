use std::fmt;
use std::io::Read;
use std::str::FromStr;

use crate::hasher::ShardHasher;
use crate::reader::VerifiedReader;
use crate::{Result, VerifyError};

/// Length of a rendered identifier: 20 RIPEMD-160 bytes, two hex chars each.
pub const CONTENT_ID_LEN: usize = 40;

const READ_CHUNK: usize = 64 * 1024;

/// Lowercase hex identifier naming a shard by its content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId(String);

impl ContentId {
    /// Identifier of `data` computed in one shot.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = ShardHasher::new();
        crate::Hasher::update(&mut hasher, data);
        hasher.finalize_id()
    }

    /// Identifier of everything `reader` yields, hashed in bounded chunks.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut verified = VerifiedReader::new(reader, ShardHasher::new());
        let mut buf = vec![0u8; READ_CHUNK];
        while verified.read(&mut buf)? > 0 {}
        Ok(verified.into_hasher().finalize_id())
    }

    pub(crate) fn from_digest(digest: &[u8]) -> Self { Self(hex::encode(digest)) }

    pub fn as_str(&self) -> &str { &self.0 }

    /// Raw digest bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        // Construction guarantees valid hex.
        hex::decode(&self.0).unwrap_or_default()
    }
}

impl FromStr for ContentId {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != CONTENT_ID_LEN || !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(VerifyError::InvalidId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str { &self.0 }
}
