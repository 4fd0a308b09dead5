use digest::Digest;

use crate::id::ContentId;

pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;
}

pub struct Sha256Hasher(sha2::Sha256);

impl Hasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

impl Default for Sha256Hasher {
    fn default() -> Self { Self::new() }
}

impl Sha256Hasher {
    pub fn new() -> Self { Self(sha2::Sha256::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { sha2::Sha256::digest(data).to_vec() }
}

pub struct Ripemd160Hasher(ripemd::Ripemd160);

impl Hasher for Ripemd160Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

impl Default for Ripemd160Hasher {
    fn default() -> Self { Self::new() }
}

impl Ripemd160Hasher {
    pub fn new() -> Self { Self(ripemd::Ripemd160::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { ripemd::Ripemd160::digest(data).to_vec() }
}

/// Incremental shard identifier: RIPEMD-160 over the SHA-256 of the content.
///
/// Only the SHA-256 state sees the streamed bytes; the RIPEMD-160 stage
/// runs once over the 32-byte digest at finalization.
#[derive(Debug, Clone, Default)]
pub struct ShardHasher {
    inner: sha2::Sha256,
}

impl ShardHasher {
    pub fn new() -> Self { Self::default() }

    /// Consume the state and render the identifier.
    pub fn finalize_id(self) -> ContentId {
        ContentId::from_digest(&Hasher::finalize(self))
    }
}

impl Hasher for ShardHasher {
    fn update(&mut self, data: &[u8]) { self.inner.update(data); }

    fn finalize(self) -> Vec<u8> {
        let sha = self.inner.finalize();
        ripemd::Ripemd160::digest(sha).to_vec()
    }
}
