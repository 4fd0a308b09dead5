use shardline_verify::{ContentId, Hasher, ShardHasher};

use crate::core::meter::ProgressMeter;
use crate::data::{CancelFlag, ProgressSink};
use crate::error::{Error, IntegrityError, Result};

/// Push-based body consumer writing a shard into a caller-owned buffer.
///
/// Every accepted chunk is hashed on the way in, so [`finish`](Self::finish)
/// only has to finalize the digest.
#[derive(Debug)]
pub struct ShardDownloadSink<'a> {
    buffer:  &'a mut [u8],
    written: usize,
    hasher:  ShardHasher,
    cancel:  CancelFlag,
    meter:   ProgressMeter,
}

impl<'a> ShardDownloadSink<'a> {
    /// The declared shard size is the length of `buffer`.
    pub fn new(
        buffer: &'a mut [u8],
        cancel: CancelFlag,
        progress: Option<ProgressSink>,
        interval: u64,
    ) -> Self {
        let total = buffer.len() as u64;
        Self {
            buffer,
            written: 0,
            hasher: ShardHasher::new(),
            cancel,
            meter: ProgressMeter::new(progress, interval, total),
        }
    }

    pub fn declared(&self) -> u64 { self.buffer.len() as u64 }

    pub fn written(&self) -> u64 { self.written as u64 }

    /// Accept one chunk of the response body.
    ///
    /// Cancellation is checked first so a canceled transfer never reports an
    /// integrity failure.
    pub fn consume(&mut self, chunk: &[u8]) -> Result<usize> {
        if self.cancel.is_canceled() {
            self.meter.flush(self.written as u64);
            return Err(Error::Canceled);
        }

        let end = self.written + chunk.len();
        if end > self.buffer.len() {
            return Err(IntegrityError::Overflow {
                declared: self.declared(),
                received: end as u64,
            }
            .into());
        }

        self.hasher.update(chunk);
        self.buffer[self.written..end].copy_from_slice(chunk);
        self.written = end;
        self.meter.advance(self.written as u64, chunk.len() as u64);

        Ok(chunk.len())
    }

    /// Check length and content once the response has ended.
    pub fn finish(mut self, expected: &ContentId) -> Result<u64> {
        if self.cancel.is_canceled() {
            self.meter.flush(self.written as u64);
            return Err(Error::Canceled);
        }

        if self.written != self.buffer.len() {
            return Err(IntegrityError::ShortContent {
                declared: self.declared(),
                received: self.written as u64,
            }
            .into());
        }

        let actual = self.hasher.finalize_id();
        if &actual != expected {
            return Err(IntegrityError::HashMismatch {
                expected: expected.to_string(),
                actual:   actual.to_string(),
            }
            .into());
        }

        self.meter.flush(self.written as u64);
        Ok(self.written as u64)
    }
}
