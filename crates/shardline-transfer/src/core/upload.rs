use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use futures_util::stream;

use crate::core::meter::ProgressMeter;
use crate::data::{CancelFlag, ProgressSink};
use crate::effects::UploadBody;

/// What the HTTP engine asks of a body producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRequest {
    /// Restart the body from its first byte.
    Rewind,
    /// Fill up to this many bytes of the scratch buffer.
    ReadChunk(usize),
}

/// Result of one [`ShardUploadStream::produce`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Produced {
    /// This many bytes were written to the front of the scratch buffer.
    Wrote(usize),
    /// The cursor is back at the start of the shard.
    Rewound,
    /// Every byte has been offered.
    EndOfBody,
    /// The cancel flag was observed; no further bytes will be produced.
    Canceled,
}

/// Pull-based body producer reading a shard held by the caller.
///
/// `position + remaining == data.len()` holds between calls.
#[derive(Debug)]
pub struct ShardUploadStream {
    data:      Bytes,
    position:  usize,
    remaining: usize,
    cancel:    CancelFlag,
    meter:     ProgressMeter,
}

impl ShardUploadStream {
    pub fn new(data: Bytes, cancel: CancelFlag, progress: Option<ProgressSink>, interval: u64) -> Self {
        let total = data.len();
        Self {
            data,
            position: 0,
            remaining: total,
            cancel,
            meter: ProgressMeter::new(progress, interval, total as u64),
        }
    }

    pub fn position(&self) -> usize { self.position }

    pub fn remaining(&self) -> usize { self.remaining }

    pub fn produce(&mut self, request: BodyRequest, scratch: &mut [u8]) -> Produced {
        if self.cancel.is_canceled() {
            self.remaining = 0;
            self.meter.flush(self.position as u64);
            return Produced::Canceled;
        }

        let requested = match request {
            BodyRequest::Rewind => {
                self.position = 0;
                self.remaining = self.data.len();
                return Produced::Rewound;
            }
            BodyRequest::ReadChunk(size) => size.min(scratch.len()),
        };

        if self.remaining == 0 {
            self.meter.flush(self.position as u64);
            return Produced::EndOfBody;
        }

        let n = requested.min(self.remaining);
        scratch[..n].copy_from_slice(&self.data[self.position..self.position + n]);
        self.position += n;
        self.remaining -= n;
        self.meter.advance(self.position as u64, n as u64);

        Produced::Wrote(n)
    }

    /// Adapt the producer into the byte stream an HTTP engine consumes.
    ///
    /// The body restarts from the first byte. A canceled producer ends the
    /// stream with an [`io::ErrorKind::Interrupted`] error, which aborts the
    /// request rather than letting it pass as a short body.
    ///
    /// The producer lives only as long as the returned [`BodyGuard`]. Once the
    /// guard is dropped the producer and its progress sink are released, and
    /// the next poll of the body fails with [`io::ErrorKind::BrokenPipe`].
    pub fn into_body(mut self, chunk_size: usize) -> (UploadBody, BodyGuard) {
        let chunk_size = chunk_size.max(1);
        self.produce(BodyRequest::Rewind, &mut []);

        let slot = Arc::new(Mutex::new(Some(self)));
        let guard = BodyGuard {
            slot: Arc::clone(&slot),
        };

        let scratch = vec![0u8; chunk_size];
        let body = stream::unfold(Some((slot, scratch)), move |state| async move {
            let Some((slot, mut scratch)) = state else {
                return None;
            };
            let produced = match lock(&slot).as_mut() {
                Some(upload) => upload.produce(BodyRequest::ReadChunk(chunk_size), &mut scratch),
                None => {
                    return Some((Err(io::Error::new(io::ErrorKind::BrokenPipe, "shard upload released")), None));
                }
            };
            match produced {
                Produced::Wrote(n) => {
                    let chunk = Bytes::copy_from_slice(&scratch[..n]);
                    Some((Ok(chunk), Some((slot, scratch))))
                }
                Produced::Rewound | Produced::EndOfBody => None,
                Produced::Canceled => Some((
                    Err(io::Error::new(io::ErrorKind::Interrupted, "transfer canceled")),
                    None,
                )),
            }
        });

        (Box::pin(body), guard)
    }
}

/// Owner of an upload body's producer.
///
/// Dropping it releases the producer even while the HTTP engine still holds
/// the body.
#[derive(Debug)]
#[must_use = "dropping the guard releases the upload body"]
pub struct BodyGuard {
    slot: Arc<Mutex<Option<ShardUploadStream>>>,
}

impl Drop for BodyGuard {
    fn drop(&mut self) {
        let released = lock(&self.slot).take();
        drop(released);
    }
}

fn lock(slot: &Mutex<Option<ShardUploadStream>>) -> MutexGuard<'_, Option<ShardUploadStream>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
