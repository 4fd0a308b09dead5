//! Synchronous body callbacks driven by the HTTP engine.
//!
//! Nothing here performs I/O or blocks: each call checks the cancel flag,
//! moves bytes between the shard buffer and the engine, and hands progress
//! to a non-blocking sink.

mod download;
mod meter;
mod upload;

pub use download::ShardDownloadSink;
pub use upload::{BodyGuard, BodyRequest, Produced, ShardUploadStream};
