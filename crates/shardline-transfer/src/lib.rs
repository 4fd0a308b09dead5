//! Streaming shard upload and download with progress, cancellation and
//! content verification.
//!
//! # Architecture
//!
//! - [`data`] - Descriptors, configuration and progress channel types
//! - [`core`] - Synchronous body callbacks the HTTP engine drives
//! - [`effects`] - The HTTP client seam and request orchestration
//!
//! Uploads pull bytes from a [`ShardUploadStream`] in bounded chunks.
//! Downloads push bytes through a [`ShardDownloadSink`] that hashes them on
//! the way into the caller's buffer, then checks the final length and
//! [`ContentId`] before reporting success. Retry policy and peer selection
//! belong to the caller.
//!
//! # Example
//!
//! ```no_run
//! use shardline_transfer::{CancelFlag, FarmerEndpoint, HttpOptions, ProgressSink, ShardClient, ShardTransfer};
//!
//! # async fn run() -> shardline_transfer::Result<()> {
//! let client = ShardClient::from_options(HttpOptions::default())?;
//! let farmer = FarmerEndpoint::new("http", "farmer.example", 4000, "node-id");
//! let data = bytes::Bytes::from_static(b"shard bytes");
//! let transfer = ShardTransfer::for_data(&data, "token");
//!
//! let (progress, _watcher) = ProgressSink::channel();
//! let cancel = CancelFlag::new();
//! client.put_shard(&farmer, &transfer, data.clone(), Some(progress), &cancel).await?;
//!
//! let mut buffer = vec![0u8; transfer.size as usize];
//! client.fetch_shard(&farmer, &transfer, &mut buffer, None, &cancel).await?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use self::core::{BodyGuard, BodyRequest, Produced, ShardDownloadSink, ShardUploadStream};
pub use self::data::{
    BridgeAuth, CancelFlag, FarmerEndpoint, HttpOptions, ProgressEvent, ProgressSink, ProgressWatcher,
    ProxyConfig, ProxyVersion, ShardTransfer,
};
pub use self::effects::{BoxStream, HttpClient, ShardClient, UploadBody};
pub use self::error::{Error, IntegrityError, Result};
pub use shardline_verify::ContentId;

#[cfg(feature = "reqwest")]
pub use self::effects::ReqwestClient;
