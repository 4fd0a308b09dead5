//! Immutable data types for shard transfers: request descriptors,
//! configuration and progress reporting.

pub mod auth;
pub mod options;
pub mod progress;
pub mod shard;

pub use auth::BridgeAuth;
pub use options::{DEFAULT_CHUNK_SIZE, DEFAULT_PROGRESS_INTERVAL, HttpOptions, ProxyConfig, ProxyVersion};
pub use progress::{ProgressEvent, ProgressSink, ProgressWatcher};
pub use shard::{CancelFlag, FarmerEndpoint, NODE_ID_HEADER, ShardTransfer};
