//! I/O for shard transfers: the HTTP client seam and the request
//! orchestration built on it.

mod http;
mod shard;

pub use http::{BoxStream, HttpClient, UploadBody};
pub use shard::ShardClient;

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
