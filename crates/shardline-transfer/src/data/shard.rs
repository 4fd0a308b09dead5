use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use shardline_verify::ContentId;
use url::Url;

use crate::error::Result;

/// Header carrying the farmer's node identity on shard requests.
pub const NODE_ID_HEADER: &str = "x-storj-node-id";

/// Cooperative cancellation signal shared between a caller and one transfer.
///
/// Polled once per body callback; setting it never interrupts a callback
/// already in progress.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self { Self::default() }

    pub fn cancel(&self) { self.0.store(true, Ordering::Release); }

    pub fn is_canceled(&self) -> bool { self.0.load(Ordering::Acquire) }
}

/// The farmer serving or accepting a shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FarmerEndpoint {
    pub proto:   String,
    pub host:    String,
    pub port:    u16,
    pub node_id: String,
}

impl FarmerEndpoint {
    pub fn new(
        proto: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        node_id: impl Into<String>,
    ) -> Self {
        Self {
            proto: proto.into(),
            host: host.into(),
            port,
            node_id: node_id.into(),
        }
    }

    pub(crate) fn headers(&self) -> Vec<(String, String)> {
        vec![(NODE_ID_HEADER.to_string(), self.node_id.clone())]
    }
}

/// Describes one shard transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardTransfer {
    pub hash:  ContentId,
    pub size:  u64,
    pub token: String,
}

impl ShardTransfer {
    pub fn new(hash: ContentId, size: u64, token: impl Into<String>) -> Self {
        Self {
            hash,
            size,
            token: token.into(),
        }
    }

    /// Describe an upload of `data`, computing its identifier.
    pub fn for_data(data: &[u8], token: impl Into<String>) -> Self {
        Self::new(ContentId::compute(data), data.len() as u64, token)
    }

    /// `{proto}://{host}:{port}/shards/{hash}?token={token}`
    pub fn url(&self, endpoint: &FarmerEndpoint) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}://{}:{}/shards/{}",
            endpoint.proto, endpoint.host, endpoint.port, self.hash
        ))?;
        url.query_pairs_mut().append_pair("token", &self.token);
        Ok(url)
    }
}
