use bytes::Bytes;
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::core::{ShardDownloadSink, ShardUploadStream};
use crate::data::{CancelFlag, FarmerEndpoint, HttpOptions, ProgressSink, ShardTransfer};
use crate::effects::http::{HttpClient, describe};
use crate::error::{Error, IntegrityError, Result};

/// Moves shards between this client and farmers.
///
/// Each call is one HTTP exchange: no retries, no peer selection. The caller
/// owns the shard buffer, the cancel flag and the progress watcher.
pub struct ShardClient<C: HttpClient> {
    client:  C,
    options: HttpOptions,
}

impl<C: HttpClient> ShardClient<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            options: HttpOptions::default(),
        }
    }

    /// Use `options` for the progress interval and upload chunk size.
    pub fn with_options(mut self, options: HttpOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &HttpOptions { &self.options }

    /// The underlying HTTP client.
    pub fn http(&self) -> &C { &self.client }

    /// Upload `data` as the shard described by `transfer`.
    ///
    /// Returns the farmer's status code without judging it.
    pub async fn put_shard(
        &self,
        endpoint: &FarmerEndpoint,
        transfer: &ShardTransfer,
        data: Bytes,
        progress: Option<ProgressSink>,
        cancel: &CancelFlag,
    ) -> Result<u16> {
        check_size(transfer, data.len())?;
        if cancel.is_canceled() {
            return Err(Error::Canceled);
        }

        let url = transfer.url(endpoint)?;
        let mut headers = endpoint.headers();
        headers.push(("Content-Type".to_string(), "application/octet-stream".to_string()));
        headers.push(("Content-Length".to_string(), transfer.size.to_string()));

        // Held until return: the engine may keep the body after answering.
        let (body, _release) = ShardUploadStream::new(data, cancel.clone(), progress, self.options.progress_interval)
            .into_body(self.options.chunk_size);

        debug!(shard = %transfer.hash, host = %endpoint.host, port = endpoint.port, size = transfer.size, "uploading shard");
        let result = self.client.put(url.as_str(), &headers, body).await;

        if cancel.is_canceled() {
            debug!(shard = %transfer.hash, "shard upload canceled");
            return Err(Error::Canceled);
        }

        let status = result.map_err(|e| {
            warn!(shard = %transfer.hash, error = %describe(&e), "shard upload request failed");
            Error::Request(describe(&e))
        })?;

        debug!(shard = %transfer.hash, status, "shard upload finished");
        Ok(status)
    }

    /// Download the shard described by `transfer` into `buffer`.
    ///
    /// `buffer` must be exactly `transfer.size` bytes. Its contents are only
    /// meaningful when this returns `Ok`.
    pub async fn fetch_shard(
        &self,
        endpoint: &FarmerEndpoint,
        transfer: &ShardTransfer,
        buffer: &mut [u8],
        progress: Option<ProgressSink>,
        cancel: &CancelFlag,
    ) -> Result<u16> {
        check_size(transfer, buffer.len())?;
        if cancel.is_canceled() {
            return Err(Error::Canceled);
        }

        let url = transfer.url(endpoint)?;
        let headers = endpoint.headers();

        debug!(shard = %transfer.hash, host = %endpoint.host, port = endpoint.port, size = transfer.size, "fetching shard");
        let (status, mut body) = self
            .client
            .get(url.as_str(), &headers)
            .await
            .map_err(|e| request_error(cancel, &e))?;

        if !(200..300).contains(&status) {
            warn!(shard = %transfer.hash, status, "farmer refused shard download");
            return Err(Error::Request(format!("farmer responded with status {status}")));
        }

        let mut sink = ShardDownloadSink::new(buffer, cancel.clone(), progress, self.options.progress_interval);
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| request_error(cancel, &e))?;
            sink.consume(&chunk)?;
        }

        let received = sink.finish(&transfer.hash).inspect_err(|e| {
            if e.is_integrity() {
                warn!(shard = %transfer.hash, error = %e, "downloaded shard failed verification");
            }
        })?;

        debug!(shard = %transfer.hash, status, bytes = received, "shard download verified");
        Ok(status)
    }
}

#[cfg(feature = "reqwest")]
impl ShardClient<crate::effects::ReqwestClient> {
    /// Production client configured entirely from `options`.
    pub fn from_options(options: HttpOptions) -> Result<Self> {
        let client = crate::effects::ReqwestClient::new(&options)?;
        Ok(Self::new(client).with_options(options))
    }
}

fn check_size(transfer: &ShardTransfer, buffer: usize) -> Result<()> {
    if buffer as u64 != transfer.size {
        return Err(IntegrityError::BufferSize {
            declared: transfer.size,
            buffer:   buffer as u64,
        }
        .into());
    }
    Ok(())
}

fn request_error(cancel: &CancelFlag, err: &(dyn std::error::Error + 'static)) -> Error {
    if cancel.is_canceled() {
        Error::Canceled
    } else {
        Error::Request(describe(err))
    }
}
