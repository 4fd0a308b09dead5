//! End-to-end shard transfers against an in-memory farmer.

use std::collections::HashMap;
use std::io;
use std::sync::Mutex;

use bytes::Bytes;
use futures_util::{FutureExt, StreamExt};
use shardline_transfer::{
    BoxStream, CancelFlag, ContentId, Error, FarmerEndpoint, HttpClient, HttpOptions, IntegrityError,
    ProgressSink, ProgressWatcher, ShardClient, ShardTransfer, UploadBody,
};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct FarmerError(String);

/// How the farmer corrupts a stored shard when serving it.
#[derive(Debug, Clone, Copy)]
enum Tamper {
    None,
    Truncate(usize),
    Extra(usize),
    FlipByte(usize),
}

/// Farmer keeping uploaded shards in memory and serving them in fixed chunks.
struct MockFarmer {
    shards:       Mutex<HashMap<String, Vec<u8>>>,
    headers:      Mutex<Vec<Vec<(String, String)>>>,
    chunk_size:   usize,
    tamper:       Tamper,
    status:       u16,
    cancel_after: Option<(usize, CancelFlag)>,
    answer_after: Option<usize>,
    held_bodies:  Mutex<Vec<UploadBody>>,
}

impl MockFarmer {
    fn new() -> Self {
        Self {
            shards:       Mutex::new(HashMap::new()),
            headers:      Mutex::new(Vec::new()),
            chunk_size:   8192,
            tamper:       Tamper::None,
            status:       200,
            cancel_after: None,
            answer_after: None,
            held_bodies:  Mutex::new(Vec::new()),
        }
    }

    fn tamper(mut self, tamper: Tamper) -> Self {
        self.tamper = tamper;
        self
    }

    fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Raise `cancel` once `chunks` body chunks have gone by.
    fn cancel_after(mut self, chunks: usize, cancel: CancelFlag) -> Self {
        self.cancel_after = Some((chunks, cancel));
        self
    }

    /// Answer an upload after `chunks` body chunks, keeping the rest of the
    /// body unread the way a connection does after an early response.
    fn answer_after(mut self, chunks: usize) -> Self {
        self.answer_after = Some(chunks);
        self
    }

    fn store(&self, hash: &str, data: Vec<u8>) { self.shards.lock().unwrap().insert(hash.to_string(), data); }

    fn stored(&self, hash: &str) -> Option<Vec<u8>> { self.shards.lock().unwrap().get(hash).cloned() }

    fn shard_key(url: &str) -> String {
        let path = url.split('?').next().unwrap_or_default();
        path.rsplit('/').next().unwrap_or_default().to_string()
    }

    fn maybe_cancel(&self, seen: usize) {
        if let Some((after, cancel)) = &self.cancel_after
            && seen >= *after
        {
            cancel.cancel();
        }
    }
}

impl HttpClient for MockFarmer {
    type Error = FarmerError;

    async fn put(
        &self,
        url: &str,
        headers: &[(String, String)],
        mut body: UploadBody,
    ) -> Result<u16, Self::Error> {
        self.headers.lock().unwrap().push(headers.to_vec());

        let mut received = Vec::new();
        let mut chunks = 0;
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| FarmerError(format!("body aborted: {e}")))?;
            received.extend_from_slice(&chunk);
            chunks += 1;
            self.maybe_cancel(chunks);
            if self.answer_after.is_some_and(|after| chunks >= after) {
                self.held_bodies.lock().unwrap().push(body);
                return Ok(self.status);
            }
        }

        self.store(&Self::shard_key(url), received);
        Ok(self.status)
    }

    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<(u16, BoxStream<'static, Result<Bytes, Self::Error>>), Self::Error> {
        self.headers.lock().unwrap().push(headers.to_vec());

        let mut data = self.stored(&Self::shard_key(url)).unwrap_or_default();
        match self.tamper {
            Tamper::None => {}
            Tamper::Truncate(len) => data.truncate(len),
            Tamper::Extra(len) => data.extend(std::iter::repeat_n(0xee, len)),
            Tamper::FlipByte(at) => data[at] ^= 0xff,
        }

        let chunks: Vec<Bytes> = data.chunks(self.chunk_size).map(Bytes::copy_from_slice).collect();
        let cancel = self.cancel_after.clone();
        let stream = futures_util::stream::unfold((chunks.into_iter(), 0usize), move |(mut chunks, seen)| {
            let cancel = cancel.clone();
            async move {
                if let Some((after, cancel)) = &cancel
                    && seen >= *after
                {
                    cancel.cancel();
                }
                let Some(chunk) = chunks.next() else {
                    return None;
                };
                Some((Ok::<_, FarmerError>(chunk), (chunks, seen + 1)))
            }
        });

        Ok((self.status, Box::pin(stream)))
    }
}

fn pseudo_random(len: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) as u8
        })
        .collect()
}

/// Collect every value a watcher observes until its sink is dropped.
fn observe(mut watcher: ProgressWatcher) -> tokio::task::JoinHandle<Vec<u64>> {
    tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(event) = watcher.changed().await {
            seen.push(event.bytes_transferred);
        }
        seen
    })
}

/// True once every sink is gone and no value is left unseen.
fn is_closed(watcher: &mut ProgressWatcher) -> bool {
    loop {
        match watcher.changed().now_or_never() {
            Some(Some(_)) => continue,
            Some(None) => return true,
            None => return false,
        }
    }
}

fn assert_progress(seen: &[u64], total: u64) {
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {seen:?}");
    assert_eq!(seen.last().copied(), Some(total));
}

fn farmer() -> FarmerEndpoint { FarmerEndpoint::new("http", "127.0.0.1", 4000, "node-0123") }

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_round_trip_four_megabytes() {
    let data = Bytes::from(pseudo_random(4 * 1024 * 1024, 7));
    let transfer = ShardTransfer::for_data(&data, "tok");
    assert_eq!(transfer.hash, ContentId::compute(&data));

    let client = ShardClient::new(MockFarmer::new());
    let cancel = CancelFlag::new();

    let (up_tx, up_rx) = ProgressSink::channel();
    let observer = observe(up_rx);
    let status = client.put_shard(&farmer(), &transfer, data.clone(), Some(up_tx), &cancel).await.unwrap();
    assert_eq!(status, 200);
    assert_progress(&observer.await.unwrap(), data.len() as u64);

    let (down_tx, down_rx) = ProgressSink::channel();
    let observer = observe(down_rx);

    let mut buffer = vec![0u8; data.len()];
    let status = client
        .fetch_shard(&farmer(), &transfer, &mut buffer, Some(down_tx), &cancel)
        .await
        .unwrap();
    assert_eq!(status, 200);
    assert_eq!(buffer, data);

    assert_progress(&observer.await.unwrap(), data.len() as u64);
}

#[tokio::test]
async fn test_upload_sends_headers_and_bytes() {
    let data = Bytes::from(pseudo_random(50_000, 1));
    let transfer = ShardTransfer::for_data(&data, "tok");
    let client = ShardClient::new(MockFarmer::new()).with_options(HttpOptions::default().chunk_size(1000));

    client.put_shard(&farmer(), &transfer, data.clone(), None, &CancelFlag::new()).await.unwrap();

    let stored = client_farmer(&client).stored(transfer.hash.as_str()).unwrap();
    assert_eq!(stored, data);

    let headers = client_farmer(&client).headers.lock().unwrap()[0].clone();
    assert!(headers.contains(&("x-storj-node-id".to_string(), "node-0123".to_string())));
    assert!(headers.contains(&("Content-Type".to_string(), "application/octet-stream".to_string())));
    assert!(headers.contains(&("Content-Length".to_string(), "50000".to_string())));
}

#[tokio::test]
async fn test_upload_status_is_surfaced() {
    let data = Bytes::from_static(b"shard");
    let transfer = ShardTransfer::for_data(&data, "tok");
    let client = ShardClient::new(MockFarmer::new().status(401));

    let status = client.put_shard(&farmer(), &transfer, data, None, &CancelFlag::new()).await.unwrap();
    assert_eq!(status, 401);
}

#[tokio::test]
async fn test_early_answer_releases_upload_body() {
    let data = Bytes::from(pseudo_random(1024 * 1024, 12));
    let transfer = ShardTransfer::for_data(&data, "tok");
    let client = ShardClient::new(MockFarmer::new().status(413).answer_after(2))
        .with_options(HttpOptions::default().chunk_size(4096));

    let (progress, mut watcher) = ProgressSink::channel();
    let status = client
        .put_shard(&farmer(), &transfer, data, Some(progress), &CancelFlag::new())
        .await
        .unwrap();
    assert_eq!(status, 413);
    assert!(is_closed(&mut watcher), "progress sink outlived the upload call");

    let mut body = client_farmer(&client).held_bodies.lock().unwrap().pop().unwrap();
    let err = body.next().await.unwrap().unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    assert!(body.next().await.is_none());
    assert!(client_farmer(&client).stored(transfer.hash.as_str()).is_none());
}

#[tokio::test]
async fn test_short_content_is_integrity_error() {
    let data = pseudo_random(100, 2);
    let transfer = ShardTransfer::for_data(&data, "tok");
    let farmer_client = MockFarmer::new().tamper(Tamper::Truncate(50));
    farmer_client.store(transfer.hash.as_str(), data.clone());
    let client = ShardClient::new(farmer_client);

    let mut buffer = vec![0u8; 100];
    let err = client
        .fetch_shard(&farmer(), &transfer, &mut buffer, None, &CancelFlag::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Integrity(IntegrityError::ShortContent { declared: 100, received: 50 })
    ));
}

#[tokio::test]
async fn test_wrong_expected_hash_is_integrity_error() {
    let data = pseudo_random(100, 3);
    let wrong = ContentId::compute(b"not the shard");
    let transfer = ShardTransfer::new(wrong.clone(), 100, "tok");
    let farmer_client = MockFarmer::new();
    farmer_client.store(wrong.as_str(), data);
    let client = ShardClient::new(farmer_client);

    let mut buffer = vec![0u8; 100];
    let err = client
        .fetch_shard(&farmer(), &transfer, &mut buffer, None, &CancelFlag::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Integrity(IntegrityError::HashMismatch { .. })));
}

#[tokio::test]
async fn test_corrupted_byte_is_integrity_error() {
    let data = pseudo_random(20_000, 4);
    let transfer = ShardTransfer::for_data(&data, "tok");
    let farmer_client = MockFarmer::new().tamper(Tamper::FlipByte(12_345));
    farmer_client.store(transfer.hash.as_str(), data);
    let client = ShardClient::new(farmer_client);

    let mut buffer = vec![0u8; 20_000];
    let err = client
        .fetch_shard(&farmer(), &transfer, &mut buffer, None, &CancelFlag::new())
        .await
        .unwrap_err();

    assert!(err.is_integrity());
}

#[tokio::test]
async fn test_oversized_response_is_integrity_error() {
    let data = pseudo_random(1000, 5);
    let transfer = ShardTransfer::for_data(&data, "tok");
    let farmer_client = MockFarmer::new().tamper(Tamper::Extra(1));
    farmer_client.store(transfer.hash.as_str(), data);
    let client = ShardClient::new(farmer_client);

    let mut buffer = vec![0u8; 1000];
    let err = client
        .fetch_shard(&farmer(), &transfer, &mut buffer, None, &CancelFlag::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Integrity(IntegrityError::Overflow { declared: 1000, received: 1001 })
    ));
}

#[tokio::test]
async fn test_error_status_fails_before_body() {
    let data = pseudo_random(100, 6);
    let transfer = ShardTransfer::for_data(&data, "tok");
    let farmer_client = MockFarmer::new().status(404);
    farmer_client.store(transfer.hash.as_str(), data);
    let client = ShardClient::new(farmer_client);

    let mut buffer = vec![0u8; 100];
    let err = client
        .fetch_shard(&farmer(), &transfer, &mut buffer, None, &CancelFlag::new())
        .await
        .unwrap_err();

    assert!(err.is_request());
    assert!(buffer.iter().all(|&b| b == 0));
}

#[tokio::test]
async fn test_buffer_size_must_match() {
    let data = pseudo_random(100, 8);
    let transfer = ShardTransfer::for_data(&data, "tok");
    let client = ShardClient::new(MockFarmer::new());

    let mut buffer = vec![0u8; 99];
    let err = client
        .fetch_shard(&farmer(), &transfer, &mut buffer, None, &CancelFlag::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Integrity(IntegrityError::BufferSize { declared: 100, buffer: 99 })
    ));
}

#[tokio::test]
async fn test_download_cancel_mid_transfer() {
    let data = pseudo_random(100_000, 9);
    let transfer = ShardTransfer::for_data(&data, "tok");
    let cancel = CancelFlag::new();
    let farmer_client = MockFarmer::new().cancel_after(3, cancel.clone());
    farmer_client.store(transfer.hash.as_str(), data);
    let client = ShardClient::new(farmer_client);

    let (progress, watcher) = ProgressSink::channel();
    let mut buffer = vec![0u8; 100_000];
    let err = client
        .fetch_shard(&farmer(), &transfer, &mut buffer, Some(progress), &cancel)
        .await
        .unwrap_err();

    // Three 8 KiB chunks were accepted before the flag was seen.
    assert!(err.is_canceled());
    assert_eq!(watcher.latest().bytes_transferred, 3 * 8192);
}

#[tokio::test]
async fn test_download_cancel_after_last_chunk_is_still_canceled() {
    let data = pseudo_random(8192, 10);
    let transfer = ShardTransfer::for_data(&data, "tok");
    let cancel = CancelFlag::new();
    let farmer_client = MockFarmer::new().cancel_after(1, cancel.clone());
    farmer_client.store(transfer.hash.as_str(), data);
    let client = ShardClient::new(farmer_client);

    let mut buffer = vec![0u8; 8192];
    let err = client
        .fetch_shard(&farmer(), &transfer, &mut buffer, None, &cancel)
        .await
        .unwrap_err();

    assert!(err.is_canceled());
}

#[tokio::test]
async fn test_upload_cancel_mid_transfer() {
    let data = Bytes::from(pseudo_random(100_000, 11));
    let transfer = ShardTransfer::for_data(&data, "tok");
    let cancel = CancelFlag::new();
    let client = ShardClient::new(MockFarmer::new().cancel_after(2, cancel.clone()))
        .with_options(HttpOptions::default().chunk_size(4096));

    let (progress, mut watcher) = ProgressSink::channel();
    let err = client.put_shard(&farmer(), &transfer, data, Some(progress), &cancel).await.unwrap_err();

    assert!(err.is_canceled());
    assert_eq!(watcher.latest().bytes_transferred, 2 * 4096);
    assert!(is_closed(&mut watcher));
    assert!(client_farmer(&client).stored(transfer.hash.as_str()).is_none());
}

#[tokio::test]
async fn test_cancel_before_start() {
    let data = Bytes::from_static(b"never sent");
    let transfer = ShardTransfer::for_data(&data, "tok");
    let cancel = CancelFlag::new();
    cancel.cancel();
    let client = ShardClient::new(MockFarmer::new());

    let err = client.put_shard(&farmer(), &transfer, data, None, &cancel).await.unwrap_err();
    assert!(err.is_canceled());

    let mut buffer = vec![0u8; transfer.size as usize];
    let err = client.fetch_shard(&farmer(), &transfer, &mut buffer, None, &cancel).await.unwrap_err();
    assert!(err.is_canceled());
    assert!(client_farmer(&client).headers.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_shard_round_trip() {
    let data = Bytes::new();
    let transfer = ShardTransfer::for_data(&data, "tok");
    let client = ShardClient::new(MockFarmer::new());
    let cancel = CancelFlag::new();

    client.put_shard(&farmer(), &transfer, data, None, &cancel).await.unwrap();

    let (progress, watcher) = ProgressSink::channel();
    let mut buffer = Vec::new();
    client.fetch_shard(&farmer(), &transfer, &mut buffer, Some(progress), &cancel).await.unwrap();
    assert!(watcher.latest().is_complete());
}

fn client_farmer(client: &ShardClient<MockFarmer>) -> &MockFarmer { client.http() }
