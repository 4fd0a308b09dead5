use tokio::sync::watch;

/// Byte counter snapshot for one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressEvent {
    /// Monotonically non-decreasing across a single transfer.
    pub bytes_transferred: u64,

    pub total_bytes: u64,
}

impl ProgressEvent {
    pub fn new(bytes_transferred: u64, total_bytes: u64) -> Self {
        Self {
            bytes_transferred,
            total_bytes,
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool { self.bytes_transferred >= self.total_bytes }
}

/// Sending half of a progress channel.
///
/// Backed by a `watch` channel: a report overwrites the previous value and
/// wakes the watcher without ever waiting on it, so it is safe to call from
/// the task driving the HTTP transfer.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tx: watch::Sender<ProgressEvent>,
}

impl ProgressSink {
    /// Create a connected sink and watcher.
    pub fn channel() -> (ProgressSink, ProgressWatcher) {
        let (tx, rx) = watch::channel(ProgressEvent::default());
        (ProgressSink { tx }, ProgressWatcher { rx })
    }

    /// Publish `event`. Never blocks; a missing watcher is not an error.
    pub fn report(&self, event: ProgressEvent) { self.tx.send_replace(event); }
}

/// Receiving half of a progress channel.
#[derive(Debug, Clone)]
pub struct ProgressWatcher {
    rx: watch::Receiver<ProgressEvent>,
}

impl ProgressWatcher {
    /// Wait for the next report. Returns `None` once every sink is dropped and
    /// the last value has been seen.
    pub async fn changed(&mut self) -> Option<ProgressEvent> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Latest delivered value, without waiting.
    pub fn latest(&self) -> ProgressEvent { *self.rx.borrow() }
}
