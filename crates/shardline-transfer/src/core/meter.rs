use crate::data::{ProgressEvent, ProgressSink};

/// Interval gate in front of a [`ProgressSink`].
///
/// Delivers when more than `interval` bytes accumulated since the last
/// delivery, or when the transfer reaches its declared total. Values that
/// would not raise the last delivered counter are dropped so the observer
/// only ever sees a non-decreasing sequence.
#[derive(Debug)]
pub(crate) struct ProgressMeter {
    sink:           Option<ProgressSink>,
    interval:       u64,
    total:          u64,
    since_last:     u64,
    last_delivered: Option<u64>,
}

impl ProgressMeter {
    pub(crate) fn new(sink: Option<ProgressSink>, interval: u64, total: u64) -> Self {
        Self {
            sink,
            interval,
            total,
            since_last: 0,
            last_delivered: None,
        }
    }

    /// Account for `delta` new bytes, `transferred` being the running count.
    pub(crate) fn advance(&mut self, transferred: u64, delta: u64) {
        if delta == 0 {
            return;
        }
        self.since_last += delta;
        if self.since_last > self.interval || transferred == self.total {
            self.deliver(transferred);
        }
    }

    /// Deliver `transferred` regardless of the interval.
    pub(crate) fn flush(&mut self, transferred: u64) { self.deliver(transferred); }

    fn deliver(&mut self, transferred: u64) {
        self.since_last = 0;
        let Some(sink) = &self.sink else {
            return;
        };
        if self.last_delivered.is_some_and(|last| transferred <= last) {
            return;
        }
        sink.report(ProgressEvent::new(transferred, self.total));
        self.last_delivered = Some(transferred);
    }
}
