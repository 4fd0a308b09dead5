use indicatif::{ProgressBar, ProgressStyle};
use shardline_transfer::{ProgressSink, ProgressWatcher};
use tokio::task::JoinHandle;

const PB_STYLE: &str =
    "{spinner:.blue} {prefix:>10.cyan.bold} [{elapsed_precise}] {wide_bar:.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

const TICK: &str = "⠁⠂⠄⡀⢀⠠⠐⠈ ";

const PB_CHARS: &str = "█▓▒░  ";

/// Terminal bar following a transfer's progress channel.
pub struct TransferBar {
    task: JoinHandle<()>,
}

impl TransferBar {
    /// Start drawing; returns the sink to hand to the transfer.
    pub fn start(prefix: &str, total: u64, hidden: bool) -> (Self, ProgressSink) {
        let (sink, watcher) = ProgressSink::channel();

        let pb = if hidden { ProgressBar::hidden() } else { ProgressBar::new(total) };
        if let Ok(style) = ProgressStyle::with_template(PB_STYLE) {
            pb.set_style(style.tick_chars(TICK).progress_chars(PB_CHARS));
        }
        pb.set_prefix(prefix.to_string());

        let task = tokio::spawn(follow(watcher, pb));
        (Self { task }, sink)
    }

    /// Wait for the bar to draw its last value. The sink must be dropped first.
    pub async fn finish(self) { let _ = self.task.await; }
}

async fn follow(mut watcher: ProgressWatcher, pb: ProgressBar) {
    while let Some(event) = watcher.changed().await {
        pb.set_position(event.bytes_transferred);
    }
    let last = watcher.latest();
    if last.is_complete() {
        pb.finish();
    } else {
        pb.abandon();
    }
}
