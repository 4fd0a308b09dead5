use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use shardline_transfer::{ContentId, ShardTransfer};

use super::{App, FarmerArg, cancel_on_interrupt};
use crate::progress::TransferBar;

#[derive(Clone, Debug, Args)]
pub struct GetArg {
    #[command(flatten)]
    pub farmer: FarmerArg,

    /// Expected content identifier (40 lowercase hex characters)
    #[arg(long)]
    pub hash: ContentId,

    /// Shard size in bytes
    #[arg(long)]
    pub size: u64,

    /// Written only after the shard verifies
    #[arg(long, short)]
    pub output: PathBuf,
}

impl GetArg {
    pub async fn run(&self, app: &App) -> anyhow::Result<()> {
        let size = usize::try_from(self.size).context("shard size does not fit in memory")?;
        let transfer = ShardTransfer::new(self.hash.clone(), self.size, self.farmer.token.clone());
        let endpoint = self.farmer.endpoint();
        let client = app.client()?;
        let cancel = cancel_on_interrupt();

        let mut buffer = vec![0u8; size];
        let (bar, progress) = TransferBar::start("download", transfer.size, app.quiet);
        let result = client.fetch_shard(&endpoint, &transfer, &mut buffer, Some(progress), &cancel).await;
        bar.finish().await;

        result.with_context(|| format!("download of shard {} failed", transfer.hash))?;
        std::fs::write(&self.output, &buffer)
            .with_context(|| format!("failed to write {}", self.output.display()))?;
        tracing::info!(shard = %transfer.hash, output = %self.output.display(), "shard saved");
        Ok(())
    }
}
