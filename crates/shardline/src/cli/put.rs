use std::path::PathBuf;

use anyhow::{Context, bail};
use bytes::Bytes;
use clap::Args;
use shardline_transfer::ShardTransfer;

use super::{App, FarmerArg, cancel_on_interrupt};
use crate::progress::TransferBar;

#[derive(Clone, Debug, Args)]
pub struct PutArg {
    #[command(flatten)]
    pub farmer: FarmerArg,

    pub file: PathBuf,
}

impl PutArg {
    pub async fn run(&self, app: &App) -> anyhow::Result<()> {
        let data = std::fs::read(&self.file).with_context(|| format!("failed to read {}", self.file.display()))?;
        let data = Bytes::from(data);
        let transfer = ShardTransfer::for_data(&data, self.farmer.token.clone());
        let endpoint = self.farmer.endpoint();
        let client = app.client()?;
        let cancel = cancel_on_interrupt();

        let (bar, progress) = TransferBar::start("upload", transfer.size, app.quiet);
        let result = client.put_shard(&endpoint, &transfer, data, Some(progress), &cancel).await;
        bar.finish().await;

        let status = result.with_context(|| format!("upload of shard {} failed", transfer.hash))?;
        if !(200..300).contains(&status) {
            bail!("farmer rejected shard {} with status {status}", transfer.hash);
        }
        println!("{}", transfer.hash);
        Ok(())
    }
}
