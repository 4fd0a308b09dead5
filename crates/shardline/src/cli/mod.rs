use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use shardline_transfer::{CancelFlag, FarmerEndpoint, ProxyConfig, ShardClient};

mod get;
mod id;
mod put;

#[derive(Clone, Debug, Parser)]
#[command(name = "shardline", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,

    /// TOML file with HTTP options
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Proxy as `scheme://host:port` (http, socks4, socks4a, socks5, socks5h)
    #[arg(long, global = true)]
    pub proxy: Option<ProxyConfig>,

    /// Hide the progress bar
    #[arg(long, short, global = true)]
    pub quiet: bool,

    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(name = "id", about = "Print the content identifier of a file")]
    Id(id::IdArg),
    #[command(name = "put", about = "Upload a file to a farmer as one shard")]
    Put(put::PutArg),
    #[command(name = "get", about = "Download a shard from a farmer and verify it")]
    Get(get::GetArg),
}

#[derive(Clone, Debug, Args)]
pub struct FarmerArg {
    #[arg(long, default_value = "http")]
    pub proto: String,
    #[arg(long)]
    pub host: String,
    #[arg(long)]
    pub port: u16,
    #[arg(long)]
    pub node_id: String,
    /// Transfer token issued by the bridge
    #[arg(long)]
    pub token: String,
}

impl FarmerArg {
    pub fn endpoint(&self) -> FarmerEndpoint {
        FarmerEndpoint::new(self.proto.clone(), self.host.clone(), self.port, self.node_id.clone())
    }
}

impl App {
    pub async fn run(self) -> anyhow::Result<()> {
        match &self.cmd {
            Commands::Id(arg) => arg.run(),
            Commands::Put(arg) => arg.run(&self).await,
            Commands::Get(arg) => arg.run(&self).await,
        }
    }

    pub(crate) fn client(&self) -> anyhow::Result<ShardClient<shardline_transfer::ReqwestClient>> {
        let options = crate::config::load(self.config.as_deref(), self.user_agent.clone(), self.proxy.clone())?;
        Ok(ShardClient::from_options(options)?)
    }
}

/// Flag that trips on the first Ctrl-C.
pub(crate) fn cancel_on_interrupt() -> CancelFlag {
    let cancel = CancelFlag::new();
    let flag = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, canceling transfer");
            flag.cancel();
        }
    });
    cancel
}
