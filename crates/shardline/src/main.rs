use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::App;

mod cli;
mod config;
mod progress;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app = App::parse();

    let default_level = match app.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    app.run().await
}
