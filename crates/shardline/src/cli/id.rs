use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use shardline_verify::ContentId;

#[derive(Clone, Debug, Args)]
pub struct IdArg {
    pub file: PathBuf,
}

impl IdArg {
    pub fn run(&self) -> anyhow::Result<()> {
        let file = File::open(&self.file).with_context(|| format!("failed to open {}", self.file.display()))?;
        let id = ContentId::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to hash {}", self.file.display()))?;
        println!("{id}");
        Ok(())
    }
}
