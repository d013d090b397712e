use anyhow::Result;
use clap::Parser;

use crate::cli::SubCommandExtend;
use crate::{FrameDBBuilder, Opts};

#[derive(Parser, Debug, Clone)]
pub struct StatsCommand {}

impl SubCommandExtend for StatsCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let db = FrameDBBuilder::new(opts.conf_dir.clone()).open().await?;
        let stats = db.stats().await?;
        db.close().await;
        println!("视频数量: {}", stats.videos);
        println!("帧数量  : {}", stats.frames);
        Ok(())
    }
}
