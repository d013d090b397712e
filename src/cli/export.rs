use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;
use ndarray_npy::write_npy;

use crate::cli::SubCommandExtend;
use crate::{FrameDBBuilder, Opts};

#[derive(Parser, Debug, Clone)]
pub struct ExportCommand {
    /// 输出文件路径
    #[arg(short, long, default_value = "descriptors.npy")]
    pub output: PathBuf,
}

impl SubCommandExtend for ExportCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let db = FrameDBBuilder::new(opts.conf_dir.clone()).open().await?;
        let data = db.export().await?;
        db.close().await;
        write_npy(&self.output, &data)?;
        info!("导出成功: {} 条描述符 -> {}", data.nrows(), self.output.display());
        Ok(())
    }
}
