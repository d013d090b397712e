use anyhow::Result;
use clap::{Parser, ValueEnum};

use crate::FrameDBBuilder;
use crate::cli::SubCommandExtend;
use crate::config::{Opts, SearchOptions};
use crate::record::SimilarityResult;

#[derive(Parser, Debug, Clone)]
pub struct SearchCommand {
    #[command(flatten)]
    pub search: SearchOptions,
    /// 被搜索的图片路径
    pub image: String,
    /// 输出格式
    #[arg(long, value_name = "FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub output_format: OutputFormat,
}

impl SubCommandExtend for SearchCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let db = FrameDBBuilder::new(opts.conf_dir.clone()).open().await?;
        let result = db.query_file(&self.image, self.search.k).await;
        db.close().await;
        print_result(&result?, self.output_format)
    }
}

fn print_result(result: &[SimilarityResult], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?)
        }
        OutputFormat::Table => {
            for item in result {
                match &item.image_path {
                    Some(path) => println!("{:.4}\t{}\t{}", item.score, item.id, path),
                    None => println!("{:.4}\t{}", item.score, item.id),
                }
            }
        }
    }
    Ok(())
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Table,
}
