use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use indicatif::ProgressBar;
use log::info;

use crate::FrameDBBuilder;
use crate::cli::SubCommandExtend;
use crate::config::{Opts, SamplerOptions};
use crate::error::{Error, StoreError};
use crate::record::video_name;
use crate::source::suffix_regex;
use crate::utils::{pb_style, scan_directory};

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    #[command(flatten)]
    pub sampler: SamplerOptions,
    /// 视频路径，目录会被递归扫描
    #[arg(required = true)]
    pub path: Vec<PathBuf>,
    /// 扫描目录时的视频后缀名，多个后缀用逗号分隔
    #[arg(short, long, default_value = "gif,mp4,mkv,avi,mov,webm")]
    pub suffix: String,
    /// 将目录本身当作一个图片序列视频，而不是扫描其中的视频文件
    #[arg(long)]
    pub sequence: bool,
    /// 将采样帧保存为 JPEG 图片
    #[arg(long)]
    pub save_frames: bool,
    /// 如果视频已添加，删除旧的记录后重新添加
    #[arg(long)]
    pub overwrite: bool,
}

impl SubCommandExtend for AddCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let re_suf = suffix_regex(&self.suffix);
        let db = FrameDBBuilder::new(opts.conf_dir.clone())
            .save_frames(self.save_frames)
            .source(Arc::new(self.sampler.opener()))
            .open()
            .await?;

        let mut videos = vec![];
        for path in &self.path {
            if path.is_dir() && !self.sequence {
                videos.extend(scan_directory(path, &re_suf));
            } else {
                videos.push(path.clone());
            }
        }

        let pb = ProgressBar::new(videos.len() as u64).with_style(pb_style());
        let (mut stored, mut skipped) = (0, 0);

        for video in videos {
            let name = video_name(&video);
            if self.overwrite {
                db.remove_video(&name).await?;
            }

            pb.set_message(name.clone());
            match db.ingest(&video, self.sampler.interval).await {
                Ok(report) => {
                    pb.suspend(|| {
                        println!("[OK] {}: {} 帧，跳过 {} 帧", video.display(), report.stored, report.skipped)
                    });
                    stored += report.stored;
                    skipped += report.skipped;
                }
                Err(Error::Store(StoreError::Conflict(id))) => {
                    pb.suspend(|| println!("[SKIP] {}: 已添加 ({id})", video.display()));
                }
                Err(e @ (Error::SourceUnavailable { .. } | Error::Decode(_))) => {
                    pb.suspend(|| println!("[ERR] {}: {e}", video.display()));
                }
                Err(e) => {
                    db.close().await;
                    return Err(e.into());
                }
            }
            pb.inc(1);
        }

        pb.finish_with_message("视频添加完成");
        info!("共写入 {stored} 帧，跳过 {skipped} 帧");
        db.close().await;

        Ok(())
    }
}
