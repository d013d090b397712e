use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use crate::cli::*;
use crate::source::VideoOpener;

static CONF_DIR: LazyLock<ConfDir> = LazyLock::new(|| {
    let proj_dirs = ProjectDirs::from("", "vfsearch", "vfsearch").expect("failed to get project dir");
    ConfDir { path: proj_dirs.config_dir().to_path_buf() }
});

fn default_config_dir() -> &'static str {
    CONF_DIR.path().to_str().expect("config dir is not valid utf-8")
}

#[derive(Parser, Debug, Clone)]
pub struct SamplerOptions {
    /// 采样间隔，单位为秒
    #[arg(short, long, value_name = "SECONDS", default_value_t = 1.)]
    pub interval: f64,
    /// 图片序列的帧率，0 表示未知，此时按 30 计算
    #[arg(long, value_name = "FPS", default_value_t = 0.)]
    pub fps: f64,
    /// 图片序列中被视为帧的文件后缀，多个后缀用逗号分隔
    #[arg(long, value_name = "SUFFIX", default_value = "jpg,jpeg,png,bmp,webp")]
    pub frame_suffix: String,
}

impl SamplerOptions {
    pub fn opener(&self) -> VideoOpener {
        VideoOpener::new(self.fps, &self.frame_suffix)
    }
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// 返回的结果数量
    #[arg(short, value_name = "K", default_value_t = 5)]
    pub k: usize,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "vfsearch", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// vfsearch 配置文件目录
    #[arg(short, long, default_value = default_config_dir())]
    pub conf_dir: ConfDir,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 对视频采样并将帧描述符添加到数据库
    Add(AddCommand),
    /// 从数据库中搜索与图片相似的帧
    Search(SearchCommand),
    /// 启动 HTTP 搜索服务
    Server(ServerCommand),
    /// 显示数据库统计信息
    Stats(StatsCommand),
    /// 导出所有描述符为 npy 文件
    Export(ExportCommand),
}

#[derive(Debug, Clone)]
pub struct ConfDir {
    path: PathBuf,
}

impl ConfDir {
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// 返回数据库文件的路径
    pub fn database(&self) -> PathBuf {
        self.path.join("vfsearch.db")
    }

    /// 返回采样帧图片目录
    pub fn frames(&self) -> PathBuf {
        self.path.join("frames")
    }
}

impl FromStr for ConfDir {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { path: PathBuf::from(s) })
    }
}
