//! 解码后的帧流来源

mod gif;
mod sequence;
#[cfg(feature = "opencv")]
mod capture;

use std::path::Path;

use log::debug;
use regex::Regex;

pub use self::gif::GifStream;
pub use self::sequence::ImageSequence;
#[cfg(feature = "opencv")]
pub use self::capture::CaptureStream;

use crate::error::{Error, Result};
use crate::frame::RasterFrame;

/// 按解码顺序产生帧的流
pub trait FrameStream {
    /// 源报告的帧率，0 表示未知
    fn frame_rate(&self) -> f64;

    /// 解码下一帧，流结束时返回 `None`
    fn next_frame(&mut self) -> Option<Result<RasterFrame>>;

    /// 跳过下一帧，实现可以不解码像素
    fn skip(&mut self) -> Option<Result<()>> {
        self.next_frame().map(|frame| frame.map(|_| ()))
    }

    /// 出错后无法继续解码后续帧，采样器遇到第一个错误即结束
    fn stops_on_error(&self) -> bool {
        false
    }
}

/// 根据路径打开帧流
pub trait FrameSource: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameStream>>;
}

/// 默认的视频打开方式
///
/// * 目录：按文件名排序的图片序列
/// * `.gif`：GIF 动图
/// * 其余：启用 `opencv` feature 时交给 VideoCapture
#[derive(Debug, Clone)]
pub struct VideoOpener {
    /// 图片序列的帧率，0 表示未知
    pub sequence_fps: f64,
    /// 图片序列中被视为帧的文件后缀
    pub sequence_suffix: Regex,
}

impl Default for VideoOpener {
    fn default() -> Self {
        Self::new(0., "jpg,jpeg,png,bmp,webp")
    }
}

impl VideoOpener {
    pub fn new(sequence_fps: f64, suffix: &str) -> Self {
        Self { sequence_fps, sequence_suffix: suffix_regex(suffix) }
    }
}

impl FrameSource for VideoOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameStream>> {
        if path.is_dir() {
            debug!("以图片序列打开: {}", path.display());
            let seq = ImageSequence::open(path, &self.sequence_suffix, self.sequence_fps)?;
            return Ok(Box::new(seq));
        }

        let ext = path.extension().map(|s| s.to_string_lossy().to_lowercase());
        if ext.as_deref() == Some("gif") {
            debug!("以 GIF 打开: {}", path.display());
            return Ok(Box::new(GifStream::open(path)?));
        }

        #[cfg(feature = "opencv")]
        {
            debug!("以 VideoCapture 打开: {}", path.display());
            Ok(Box::new(CaptureStream::open(path)?))
        }

        #[cfg(not(feature = "opencv"))]
        Err(Error::source_unavailable(path, "不支持的视频格式，需要启用 opencv feature"))
    }
}

/// 将逗号分隔的后缀列表转为不区分大小写的正则
pub fn suffix_regex(suffix: &str) -> Regex {
    let re = format!("(?i)^({})$", regex::escape(suffix).replace(',', "|"));
    Regex::new(&re).expect("failed to build regex")
}
