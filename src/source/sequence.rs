use std::path::{Path, PathBuf};
use std::vec::IntoIter;

use regex::Regex;

use super::FrameStream;
use crate::error::{Error, Result};
use crate::frame::{RasterFrame, read_image};

/// 由目录中的图片组成的帧流，按文件名排序
pub struct ImageSequence {
    files: IntoIter<PathBuf>,
    frame_rate: f64,
}

impl ImageSequence {
    pub fn open(dir: &Path, suffix: &Regex, frame_rate: f64) -> Result<Self> {
        let entries = std::fs::read_dir(dir).map_err(|e| Error::source_unavailable(dir, e))?;

        let mut files = vec![];
        for entry in entries {
            let path = entry.map_err(|e| Error::source_unavailable(dir, e))?.path();
            if !path.is_file() {
                continue;
            }
            let Some(ext) = path.extension() else {
                continue;
            };
            if suffix.is_match(&ext.to_string_lossy()) {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(Error::source_unavailable(dir, "目录中没有图片"));
        }

        Ok(Self { files: files.into_iter(), frame_rate })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.len() == 0
    }
}

impl FrameStream for ImageSequence {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn next_frame(&mut self) -> Option<Result<RasterFrame>> {
        self.files.next().map(read_image)
    }

    fn skip(&mut self) -> Option<Result<()>> {
        self.files.next().map(|_| Ok(()))
    }
}
