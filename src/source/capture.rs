use std::path::Path;

use image::RgbImage;
use opencv::prelude::*;
use opencv::{core, imgproc, videoio};

use super::FrameStream;
use crate::error::{Error, Result};
use crate::frame::RasterFrame;

/// 使用 OpenCV VideoCapture 读取的容器格式视频，读取出错后流即结束
pub struct CaptureStream {
    capture: videoio::VideoCapture,
    frame_rate: f64,
    failed: bool,
}

impl CaptureStream {
    pub fn open(path: &Path) -> Result<Self> {
        let filename = path.to_string_lossy();
        let capture = videoio::VideoCapture::from_file(&filename, videoio::CAP_ANY)
            .map_err(|e| Error::source_unavailable(path, e))?;
        if !capture.is_opened().map_err(|e| Error::source_unavailable(path, e))? {
            return Err(Error::source_unavailable(path, "VideoCapture 打开失败"));
        }
        let frame_rate = capture.get(videoio::CAP_PROP_FPS).unwrap_or(0.);
        Ok(Self { capture, frame_rate, failed: false })
    }

    fn read(&mut self) -> Option<Result<RasterFrame>> {
        if self.failed {
            return None;
        }
        let mut bgr = core::Mat::default();
        match self.capture.read(&mut bgr) {
            Ok(true) => Some(to_frame(&bgr)),
            Ok(false) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e.into()))
            }
        }
    }
}

impl FrameStream for CaptureStream {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn next_frame(&mut self) -> Option<Result<RasterFrame>> {
        self.read()
    }

    fn skip(&mut self) -> Option<Result<()>> {
        if self.failed {
            return None;
        }
        match self.capture.grab() {
            Ok(true) => Some(Ok(())),
            Ok(false) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e.into()))
            }
        }
    }

    fn stops_on_error(&self) -> bool {
        true
    }
}

fn to_frame(bgr: &core::Mat) -> Result<RasterFrame> {
    let mut rgb = core::Mat::default();
    imgproc::cvt_color_def(bgr, &mut rgb, imgproc::COLOR_BGR2RGB)?;
    let (width, height) = (rgb.cols() as u32, rgb.rows() as u32);
    let data = rgb.data_bytes()?.to_vec();
    RgbImage::from_raw(width, height, data)
        .map(RasterFrame::new)
        .ok_or_else(|| Error::decode("帧数据长度与尺寸不符"))
}
