use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, Frames};

use super::FrameStream;
use crate::error::{Error, Result};
use crate::frame::RasterFrame;

/// GIF 动图帧流，帧率由第一帧的延迟推算
///
/// 解码器遇到格式错误后会反复返回同一个错误，因此第一个错误之后流即结束
pub struct GifStream {
    frames: Frames<'static>,
    first: Option<Result<RasterFrame>>,
    frame_rate: f64,
    failed: bool,
}

impl GifStream {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::source_unavailable(path, e))?;
        let decoder = GifDecoder::new(BufReader::new(file))
            .map_err(|e| Error::source_unavailable(path, e))?;
        let mut frames = decoder.into_frames();

        let (first, frame_rate) = match frames.next() {
            Some(Ok(frame)) => {
                let (numer, denom) = frame.delay().numer_denom_ms();
                let frame_rate = if numer == 0 { 0. } else { 1000. * denom as f64 / numer as f64 };
                (Some(Ok(RasterFrame::from(frame.into_buffer()))), frame_rate)
            }
            Some(Err(e)) => (Some(Err(e.into())), 0.),
            None => (None, 0.),
        };

        let failed = matches!(first, Some(Err(_)));
        Ok(Self { frames, first, frame_rate, failed })
    }
}

impl FrameStream for GifStream {
    fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    fn next_frame(&mut self) -> Option<Result<RasterFrame>> {
        if let Some(first) = self.first.take() {
            return Some(first);
        }
        if self.failed {
            return None;
        }
        match self.frames.next()? {
            Ok(frame) => Some(Ok(RasterFrame::from(frame.into_buffer()))),
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
