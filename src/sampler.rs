//! 按固定时间间隔抽取帧

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::frame::RasterFrame;
use crate::source::{FrameSource, FrameStream};

/// 源未报告帧率时使用的默认帧率
pub const DEFAULT_FRAME_RATE: f64 = 30.;

/// 计算采样步长 `round(帧率 * 间隔)`，最小为 1
pub fn stride(frame_rate: f64, interval_secs: f64) -> Result<usize> {
    check_interval(interval_secs)?;
    Ok(stride_for(effective_frame_rate(frame_rate), interval_secs))
}

fn stride_for(frame_rate: f64, interval_secs: f64) -> usize {
    ((frame_rate * interval_secs).round() as usize).max(1)
}

/// 帧率未知（0、负数或非有限值）时回落到默认值
pub fn effective_frame_rate(frame_rate: f64) -> f64 {
    if frame_rate.is_finite() && frame_rate > 0. { frame_rate } else { DEFAULT_FRAME_RATE }
}

fn check_interval(interval_secs: f64) -> Result<()> {
    if !interval_secs.is_finite() || interval_secs <= 0. {
        return Err(Error::InvalidParameter(format!("采样间隔必须为正数: {interval_secs}")));
    }
    Ok(())
}

/// 视频帧采样器
///
/// 每次调用 [`FrameSampler::frames`] 都会重新打开视频，从头开始产生帧
pub struct FrameSampler {
    source: Arc<dyn FrameSource>,
    path: PathBuf,
    interval_secs: f64,
}

impl FrameSampler {
    pub fn new(source: Arc<dyn FrameSource>, path: impl AsRef<Path>, interval_secs: f64) -> Result<Self> {
        check_interval(interval_secs)?;
        Ok(Self { source, path: path.as_ref().to_path_buf(), interval_secs })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 打开视频并返回惰性的采样迭代器
    pub fn frames(&self) -> Result<SampledFrames> {
        let stream = self.source.open(&self.path)?;
        let frame_rate = effective_frame_rate(stream.frame_rate());
        let stride = stride_for(frame_rate, self.interval_secs);
        debug!(
            "{}: 帧率 {frame_rate:.3}，间隔 {}s，步长 {stride}",
            self.path.display(),
            self.interval_secs
        );
        Ok(SampledFrames { stream, stride, frame_rate, position: 0, done: false })
    }
}

/// 采样结果迭代器，产生 `(采样序号, 帧)`
///
/// 解码顺序中第 N 帧在 `N % stride == 0` 时被选中，采样序号为 `N / stride`。
/// 被选中的帧解码失败时只影响这一项，迭代继续；
/// 若流声明 [`FrameStream::stops_on_error`]，第一个错误之后迭代结束
pub struct SampledFrames {
    stream: Box<dyn FrameStream>,
    stride: usize,
    frame_rate: f64,
    position: u64,
    done: bool,
}

impl SampledFrames {
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }
}

impl Iterator for SampledFrames {
    type Item = (u64, Result<RasterFrame>);

    fn next(&mut self) -> Option<Self::Item> {
        let stride = self.stride as u64;
        while !self.done {
            let position = self.position;
            if position % stride == 0 {
                match self.stream.next_frame() {
                    Some(frame) => {
                        self.position += 1;
                        if frame.is_err() && self.stream.stops_on_error() {
                            self.done = true;
                        }
                        return Some((position / stride, frame));
                    }
                    None => self.done = true,
                }
            } else {
                match self.stream.skip() {
                    Some(Ok(())) => self.position += 1,
                    Some(Err(e)) if self.stream.stops_on_error() => {
                        warn!("跳过未选中帧 {position} 时出错，视频流提前结束: {e}");
                        self.done = true;
                    }
                    Some(Err(e)) => {
                        debug!("跳过未选中帧 {position} 时出错: {e}");
                        self.position += 1;
                    }
                    None => self.done = true,
                }
            }
        }
        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// 内存中的合成视频，帧内容为纯色，可以指定解码失败的位置
    pub(crate) struct SyntheticVideo {
        pub frames: usize,
        pub frame_rate: f64,
        pub color: [u8; 3],
        pub broken: Vec<usize>,
        /// 从该位置起每次读取都失败，且流声明出错即停止
        pub jammed_at: Option<usize>,
        pub opened: AtomicUsize,
    }

    impl SyntheticVideo {
        pub fn new(frames: usize, frame_rate: f64, color: [u8; 3]) -> Self {
            Self {
                frames,
                frame_rate,
                color,
                broken: vec![],
                jammed_at: None,
                opened: AtomicUsize::new(0),
            }
        }
    }

    struct SyntheticStream {
        position: usize,
        frames: usize,
        frame_rate: f64,
        color: [u8; 3],
        broken: Vec<usize>,
        jammed_at: Option<usize>,
    }

    impl FrameStream for SyntheticStream {
        fn frame_rate(&self) -> f64 {
            self.frame_rate
        }

        fn next_frame(&mut self) -> Option<Result<RasterFrame>> {
            if self.jammed_at.is_some_and(|at| self.position >= at) {
                return Some(Err(Error::decode("stream jammed")));
            }
            if self.position >= self.frames {
                return None;
            }
            let position = self.position;
            self.position += 1;
            if self.broken.contains(&position) {
                return Some(Err(Error::decode(format!("broken frame {position}"))));
            }
            let mut frame = RasterFrame::filled(16, 9, self.color).into_image();
            // 左上角像素记录位置，方便验证
            frame.put_pixel(0, 0, image::Rgb([position as u8, 0, 0]));
            Some(Ok(frame.into()))
        }

        fn stops_on_error(&self) -> bool {
            self.jammed_at.is_some()
        }
    }

    impl FrameSource for SyntheticVideo {
        fn open(&self, path: &Path) -> Result<Box<dyn FrameStream>> {
            if path.to_string_lossy().contains("missing") {
                return Err(Error::source_unavailable(path, "no such video"));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(SyntheticStream {
                position: 0,
                frames: self.frames,
                frame_rate: self.frame_rate,
                color: self.color,
                broken: self.broken.clone(),
                jammed_at: self.jammed_at,
            }))
        }
    }

    fn positions(frames: SampledFrames) -> Vec<(u64, u8)> {
        frames.map(|(idx, frame)| (idx, frame.unwrap().as_image().get_pixel(0, 0).0[0])).collect()
    }

    #[test]
    fn stride_rounding() {
        assert_eq!(stride(30., 1.).unwrap(), 30);
        assert_eq!(stride(29.97, 1.).unwrap(), 30);
        assert_eq!(stride(25., 0.5).unwrap(), 13);
        assert_eq!(stride(30., 0.01).unwrap(), 1);
        assert_eq!(stride(0., 2.).unwrap(), 60);
        assert_eq!(stride(f64::NAN, 1.).unwrap(), 30);
    }

    #[test]
    fn rejects_non_positive_interval() {
        for interval in [0., -1., f64::NAN, f64::INFINITY] {
            assert!(matches!(stride(30., interval), Err(Error::InvalidParameter(_))));
        }
        let source = Arc::new(SyntheticVideo::new(10, 30., [0, 0, 0]));
        assert!(FrameSampler::new(source, "video", 0.).is_err());
    }

    #[test]
    fn samples_every_stride() {
        let source = Arc::new(SyntheticVideo::new(90, 30., [10, 10, 10]));
        let sampler = FrameSampler::new(source, "video", 1.).unwrap();
        let frames = sampler.frames().unwrap();
        assert_eq!(frames.stride(), 30);
        assert_eq!(positions(frames), [(0, 0), (1, 30), (2, 60)]);
    }

    #[test]
    fn unknown_rate_defaults_to_30() {
        let source = Arc::new(SyntheticVideo::new(61, 0., [10, 10, 10]));
        let sampler = FrameSampler::new(source, "video", 1.).unwrap();
        let frames = sampler.frames().unwrap();
        assert_eq!(frames.frame_rate(), DEFAULT_FRAME_RATE);
        assert_eq!(frames.stride(), 30);
        assert_eq!(positions(frames), [(0, 0), (1, 30), (2, 60)]);
    }

    #[test]
    fn restartable() {
        let source = Arc::new(SyntheticVideo::new(10, 4., [10, 10, 10]));
        let sampler = FrameSampler::new(source.clone(), "video", 1.).unwrap();
        let first = positions(sampler.frames().unwrap());
        let second = positions(sampler.frames().unwrap());
        assert_eq!(first, [(0, 0), (1, 4), (2, 8)]);
        assert_eq!(first, second);
        assert_eq!(source.opened.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn broken_frame_only_affects_itself() {
        let mut video = SyntheticVideo::new(9, 1., [10, 10, 10]);
        video.broken = vec![3, 4];
        let sampler = FrameSampler::new(Arc::new(video), "video", 3.).unwrap();
        let items = sampler.frames().unwrap().collect::<Vec<_>>();
        assert_eq!(items.len(), 3);
        assert!(items[0].1.is_ok());
        assert!(matches!(items[1], (1, Err(Error::Decode(_)))));
        assert!(matches!(items[2], (2, Ok(_))));
    }

    #[test]
    fn stream_that_stops_on_error_ends_after_one_error() {
        // 选中帧处出错
        let mut video = SyntheticVideo::new(100, 1., [10, 10, 10]);
        video.jammed_at = Some(3);
        let sampler = FrameSampler::new(Arc::new(video), "video", 1.).unwrap();
        let items = sampler.frames().unwrap().take(1000).collect::<Vec<_>>();
        assert_eq!(items.len(), 4);
        assert!(items[..3].iter().all(|(_, frame)| frame.is_ok()));
        assert!(matches!(items[3], (3, Err(Error::Decode(_)))));

        // 跳过的帧处出错
        let mut video = SyntheticVideo::new(100, 1., [10, 10, 10]);
        video.jammed_at = Some(4);
        let sampler = FrameSampler::new(Arc::new(video), "video", 3.).unwrap();
        let items = sampler.frames().unwrap().take(1000).collect::<Vec<_>>();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|(_, frame)| frame.is_ok()));
    }

    #[test]
    fn missing_source() {
        let source = Arc::new(SyntheticVideo::new(9, 1., [10, 10, 10]));
        let sampler = FrameSampler::new(source, "missing.mp4", 1.).unwrap();
        assert!(matches!(sampler.frames(), Err(Error::SourceUnavailable { .. })));
    }
}
