use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, warn};
use ndarray::Array2;
use serde::Serialize;
use tokio::sync::mpsc::channel;
use tokio::task::{JoinHandle, spawn_blocking};

use crate::config::ConfDir;
use crate::descriptor::{self, DESCRIPTOR_LEN, Descriptor};
use crate::error::{Error, Result};
use crate::frame::decode_image;
use crate::metrics;
use crate::ranker;
use crate::record::{FrameRecord, SimilarityResult, video_name};
use crate::sampler::FrameSampler;
use crate::source::{FrameSource, VideoOpener};
use crate::store::{DescriptorStore, SqliteStore, StoreStats};

/// 单个视频的入库结果
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    /// 视频名
    pub video: String,
    /// 成功写入的记录数
    pub stored: u64,
    /// 解码或提取失败而跳过的采样帧数
    pub skipped: u64,
    /// 采样步长
    pub stride: usize,
    /// 实际使用的帧率
    pub frame_rate: f64,
}

pub struct FrameDBBuilder {
    conf_dir: ConfDir,
    wal: bool,
    save_frames: bool,
    source: Arc<dyn FrameSource>,
}

impl FrameDBBuilder {
    pub fn new(conf_dir: ConfDir) -> Self {
        Self { conf_dir, wal: true, save_frames: false, source: Arc::new(VideoOpener::default()) }
    }

    /// 是否启用 WAL 模式
    pub fn wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }

    /// 是否将采样帧保存到 `frames` 目录
    pub fn save_frames(mut self, save_frames: bool) -> Self {
        self.save_frames = save_frames;
        self
    }

    /// 视频帧来源
    pub fn source(mut self, source: Arc<dyn FrameSource>) -> Self {
        self.source = source;
        self
    }

    pub async fn open(self) -> Result<FrameDB<SqliteStore>> {
        tokio::fs::create_dir_all(self.conf_dir.path()).await.map_err(crate::StoreError::from)?;
        let store = SqliteStore::open(self.conf_dir.database(), self.wal).await?;

        let mut db = FrameDB::new(store, self.source);
        if self.save_frames {
            let frames_dir = self.conf_dir.frames();
            tokio::fs::create_dir_all(&frames_dir).await.map_err(crate::StoreError::from)?;
            db = db.with_frames_dir(frames_dir);
        }
        Ok(db)
    }
}

/// 视频帧检索的入口，持有显式注入的存储句柄
pub struct FrameDB<S> {
    store: Arc<S>,
    source: Arc<dyn FrameSource>,
    frames_dir: Option<PathBuf>,
}

impl<S> FrameDB<S>
where
    S: DescriptorStore + 'static,
{
    pub fn new(store: S, source: Arc<dyn FrameSource>) -> Self {
        Self { store: Arc::new(store), source, frames_dir: None }
    }

    /// 采样帧的 JPEG 副本保存到该目录
    pub fn with_frames_dir(mut self, frames_dir: impl Into<PathBuf>) -> Self {
        self.frames_dir = Some(frames_dir.into());
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn frames_dir(&self) -> Option<&Path> {
        self.frames_dir.as_deref()
    }

    /// 对视频按间隔采样，计算描述符并写入存储，返回入库结果
    ///
    /// 单帧解码失败会被跳过并计入 `skipped`，视频无法打开或存储失败则直接返回错误
    pub async fn ingest(&self, video: impl AsRef<Path>, interval_secs: f64) -> Result<IngestReport> {
        let path = video.as_ref();
        let name = video_name(path);
        let sampler = FrameSampler::new(self.source.clone(), path, interval_secs)?;

        info!("开始处理视频: {}", path.display());

        let (record_tx, mut record_rx) = channel(num_cpus::get() * 2);

        // 采样和描述符计算都是 CPU 密集型任务
        let task: JoinHandle<Result<(usize, f64)>> = spawn_blocking({
            let name = name.clone();
            let frames_dir = self.frames_dir.clone();
            move || {
                let frames = sampler.frames()?;
                let params = (frames.stride(), frames.frame_rate());
                for (index, frame) in frames {
                    let record = frame.and_then(|frame| {
                        let mut record = FrameRecord::new(&name, index, descriptor::extract(&frame)?);
                        if let Some(dir) = &frames_dir {
                            let file = dir.join(format!("{}.jpg", record.id));
                            frame.save_jpeg(&file)?;
                            record = record.with_image_path(file.to_string_lossy());
                        }
                        Ok(record)
                    });
                    if record_tx.blocking_send((index, record)).is_err() {
                        break;
                    }
                }
                Ok(params)
            }
        });

        let mut report = IngestReport { video: name, ..Default::default() };
        while let Some((index, record)) = record_rx.recv().await {
            match record {
                Ok(record) => {
                    self.store.put(&record).await?;
                    report.stored += 1;
                }
                Err(Error::Decode(e)) => {
                    warn!("跳过第 {index} 个采样帧 ({}): {e}", report.video);
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let (stride, frame_rate) = match task.await {
            Ok(result) => result?,
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        };
        report.stride = stride;
        report.frame_rate = frame_rate;

        metrics::inc_ingest_frames("stored", report.stored);
        metrics::inc_ingest_frames("skipped", report.skipped);
        info!(
            "视频 {} 处理完成: 写入 {} 帧，跳过 {} 帧，步长 {}",
            report.video, report.stored, report.skipped, report.stride
        );

        Ok(report)
    }

    /// 使用图片字节查询最相似的 k 个帧
    pub async fn query(&self, image: &[u8], k: usize) -> Result<Vec<SimilarityResult>> {
        check_k(k)?;
        let start = Instant::now();

        let image = image.to_vec();
        let (size, descriptor) = run_blocking(move || {
            let frame = decode_image(&image)?;
            let descriptor = descriptor::extract(&frame)?;
            Ok(((frame.width(), frame.height()), descriptor))
        })
        .await?;
        metrics::inc_image_count(size);

        let results = self.query_descriptor(&descriptor, k).await?;

        let elapsed = start.elapsed().as_secs_f32();
        metrics::inc_query_duration(size, elapsed);
        if let Some(best) = results.first() {
            metrics::inc_query_max_score(best.score);
        }
        debug!("查询耗时: {:.2}ms", elapsed * 1000.);

        Ok(results)
    }

    /// 读取图片文件并查询
    pub async fn query_file(&self, path: impl AsRef<Path>, k: usize) -> Result<Vec<SimilarityResult>> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| Error::decode(format!("{}: {e}", path.display())))?;
        self.query(&bytes, k).await
    }

    /// 使用已计算的描述符查询
    pub async fn query_descriptor(&self, descriptor: &Descriptor, k: usize) -> Result<Vec<SimilarityResult>> {
        check_k(k)?;
        let records = self.store.list_all().await?;
        debug!("对 {} 条记录进行线性扫描", records.len());
        let query = descriptor.clone();
        run_blocking(move || Ok(ranker::top_k(&query, &records, k))).await
    }

    /// 删除一个视频的所有记录
    pub async fn remove_video(&self, video: &str) -> Result<u64> {
        let removed = self.store.remove_video(video).await?;
        if removed > 0 {
            info!("删除视频 {video} 的 {removed} 条记录");
        }
        Ok(removed)
    }

    pub async fn stats(&self) -> Result<StoreStats> {
        Ok(self.store.stats().await?)
    }

    /// 导出所有描述符为 N x 256 的矩阵
    pub async fn export(&self) -> Result<Array2<f32>> {
        let records = self.store.list_all().await?;
        let mut arr = Array2::zeros((records.len(), DESCRIPTOR_LEN));
        for (mut row, record) in arr.rows_mut().into_iter().zip(&records) {
            row.assign(&ndarray::ArrayView1::from(record.descriptor.as_slice()));
        }
        Ok(arr)
    }
}

impl FrameDB<SqliteStore> {
    /// 关闭存储
    pub async fn close(&self) {
        self.store.close().await;
    }
}

fn check_k(k: usize) -> Result<()> {
    if k == 0 {
        return Err(Error::InvalidParameter("k 必须大于 0".to_string()));
    }
    Ok(())
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match spawn_blocking(f).await {
        Ok(result) => result,
        Err(e) => std::panic::resume_unwind(e.into_panic()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::ImageFormat;

    use super::*;
    use crate::frame::RasterFrame;
    use crate::sampler::tests::SyntheticVideo;
    use crate::store::MemoryStore;

    fn png(rgb: [u8; 3]) -> Vec<u8> {
        let mut buf = Cursor::new(vec![]);
        RasterFrame::filled(32, 24, rgb).as_image().write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn framedb(video: SyntheticVideo) -> FrameDB<MemoryStore> {
        FrameDB::new(MemoryStore::new(), Arc::new(video))
    }

    #[tokio::test]
    async fn red_video_end_to_end() {
        let db = framedb(SyntheticVideo::new(60, 30., [255, 0, 0]));
        let report = db.ingest("red.mp4", 1.).await.unwrap();
        assert_eq!((report.stored, report.skipped, report.stride), (2, 0, 30));

        let records = db.store().list_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "red.mp4_frame_0");
        assert_eq!(records[1].id, "red.mp4_frame_1");
        let sim = ranker::cosine_similarity(
            records[0].descriptor.as_slice(),
            records[1].descriptor.as_slice(),
        );
        assert!((sim - 1.).abs() < 1e-3);

        let red = db.query(&png([255, 0, 0]), 1).await.unwrap();
        assert_eq!(red.len(), 1);
        assert!(red[0].id.starts_with("red.mp4_frame_"));
        assert!((red[0].score - 1.).abs() < 1e-3);

        let blue = db.query(&png([0, 0, 255]), 1).await.unwrap();
        assert!(blue[0].score < red[0].score);
    }

    #[tokio::test]
    async fn skip_broken_frames() {
        let mut video = SyntheticVideo::new(90, 30., [0, 200, 0]);
        video.broken = vec![30];
        let db = framedb(video);
        let report = db.ingest("green.mp4", 1.).await.unwrap();
        assert_eq!((report.stored, report.skipped), (2, 1));

        let ids = db.store().list_all().await.unwrap().into_iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids, ["green.mp4_frame_0", "green.mp4_frame_2"]);
    }

    #[tokio::test]
    async fn invalid_parameters() {
        let db = framedb(SyntheticVideo::new(10, 30., [0, 0, 0]));
        assert!(matches!(db.ingest("v.mp4", 0.).await, Err(Error::InvalidParameter(_))));
        assert!(matches!(db.ingest("v.mp4", -2.).await, Err(Error::InvalidParameter(_))));
        assert!(matches!(db.query(&png([0, 0, 0]), 0).await, Err(Error::InvalidParameter(_))));
        assert!(db.store().list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unavailable_source() {
        let db = framedb(SyntheticVideo::new(10, 30., [0, 0, 0]));
        let err = db.ingest("missing.mp4", 1.).await.unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn corrupt_query_image() {
        let db = framedb(SyntheticVideo::new(10, 30., [0, 0, 0]));
        let err = db.query(b"not an image", 3).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn empty_store_returns_nothing() {
        let db = framedb(SyntheticVideo::new(10, 30., [0, 0, 0]));
        assert!(db.query(&png([1, 2, 3]), 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reingest_conflicts_until_removed() {
        let db = framedb(SyntheticVideo::new(30, 30., [9, 9, 9]));
        db.ingest("a.mp4", 0.5).await.unwrap();
        let err = db.ingest("a.mp4", 0.5).await.unwrap_err();
        assert!(matches!(err, Error::Store(crate::StoreError::Conflict(_))));

        assert_eq!(db.remove_video("a.mp4").await.unwrap(), 2);
        assert_eq!(db.ingest("a.mp4", 0.5).await.unwrap().stored, 2);
    }

    #[tokio::test]
    async fn saves_frames_and_exports() {
        let dir = tempfile::tempdir().unwrap();
        let db = framedb(SyntheticVideo::new(20, 10., [50, 60, 70])).with_frames_dir(dir.path());
        db.ingest("clip.mp4", 1.).await.unwrap();

        let records = db.store().list_all().await.unwrap();
        assert_eq!(records.len(), 2);
        for record in &records {
            let path = record.image_path.as_ref().unwrap();
            assert!(Path::new(path).exists());
            assert!(path.ends_with(&format!("{}.jpg", record.id)));
        }

        let arr = db.export().await.unwrap();
        assert_eq!(arr.shape(), &[2, DESCRIPTOR_LEN]);
        assert_eq!(arr.row(1).to_vec(), records[1].descriptor.as_slice());
    }
}
