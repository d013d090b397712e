//! 描述符存储接口及其实现

use std::future::Future;
use std::path::Path;

use log::info;
use tokio::sync::RwLock;

use crate::db::{self, Database, FrameRow};
use crate::descriptor::Descriptor;
use crate::error::StoreError;
use crate::record::FrameRecord;

/// 存储统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StoreStats {
    pub frames: u64,
    pub videos: u64,
}

/// 描述符存储
///
/// 核心只依赖这几个操作，不要求过滤或分页
pub trait DescriptorStore: Send + Sync {
    /// 写入一条记录，ID 冲突时返回 [`StoreError::Conflict`]
    fn put(&self, record: &FrameRecord) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// 按写入顺序返回当前所有记录
    fn list_all(&self) -> impl Future<Output = Result<Vec<FrameRecord>, StoreError>> + Send;

    /// 删除一个视频的所有记录，返回删除数量
    fn remove_video(&self, video: &str) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn stats(&self) -> impl Future<Output = Result<StoreStats, StoreError>> + Send;
}

/// SQLite 存储
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub async fn open(filename: impl AsRef<Path>, wal: bool) -> Result<Self, StoreError> {
        let db = db::init_db(filename, wal).await?;
        Ok(Self { db })
    }

    pub fn from_pool(db: Database) -> Self {
        Self { db }
    }

    /// 关闭连接池
    pub async fn close(&self) {
        info!("关闭数据库连接");
        self.db.close().await;
    }
}

impl DescriptorStore for SqliteStore {
    async fn put(&self, record: &FrameRecord) -> Result<(), StoreError> {
        let row = FrameRow {
            id: record.id.clone(),
            video: record.video.clone(),
            sample_index: record.sample_index as i64,
            descriptor: record.descriptor.to_bytes(),
            image_path: record.image_path.clone(),
        };
        db::crud::add_frame(&self.db, &row).await.map_err(|e| match e {
            sqlx::Error::Database(ref err) if err.is_unique_violation() => {
                StoreError::Conflict(record.id.clone())
            }
            e => e.into(),
        })
    }

    async fn list_all(&self) -> Result<Vec<FrameRecord>, StoreError> {
        db::crud::get_frames(&self.db).await?.into_iter().map(to_record).collect()
    }

    async fn remove_video(&self, video: &str) -> Result<u64, StoreError> {
        Ok(db::crud::delete_video(&self.db, video).await?)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let count = db::crud::get_count(&self.db).await?;
        Ok(StoreStats { frames: count.frames as u64, videos: count.videos as u64 })
    }
}

/// 数据库行转为 FrameRecord，同时校验结构
fn to_record(row: FrameRow) -> Result<FrameRecord, StoreError> {
    let schema = |reason: String| StoreError::Schema { id: row.id.clone(), reason };
    let descriptor = Descriptor::from_bytes(&row.descriptor).map_err(|e| schema(e.to_string()))?;
    let sample_index =
        u64::try_from(row.sample_index).map_err(|_| schema(format!("采样序号为负: {}", row.sample_index)))?;
    Ok(FrameRecord {
        id: row.id,
        video: row.video,
        sample_index,
        descriptor,
        image_path: row.image_path,
    })
}

/// 内存存储，进程退出后数据丢失
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<FrameRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DescriptorStore for MemoryStore {
    async fn put(&self, record: &FrameRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::Conflict(record.id.clone()));
        }
        records.push(record.clone());
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<FrameRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn remove_video(&self, video: &str) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.video != video);
        Ok((before - records.len()) as u64)
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let records = self.records.read().await;
        let mut videos = records.iter().map(|r| r.video.as_str()).collect::<Vec<_>>();
        videos.sort_unstable();
        videos.dedup();
        Ok(StoreStats { frames: records.len() as u64, videos: videos.len() as u64 })
    }
}
