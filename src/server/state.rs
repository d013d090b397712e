use std::sync::Arc;

use crate::FrameDB;
use crate::cli::server::ServerCommand;
use crate::config::{SamplerOptions, SearchOptions};
use crate::store::SqliteStore;

/// 应用状态
pub struct AppState {
    /// 帧数据库
    pub db: FrameDB<SqliteStore>,
    /// 采样配置选项
    pub sampler: SamplerOptions,
    /// 搜索配置选项
    pub search: SearchOptions,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(db: FrameDB<SqliteStore>, opts: ServerCommand) -> Arc<Self> {
        Arc::new(AppState { db, sampler: opts.sampler, search: opts.search })
    }
}
