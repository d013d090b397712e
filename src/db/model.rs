use sqlx::FromRow;

/// 帧描述符记录
#[derive(Debug, FromRow)]
pub struct FrameRow {
    /// 记录 ID
    pub id: String,
    /// 来源视频文件名
    pub video: String,
    /// 采样序号
    pub sample_index: i64,
    /// 256 维描述符，小端序 f32
    pub descriptor: Vec<u8>,
    /// 采样帧图片路径
    pub image_path: Option<String>,
}

/// 数据库统计
#[derive(Debug, FromRow)]
pub struct CountRow {
    pub frames: i64,
    pub videos: i64,
}
