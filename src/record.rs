use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::descriptor::Descriptor;

/// 一帧的描述符记录，入库后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    /// 记录 ID，格式为 `{视频名}_frame_{采样序号}`
    pub id: String,
    /// 来源视频的文件名
    pub video: String,
    /// 采样序号，从 0 开始
    pub sample_index: u64,
    pub descriptor: Descriptor,
    /// 采样帧保存到磁盘的路径
    pub image_path: Option<String>,
}

impl FrameRecord {
    pub fn new(video: &str, sample_index: u64, descriptor: Descriptor) -> Self {
        Self {
            id: frame_id(video, sample_index),
            video: video.to_string(),
            sample_index,
            descriptor,
            image_path: None,
        }
    }

    pub fn with_image_path(mut self, path: impl Into<String>) -> Self {
        self.image_path = Some(path.into());
        self
    }
}

/// 一次查询中的单条结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    pub id: String,
    /// 余弦相似度，范围 [-1, 1]
    pub score: f32,
    pub image_path: Option<String>,
    #[serde(rename = "vector")]
    pub descriptor: Descriptor,
}

pub fn frame_id(video: &str, sample_index: u64) -> String {
    format!("{video}_frame_{sample_index}")
}

/// 视频名取路径的文件名部分
pub fn video_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}
