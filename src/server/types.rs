use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use utoipa::ToSchema;

/// 上传视频请求参数
#[derive(TryFromMultipart)]
pub struct UploadVideoRequest {
    pub file: FieldData<Bytes>,
    pub interval: Option<f64>,
}

/// 上传视频表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct UploadVideoForm {
    /// 视频文件，文件名会作为视频名
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// 采样间隔，单位为秒
    pub interval: Option<f64>,
}

/// 上传视频响应
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct UploadVideoResponse {
    pub message: String,
    /// 写入的帧数
    pub stored: u64,
    /// 解码失败被跳过的帧数
    pub skipped: u64,
}

/// 相似帧搜索请求参数
#[derive(TryFromMultipart)]
pub struct FindSimilarRequest {
    pub file: Bytes,
    pub top_k: Option<usize>,
}

/// 相似帧搜索表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct FindSimilarForm {
    /// 查询图片
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
    /// 返回的结果数量
    pub top_k: Option<usize>,
}

/// 单条搜索结果
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct SimilarFrame {
    /// 帧记录 ID
    pub id: String,
    /// 采样帧图片路径
    pub image_path: Option<String>,
    /// 余弦相似度
    pub score: f32,
    /// 256 维描述符
    pub vector: Vec<f32>,
}

/// 相似帧搜索响应
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct FindSimilarResponse {
    /// 搜索耗时，单位为毫秒
    pub time: u32,
    pub results: Vec<SimilarFrame>,
}
