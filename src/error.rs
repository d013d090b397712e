use std::path::PathBuf;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 帧检索核心的错误类型
#[derive(Error, Debug)]
pub enum Error {
    /// 视频源无法打开，对应视频的整个入库流程失败
    #[error("无法打开视频源 {}: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },
    /// 单帧或单张图片解码失败，只影响这一帧
    #[error("图像解码失败: {0}")]
    Decode(#[source] BoxError),
    /// 持久化层错误
    #[error(transparent)]
    Store(#[from] StoreError),
    /// 调用方传入的参数无效
    #[error("参数无效: {0}")]
    InvalidParameter(String),
    /// 描述符长度超出固定维数，属于内部错误
    #[error("描述符长度 {0} 超过 {max}", max = crate::descriptor::DESCRIPTOR_LEN)]
    DescriptorOverflow(usize),
}

impl Error {
    pub fn source_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::SourceUnavailable { path: path.into(), reason: reason.to_string() }
    }

    pub fn decode(err: impl Into<BoxError>) -> Self {
        Self::Decode(err.into())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Self::Decode(Box::new(err))
    }
}

#[cfg(feature = "opencv")]
impl From<opencv::Error> for Error {
    fn from(err: opencv::Error) -> Self {
        Self::Decode(Box::new(err))
    }
}

/// 描述符存储层的错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    /// 存储中的数据不符合 FrameRecord 的结构约束
    #[error("记录 {id} 结构无效: {reason}")]
    Schema { id: String, reason: String },
    /// 记录 ID 已存在
    #[error("记录已存在: {0}")]
    Conflict(String),
    #[error("写入帧图片失败: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
