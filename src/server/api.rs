use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path as UrlPath, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum_typed_multipart::TypedMultipart;
use log::info;
use serde_json::{Value, json};

use super::error::{AppError, Result};
use super::state::AppState;
use super::types::*;
use crate::record::video_name;

/// 上传视频，按间隔采样并写入数据库
#[utoipa::path(
    post,
    path = "/upload-video",
    request_body(content = UploadVideoForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = UploadVideoResponse),
    )
)]
pub async fn upload_video_handler(
    State(state): State<Arc<AppState>>,
    data: TypedMultipart<UploadVideoRequest>,
) -> Result<Json<Value>> {
    let Some(file_name) = upload_file_name(data.file.metadata.file_name.as_deref()) else {
        return Err(AppError::new(StatusCode::BAD_REQUEST, "文件名无效"));
    };
    let interval = data.interval.unwrap_or(state.sampler.interval);

    info!("收到上传视频: {file_name}");

    // 保留原始文件名，格式识别和记录 ID 都依赖它
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(&file_name);
    tokio::fs::write(&path, &data.file.contents).await?;

    let report = state.db.ingest(&path, interval).await?;

    Ok(Json(json!({
        "message": format!("Extracted and stored {} frames.", report.stored),
        "stored": report.stored,
        "skipped": report.skipped,
    })))
}

/// 搜索与上传图片相似的帧
#[utoipa::path(
    post,
    path = "/find-similar",
    request_body(content = FindSimilarForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, body = FindSimilarResponse),
    )
)]
pub async fn find_similar_handler(
    State(state): State<Arc<AppState>>,
    data: TypedMultipart<FindSimilarRequest>,
) -> Result<Json<Value>> {
    let k = data.top_k.unwrap_or(state.search.k);
    let start = Instant::now();

    info!("正在搜索上传图片");

    let results = state.db.query(&data.file, k).await?;

    Ok(Json(json!({
        "time": start.elapsed().as_millis(),
        "results": results,
    })))
}

/// 获取保存的采样帧图片
#[utoipa::path(
    get,
    path = "/frame/{name}",
    params(("name" = String, Path, description = "帧图片文件名")),
    responses(
        (status = 200, description = "JPEG 图片", content_type = "image/jpeg"),
        (status = 404, description = "图片不存在"),
    )
)]
pub async fn frame_handler(
    State(state): State<Arc<AppState>>,
    UrlPath(name): UrlPath<String>,
) -> Result<impl IntoResponse> {
    let not_found = || AppError::new(StatusCode::NOT_FOUND, format!("帧图片不存在: {name}"));

    let Some(frames_dir) = state.db.frames_dir() else {
        return Err(not_found());
    };
    if !is_frame_file_name(&name) {
        return Err(AppError::new(StatusCode::BAD_REQUEST, format!("无效的文件名: {name}")));
    }

    let data = tokio::fs::read(frames_dir.join(&name)).await.map_err(|_| not_found())?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], Bytes::from(data)))
}

/// 上传文件名只取最后一段，`..` 或空名视为无效
fn upload_file_name(file_name: Option<&str>) -> Option<String> {
    let path = Path::new(file_name?);
    path.file_name()?;
    Some(video_name(path))
}

/// 只允许不含路径分隔符的 jpg 文件名
fn is_frame_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\'])
        && name.ends_with(".jpg")
}
