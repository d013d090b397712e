mod api;
mod error;
mod state;
mod types;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use self::state::*;

#[derive(OpenApi)]
#[openapi(
    paths(api::upload_video_handler, api::find_similar_handler, api::frame_handler),
    components(schemas(
        types::UploadVideoForm,
        types::UploadVideoResponse,
        types::FindSimilarForm,
        types::FindSimilarResponse,
        types::SimilarFrame,
    ))
)]
pub struct ApiDoc;

/// 构建API服务器
pub fn create_app(state: Arc<AppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/upload-video", post(api::upload_video_handler))
        .route("/find-similar", post(api::find_similar_handler))
        .route("/frame/{name}", get(api::frame_handler))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(state)
}
