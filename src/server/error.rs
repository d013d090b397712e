use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::{Error, StoreError};

/// API错误类型
pub struct AppError {
    pub status: StatusCode,
    pub error: anyhow::Error,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, error: anyhow::anyhow!(message.into()) }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, format!("Something went wrong: {}", self.error)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let error = err.into();
        Self { status: status_of(&error), error }
    }
}

/// 根据核心错误类型选择状态码
fn status_of(error: &anyhow::Error) -> StatusCode {
    match error.downcast_ref::<Error>() {
        Some(Error::InvalidParameter(_) | Error::Decode(_)) => StatusCode::BAD_REQUEST,
        Some(Error::SourceUnavailable { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        Some(Error::Store(StoreError::Conflict(_))) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let err = AppError::from(Error::InvalidParameter("k".into()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let err = AppError::from(Error::source_unavailable("a.mp4", "nope"));
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        let err = AppError::from(Error::Store(StoreError::Conflict("a_frame_0".into())));
        assert_eq!(err.status, StatusCode::CONFLICT);
        let err = AppError::from(std::io::Error::other("disk"));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
