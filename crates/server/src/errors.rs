use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

use crate::views;

/// Errors that end a request with an HTML error page. Backend failures never
/// get here; views render those as notices.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let status = match &self {
            PageError::NotFound(_) => StatusCode::NOT_FOUND,
            PageError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        let msg = self.to_string();
        warn!(status = status.as_u16(), error = %msg, "request rejected");
        (status, Html(views::error_page(status, &msg))).into_response()
    }
}
