use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use confbook_core::ConfbookError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Confbook(#[from] ConfbookError),
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Internal Server Error: {0}")]
    InternalError(String),
}

/// JSON body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error_type: &'static str,
    pub message: String,
}

impl ApiError {
    fn classify(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Confbook(err) => match err.root() {
                ConfbookError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
                ConfbookError::UnknownTransition(_) => {
                    (StatusCode::BAD_REQUEST, "UnknownTransition")
                }
                ConfbookError::IllegalTransition { .. } => {
                    (StatusCode::BAD_REQUEST, "IllegalTransition")
                }
                ConfbookError::AlreadyReviewed(_) => (StatusCode::BAD_REQUEST, "AlreadyReviewed"),
                ConfbookError::CommentNotFound(_) | ConfbookError::ConferenceNotFound(_) => {
                    (StatusCode::NOT_FOUND, "NotFound")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
            },
            ApiError::Multipart(_) => (StatusCode::BAD_REQUEST, "MultipartError"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = self.classify();

        let message = match &self {
            // Internal details stay in the log
            _ if status_code.is_server_error() => {
                tracing::error!("{}", self);
                "Internal server error".to_string()
            }
            ApiError::Confbook(err) => err.root().to_string(),
            ApiError::Multipart(_) => {
                "Failed to read the submitted form. Please try again.".to_string()
            }
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => msg.clone(),
            ApiError::InternalError(msg) => msg.clone(),
        };

        let body = ErrorBody {
            success: false,
            error_type,
            message,
        };
        (status_code, Json(body)).into_response()
    }
}
