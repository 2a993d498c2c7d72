//! Mapping from core failures to HTTP responses.
//!
//! Clients get a short fixed message per failure kind; the full error is logged here.

use api_shared::ErrorRes;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use testgen_core::{CoreError, GenerationError};

pub const NO_FILE_UPLOADED: &str = "No file uploaded";
pub const UNSUPPORTED_FILE_TYPE: &str = "Unsupported file type. Please upload a .docx file";
pub const GENERATOR_START_FAILED: &str = "Failed to start test case generator";
pub const GENERATION_FAILED: &str = "Failed to generate test cases";
pub const GENERATION_OUTPUT_INVALID: &str = "Failed to parse generated test cases";
pub const GENERATION_TIMED_OUT: &str = "Test case generation timed out";

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorRes::new(self.message))).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let (status, message) = match &err {
            CoreError::MissingFile => (StatusCode::BAD_REQUEST, NO_FILE_UPLOADED.to_string()),
            CoreError::UnsupportedFileType(_) => {
                (StatusCode::BAD_REQUEST, UNSUPPORTED_FILE_TYPE.to_string())
            }
            CoreError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CoreError::Generation(GenerationError::Spawn { .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERATOR_START_FAILED.to_string(),
            ),
            CoreError::Generation(
                GenerationError::NonZeroExit { .. } | GenerationError::Wait(_),
            ) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERATION_FAILED.to_string(),
            ),
            CoreError::Generation(GenerationError::MalformedOutput { .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERATION_OUTPUT_INVALID.to_string(),
            ),
            CoreError::Generation(GenerationError::TimedOut { .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                GENERATION_TIMED_OUT.to_string(),
            ),
            CoreError::Files(_) | CoreError::InvalidConfig(_) | CoreError::AdmissionClosed => {
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %err, detail = ?err, "generation request failed");
        } else {
            tracing::warn!(error = %err, "generation request rejected");
        }

        Self::new(status, message)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        tracing::warn!(%status, error = %err.body_text(), "unreadable multipart body");
        Self::new(status, err.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        tracing::warn!(error = %rejection.body_text(), "request is not a multipart form");
        Self::new(StatusCode::BAD_REQUEST, NO_FILE_UPLOADED)
    }
}
