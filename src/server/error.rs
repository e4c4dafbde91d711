//! HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::folders::FolderError;

/// Error returned by HTTP handlers, rendered as `{code, message, details}`.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Request body or parameters failed validation.
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Unexpected failure. The message is logged and returned as details.
    #[error("{0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl ApiError {
    /// Validation error without details.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorBody {
        match self {
            Self::Validation { message, details } => ErrorBody {
                code: "VALIDATION_ERROR",
                message,
                details,
            },
            Self::Internal(details) => ErrorBody {
                code: "INTERNAL_SERVER_ERROR",
                message: "Internal server error".to_string(),
                details: Some(serde_json::Value::String(details)),
            },
            Self::BadRequest(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Conflict(message) => ErrorBody {
                code: "HTTP_ERROR",
                message,
                details: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

impl From<FolderError> for ApiError {
    fn from(err: FolderError) -> Self {
        let message = err.to_string();
        match err {
            FolderError::Validation(_) => Self::validation(message),
            FolderError::PathNotExists(_)
            | FolderError::PathNotDirectory(_)
            | FolderError::PathDenied(_)
            | FolderError::InvalidId(_)
            | FolderError::PathRequired
            | FolderError::NotAFile(_)
            | FolderError::NotMarkdown(_) => Self::BadRequest(message),
            FolderError::PathAlreadyRegistered(_) => Self::Conflict(message),
            FolderError::NotFound(_)
            | FolderError::FolderPathMissing(_)
            | FolderError::FileNotFound(_) => Self::NotFound(message),
            FolderError::AccessDenied(_) => Self::Forbidden(message),
            FolderError::Read { .. } | FolderError::Store(_) => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_folder_error_status_mapping() {
        let cases = [
            (FolderError::Validation("name is required".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (FolderError::PathNotExists(PathBuf::from("/x")), StatusCode::BAD_REQUEST),
            (FolderError::PathDenied(PathBuf::from("/")), StatusCode::BAD_REQUEST),
            (FolderError::PathAlreadyRegistered("/x".into()), StatusCode::CONFLICT),
            (FolderError::InvalidId(0), StatusCode::BAD_REQUEST),
            (FolderError::NotFound(3), StatusCode::NOT_FOUND),
            (FolderError::FileNotFound(PathBuf::from("/x.md")), StatusCode::NOT_FOUND),
            (FolderError::AccessDenied(PathBuf::from("/x.md")), StatusCode::FORBIDDEN),
            (FolderError::NotMarkdown(PathBuf::from("/x.txt")), StatusCode::BAD_REQUEST),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_body_codes() {
        let body = ApiError::validation("bad").body();
        assert_eq!(body.code, "VALIDATION_ERROR");

        let body = ApiError::NotFound("folder not found".into()).body();
        assert_eq!(body.code, "HTTP_ERROR");
        assert_eq!(body.message, "folder not found");
        assert!(body.details.is_none());

        let body = ApiError::Internal("disk on fire".into()).body();
        assert_eq!(body.code, "INTERNAL_SERVER_ERROR");
        assert_eq!(body.details, Some(serde_json::json!("disk on fire")));
    }
}
