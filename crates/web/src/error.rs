use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use storage::{dto::common::Envelope, error::StorageError};
use validator::ValidationErrors;

use crate::media::{PosterError, UploadError};

/// Every failure a request can end in. Each variant maps to exactly one HTTP
/// status, and the envelope always repeats that status.
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Validation(ValidationErrors),
    Decode(String),
    Poster(PosterError),
    MissingCredential,
    InvalidCredential,
    Upload(UploadError),
    Timeout(&'static str),
    NotFound,
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::Decode(msg) => write!(f, "Error parsing payload: {}", msg),
            Self::Poster(e) => write!(f, "Invalid poster: {}", e),
            Self::MissingCredential => write!(f, "Missing user key"),
            Self::InvalidCredential => write!(f, "Unknown user key"),
            Self::Upload(e) => write!(f, "Upload error: {}", e),
            Self::Timeout(operation) => write!(f, "Deadline exceeded during {}", operation),
            Self::NotFound => write!(f, "Resource not found"),
        }
    }
}

impl std::error::Error for WebError {}

impl WebError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Storage(StorageError::NotFound) => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::Poster(_) => StatusCode::BAD_REQUEST,
            Self::MissingCredential => StatusCode::FORBIDDEN,
            Self::InvalidCredential => StatusCode::FORBIDDEN,
            Self::Upload(_) => StatusCode::BAD_GATEWAY,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let (message, details) = match &self {
            Self::Storage(StorageError::NotFound) | Self::NotFound => {
                ("Resource not found".to_string(), None)
            }
            Self::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                ("An internal error occurred".to_string(), None)
            }
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                ("Validation failed".to_string(), Some(json!(field_errors)))
            }
            Self::Decode(msg) => ("Error parsing payload".to_string(), Some(json!(msg))),
            Self::Poster(e) => (format!("Invalid poster: {}", e), None),
            Self::MissingCredential | Self::InvalidCredential => {
                ("Please login first".to_string(), None)
            }
            Self::Upload(e) => {
                tracing::error!("Upload error: {:?}", e);
                ("Poster upload failed".to_string(), None)
            }
            Self::Timeout(operation) => {
                tracing::error!(operation, "Request deadline exceeded");
                ("The request took too long".to_string(), None)
            }
        };

        let body = Envelope::new(status_code.as_u16(), message, details);

        (status_code, Json(body)).into_response()
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

impl From<PosterError> for WebError {
    fn from(error: PosterError) -> Self {
        Self::Poster(error)
    }
}

impl From<UploadError> for WebError {
    fn from(error: UploadError) -> Self {
        Self::Upload(error)
    }
}

pub type WebResult<T> = Result<T, WebError>;
