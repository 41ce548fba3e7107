use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::logic::validation::FieldError;

/// Errors surfaced to HTTP callers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request validation failed with {} error(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    InvalidCrop(String),

    #[error("{0}")]
    MalformedBody(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{message}")]
    Runtime {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    /// Wrap a middleware failure. The cause is logged, never sent to the caller.
    pub fn runtime(source: anyhow::Error) -> Self {
        Self::Runtime {
            message: "Error!".to_string(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidCrop(_) | ApiError::MalformedBody(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Runtime { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// One entry of the error body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorItem {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub field_names: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub errors: Vec<ErrorItem>,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            errors: vec![ErrorItem {
                field_names: Vec::new(),
                message: message.to_string(),
            }],
        }
    }
}

impl From<&ApiError> for ErrorResponse {
    fn from(err: &ApiError) -> Self {
        match err {
            ApiError::Validation(errors) => Self {
                errors: errors
                    .iter()
                    .map(|e| ErrorItem {
                        field_names: e.field.iter().cloned().collect(),
                        message: e.message(),
                    })
                    .collect(),
            },
            other => Self::new(&other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Runtime { source, .. } => log::error!("Request failed: {:#}", source),
            ApiError::Validation(errors) => log::debug!("Request rejected: {:?}", errors),
            other => log::debug!("Request rejected: {}", other),
        }
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
