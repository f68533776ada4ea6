//! API error type and its JSON rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::store::{RepoError, UniqueField};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Conflict(String),

    #[error("{message}: {source}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AppError {
    pub fn internal(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Like `From<RepoError>`, but a database failure is reported as `action`
    /// ("Error creating sitcom", ...).
    pub fn from_repo(err: RepoError, action: &str) -> Self {
        match err {
            RepoError::Database(e) => AppError::internal(action, e),
            other => other.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            AppError::Internal { message, source } => ErrorBody {
                message: message.clone(),
                error: Some(source.to_string()),
            },
            AppError::MethodNotAllowed => ErrorBody {
                message: "Method not allowed".into(),
                error: None,
            },
            other => ErrorBody {
                message: other.to_string(),
                error: None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal { message, source } = &self {
            error!(error = %source, "{message}");
        }
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(field) => AppError::Conflict(conflict_message(field).into()),
            RepoError::MissingReference(entity) => AppError::NotFound(format!("{entity} not found")),
            RepoError::Database(e) => AppError::internal("Unexpected storage failure", e),
        }
    }
}

fn conflict_message(field: UniqueField) -> &'static str {
    match field {
        UniqueField::Username => "Username already exists",
        UniqueField::Email => "Email already registered",
        UniqueField::SitcomTitle => "Sitcom with this title already exists",
        UniqueField::ReviewAuthorSitcom => "You have already submitted a review for this sitcom",
    }
}
