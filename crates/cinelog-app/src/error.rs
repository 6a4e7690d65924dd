use std::fmt::{Display, Formatter};

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde::Serialize;
use tracing::{debug, error};

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

/// One violated rule of one input field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Violation {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(Violation {
            field: field.into(),
            message: message.into(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|v| v.field == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }
}

impl Display for Violations {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", v.field, v.message)?;
        }
        Ok(())
    }
}

/// Body of every error response
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<Vec<Violation>>,
}

impl ErrorResponse {
    fn message(error: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
            violations: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InvalidInput(Violations),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Store error: {0}")]
    Gateway(#[from] cinelog_dal::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::InvalidInput(violations) => {
                debug!("Input rejected: {violations}");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: "Invalid input".to_string(),
                        violations: Some(violations.0),
                    },
                )
            }
            ApiError::InvalidRequest(msg) => {
                debug!("Request rejected: {msg}");
                (StatusCode::BAD_REQUEST, ErrorResponse::message(msg))
            }
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::message(format!("{what} not found")),
            ),
            ApiError::Gateway(cinelog_dal::Error::RecordNotFound(what)) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::message(format!("{what} not found")),
            ),
            ApiError::Gateway(e) => {
                error!("Store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::message("Internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
