use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use heartdraw_types::api::{ErrorBody, FieldError};

/// Every way a request can fail. Rendered as `{"message": ...}` with the
/// matching status; validation failures also carry `errors`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{message}")]
    Validation {
        message: &'static str,
        errors: Vec<FieldError>,
    },
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("Forbidden")]
    Forbidden,
    #[error("{0}")]
    Conflict(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: &'static str, errors: Vec<FieldError>) -> Self {
        Self::Validation { message, errors }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Validation { .. } | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Internal(e) => {
                error!("Unhandled error: {:#}", e);
                ErrorBody {
                    message: "Internal Server Error".into(),
                    errors: vec![],
                }
            }
            Self::Validation { message, errors } => ErrorBody {
                message: message.into(),
                errors,
            },
            other => ErrorBody {
                message: other.to_string(),
                errors: vec![],
            },
        };

        (status, Json(body)).into_response()
    }
}
