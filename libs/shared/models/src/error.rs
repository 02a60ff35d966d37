use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::patient::InvalidPatientId;
use crate::response::ApiResponse;
use crate::validation::ValidationErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{message}: {detail}")]
    InvalidRequest { message: String, detail: String },

    #[error("{0}")]
    MalformedId(#[from] InvalidPatientId),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidRequest { .. }
            | AppError::MalformedId(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, self);
        } else {
            tracing::warn!("Rejected request: {}: {}", status, self);
        }

        let body: ApiResponse<()> = match self {
            AppError::Validation(errors) => {
                let mut body = ApiResponse::failure("Validation failed", Some(errors.to_string()));
                body.errors = Some(errors.errors);
                body
            }
            AppError::InvalidRequest { message, detail } => ApiResponse::failure(message, Some(detail)),
            AppError::MalformedId(err) => ApiResponse::failure("Invalid patient id", Some(err.to_string())),
            AppError::NotFound(message) => ApiResponse::failure(message, None),
            AppError::Database(detail) | AppError::Internal(detail) => {
                ApiResponse::failure("Server error", Some(detail))
            }
        };

        (status, Json(body)).into_response()
    }
}
