use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::ActionResponse;
use crate::store::StoreError;
use crate::validation::FieldErrors;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorObject,
}

#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub code: String,
    pub message: String,
}

/// Errors for the JSON API routes.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str, String),
    Forbidden(&'static str, String),
    BadRequest(&'static str, String),
    NotFound(&'static str, String),
    Conflict(&'static str, String),
    Internal(String),
}

impl ApiError {
    pub fn not_signed_in() -> Self {
        ApiError::Unauthorized("UNAUTHORIZED", "Sign in required".into())
    }

    fn to_error_response(code: &str, message: &str) -> Json<ErrorResponse> {
        Json(ErrorResponse {
            error: ErrorObject {
                code: code.to_string(),
                message: message.to_string(),
            },
        })
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(code, msg) => {
                (StatusCode::UNAUTHORIZED, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Forbidden(code, msg) => {
                (StatusCode::FORBIDDEN, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::BadRequest(code, msg) => {
                (StatusCode::BAD_REQUEST, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::NotFound(code, msg) => {
                (StatusCode::NOT_FOUND, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Conflict(code, msg) => {
                (StatusCode::CONFLICT, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::to_error_response("INTERNAL", "An unexpected error occurred"),
                )
                    .into_response()
            }
        }
    }
}

/// Failures of the form actions (sign-up, sign-in, booking). Rendered as
/// `{success: false, error}` so the form can show the message inline.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// First failing validation rule.
    #[error("{0}")]
    Validation(String),

    #[error("User already exists with this email")]
    UserExists,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("This time slot is already booked")]
    SlotTaken,

    #[error("An unexpected error occurred")]
    Unexpected(#[source] anyhow::Error),
}

impl ActionError {
    pub fn status(&self) -> StatusCode {
        match self {
            ActionError::Validation(_) => StatusCode::BAD_REQUEST,
            ActionError::UserExists | ActionError::SlotTaken => StatusCode::CONFLICT,
            ActionError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ActionError::DoctorNotFound => StatusCode::NOT_FOUND,
            ActionError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FieldErrors> for ActionError {
    fn from(errors: FieldErrors) -> Self {
        ActionError::Validation(errors.first_message().to_string())
    }
}

impl From<StoreError> for ActionError {
    fn from(e: StoreError) -> Self {
        ActionError::Unexpected(e.into())
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        if let ActionError::Unexpected(cause) = &self {
            tracing::error!(error = ?cause, "action failed");
        }
        (self.status(), Json(ActionResponse::failure(self.to_string()))).into_response()
    }
}
