use crate::{forms::FieldErrors, store::StoreError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("User already exists")]
    UserAlreadyExists,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    /// Anonymous request to a page that needs a user; `next` is where to go
    /// back to after logging in.
    #[error("Login required")]
    LoginRequired { next: String },
    #[error("Not Found")]
    NotFound,
    #[error("Request timed out")]
    Timeout,
    #[error("Validation failed")]
    ValidationError(FieldErrors),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmailTaken(_) | StoreError::UsernameTaken(_) => ApiError::UserAlreadyExists,
            StoreError::SlugTaken(_) => {
                let mut fields = FieldErrors::default();
                fields.add("slug", err.to_string());
                ApiError::ValidationError(fields)
            }
        }
    }
}

/// Where anonymous visitors are sent, with the page they asked for kept in
/// `next`. Slashes are left readable.
pub fn login_url(next: &str) -> String {
    format!(
        "/auth/login/?next={}",
        urlencoding::encode(next).replace("%2F", "/")
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::UserAlreadyExists => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::LoginRequired { next } => {
                return Redirect::to(&login_url(next)).into_response();
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::ValidationError(fields) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                      "error": "Validation failed",
                      "fields": fields
                    })),
                )
                    .into_response();
            }
            ApiError::InternalError(msg) => {
                error!("Internal error: {}", msg);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({
                      "error": "Internal server error"
                    })),
                )
                    .into_response();
            }
        };

        (
            status,
            Json(serde_json::json!({
              "error": self.to_string()
            })),
        )
            .into_response()
    }
}
