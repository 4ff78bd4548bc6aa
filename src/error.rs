use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::auth::dto::MessageResponse;

/// Message returned for both an unknown email and a wrong password.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("crypto failure: {0}")]
    Crypto(String),
    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("invalid credentials")]
    InvalidCredentials,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Crypto(_) | AuthError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// An [`AuthError`] bound to the generic message the failing operation shows
/// for internal errors.
#[derive(Debug)]
pub struct ApiError {
    pub error: AuthError,
    pub internal_message: &'static str,
}

impl ApiError {
    pub fn with(internal_message: &'static str) -> impl FnOnce(AuthError) -> Self {
        move |error| Self {
            error,
            internal_message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status();
        let message = match &self.error {
            AuthError::Validation(msg) => msg.clone(),
            AuthError::InvalidCredentials => INVALID_CREDENTIALS.to_string(),
            AuthError::Crypto(_) | AuthError::Persistence(_) => {
                tracing::error!(error = ?self.error, "request failed");
                self.internal_message.to_string()
            }
        };
        (status, Json(MessageResponse { message })).into_response()
    }
}
