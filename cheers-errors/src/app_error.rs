use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum AppError {
    #[error("Invalid toast: {0}")]
    InvalidToast(String),

    #[error("Toast not found")]
    NotFound,

    #[error("Toast repository failed: {0}")]
    Repository(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FromStr for AppError {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix("Invalid toast: ") {
            Ok(AppError::InvalidToast(rest.to_string()))
        } else if let Some(rest) = s.strip_prefix("Toast repository failed: ") {
            Ok(AppError::Repository(rest.to_string()))
        } else if let Some(rest) = s.strip_prefix("Internal error: ") {
            Ok(AppError::Internal(rest.to_string()))
        } else if s.ends_with("not found") {
            Ok(AppError::NotFound)
        } else {
            Ok(AppError::Internal(s.to_string()))
        }
    }
}

impl AppError {
    pub fn user_message(&self) -> &str {
        match self {
            Self::InvalidToast(msg) => msg,
            Self::NotFound => "That toast no longer exists.",
            Self::Repository(_) => "Could not reach the toast collection. Try again.",
            Self::Internal(_) => "Something went wrong. Try again later.",
        }
    }
}

#[cfg(feature = "axum")]
mod axum_impl {
    use super::AppError;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;

    #[derive(serde::Serialize)]
    struct ErrorResponse {
        message: String,
    }

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = match &self {
                AppError::InvalidToast(_) => StatusCode::BAD_REQUEST,
                AppError::NotFound => StatusCode::NOT_FOUND,
                AppError::Repository(_) => StatusCode::BAD_GATEWAY,
                AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let message = self.to_string();
            (status, Json(ErrorResponse { message })).into_response()
        }
    }
}
