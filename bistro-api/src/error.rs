use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bistro_core::{CoreError, SubmissionError};
use bistro_order::{CartError, CheckoutError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("{0}")]
    Upstream(String),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    pub fn session_not_found(id: uuid::Uuid) -> Self {
        AppError::NotFound(format!("Session not found: {}", id))
    }
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::DishNotFound(_) | CartError::RestaurantNotFound(_) => AppError::NotFound(err.to_string()),
            CartError::NoPendingConflict => AppError::Conflict(err.to_string()),
            _ => AppError::Validation(err.to_string()),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::WrongStep { .. }
            | CheckoutError::Finished(_)
            | CheckoutError::NotStarted
            | CheckoutError::AwaitingSubmit => AppError::Conflict(err.to_string()),
            CheckoutError::StepIncomplete(_)
            | CheckoutError::DeliveryUnavailable(_)
            | CheckoutError::AmountOverflow => {
                AppError::Unprocessable(err.to_string())
            }
            CheckoutError::InvalidTip(_) | CheckoutError::EmptyCart => AppError::Validation(err.to_string()),
            CheckoutError::Submission(SubmissionError::Validation(msg)) => AppError::Unprocessable(msg),
            CheckoutError::Submission(SubmissionError::Unavailable(msg)) => AppError::Upstream(msg),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DishNotFound(_) | CoreError::RestaurantNotFound(_) => AppError::NotFound(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                (StatusCode::BAD_GATEWAY, msg)
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
