// Error types for the remote API, local validation, persistence and the HTTP host

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

// Failures of the remote listing API. Display output is the human-readable
// message that ends up in ListingState::error_message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Network failure: {0}")]
    NetworkFailure(String),
    #[error("Server failure: status {status} after {attempts} attempts")]
    ServerFailure { status: u16, attempts: u32 },
    #[error("Request rejected with status {status}: {message}")]
    ClientFailure { status: u16, message: String },
    #[error("Invalid response from listing API: {0}")]
    InvalidResponse(String),
    /// The request URL could not be built; nothing was sent.
    #[error("Invalid request to listing API: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// Network-level failures and 5xx responses are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::NetworkFailure(_) | ApiError::ServerFailure { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::ClientFailure { status: 404, .. })
    }
}

// Local form input problems; these never reach the network layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("From km must be less than To km")]
    MileageRange { min: u64, max: u64 },
    #[error("{field} must be a non-negative whole number")]
    InvalidNumber { field: &'static str },
    #[error("Unknown price bucket: {0}")]
    UnknownPriceBucket(String),
    #[error("{message}")]
    Field {
        field: &'static str,
        message: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage entry is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

// Errors returned by the HTTP host handlers
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    Validation(Vec<ValidationError>),
    Upstream(ApiError),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(error)
    }
}

impl From<ApiError> for AppError {
    fn from(error: ApiError) -> Self {
        if error.is_not_found() {
            AppError::NotFound(error.to_string())
        } else {
            AppError::Upstream(error)
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        AppError::Validation(vec![error])
    }
}

impl From<StorageError> for AppError {
    fn from(error: StorageError) -> Self {
        AppError::Internal(anyhow::Error::new(error))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Internal(e) => {
                tracing::error!("Internal server error: {:?}", e);
                // Don't expose internal details to the client
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::NotFound(message) => {
                tracing::debug!("Not found: {}", message);
                (StatusCode::NOT_FOUND, json!({ "error": message }))
            }
            AppError::Validation(errors) => {
                let details: Vec<_> = errors
                    .iter()
                    .map(|e| match e {
                        ValidationError::Field { field, message } => {
                            json!({ "field": field, "message": message })
                        }
                        other => json!({ "field": null, "message": other.to_string() }),
                    })
                    .collect();
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    json!({ "error": "Validation failed", "details": details }),
                )
            }
            AppError::Upstream(e) => {
                tracing::warn!("Listing API failure: {}", e);
                (StatusCode::BAD_GATEWAY, json!({ "error": e.to_string() }))
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_and_server_failures_are_retryable() {
        assert!(ApiError::NetworkFailure("reset".into()).is_retryable());
        assert!(ApiError::ServerFailure { status: 503, attempts: 1 }.is_retryable());
        assert!(!ApiError::ClientFailure { status: 404, message: "gone".into() }.is_retryable());
        assert!(!ApiError::InvalidResponse("eof".into()).is_retryable());
        assert!(!ApiError::InvalidRequest("bad path".into()).is_retryable());
    }

    #[test]
    fn not_found_maps_to_404_response() {
        let err: AppError = ApiError::ClientFailure { status: 404, message: "Not Found".into() }.into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn server_failure_message_is_human_readable() {
        let err = ApiError::ServerFailure { status: 503, attempts: 4 };
        assert_eq!(err.to_string(), "Server failure: status 503 after 4 attempts");
    }
}
