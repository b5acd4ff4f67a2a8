//! Error handling for the API gateway

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::Error;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// API error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always false
    pub success: bool,
    /// Human-readable error message
    pub message: String,
    /// Error code (string identifier for the error type)
    pub code: String,
    /// Request ID for tracing
    pub request_id: String,
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Common(#[from] Error),
}

impl ApiError {
    /// HTTP status and error code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            ApiError::Common(e) => match e {
                // Client errors (4xx)
                Error::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
                Error::InvalidState(_) => (StatusCode::BAD_REQUEST, "invalid_state"),
                Error::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
                Error::AccountNotFound(_) => (StatusCode::NOT_FOUND, "account_not_found"),
                Error::OrderNotFound(_) => (StatusCode::NOT_FOUND, "order_not_found"),

                Error::UpstreamUnavailable(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),

                // Server errors (5xx)
                Error::ConfigurationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
                Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
                Error::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
                Error::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "migration_error"),
                Error::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error"),
                Error::DecimalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "decimal_error"),
            },
        }
    }

    /// Message safe to show to the caller. Server-side details stay in the log.
    fn public_message(&self, status: StatusCode) -> String {
        match self {
            _ if status.is_server_error() && status != StatusCode::BAD_GATEWAY => {
                "Internal server error".to_string()
            },
            ApiError::Common(Error::UpstreamUnavailable(_)) => {
                "Price quote service is unavailable, try again later".to_string()
            },
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Generate a request ID for tracking errors
        let request_id = Uuid::new_v4().to_string();
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!("API Error [{}]: {:?}", request_id, &self);
        } else {
            tracing::debug!("API Error [{}]: {}", request_id, &self);
        }

        let error_response = ErrorResponse {
            success: false,
            message: self.public_message(status),
            code: code.to_string(),
            request_id,
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}
