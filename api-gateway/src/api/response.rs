//! Standardized API response format
//!
//! Every successful body is `{"success": true, "message"?: ..., ...payload}`,
//! the payload's fields flattened next to the status flag.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Success envelope around a payload
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Always true
    pub success: bool,
    /// Optional human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The response payload
    #[serde(flatten)]
    pub payload: T,
    #[serde(skip)]
    status: StatusCode,
}

/// Payload for responses that only carry a message
#[derive(Debug, Serialize)]
pub struct Empty {}

impl<T> ApiResponse<T> {
    /// Create a 200 response with just a payload
    pub fn new(payload: T) -> Self {
        Self {
            success: true,
            message: None,
            payload,
            status: StatusCode::OK,
        }
    }

    /// Create a 201 response for a newly created resource
    pub fn created(payload: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::new(payload)
        }
    }

    /// Attach a message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<Empty> {
    /// Create a 200 response carrying only a message
    pub fn message(message: impl Into<String>) -> Self {
        Self::new(Empty {}).with_message(message)
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Payload {
        accounts: Vec<u32>,
    }

    #[test]
    fn payload_is_flattened_next_to_success() {
        let body = serde_json::to_value(ApiResponse::new(Payload { accounts: vec![1, 2] })).unwrap();
        assert_eq!(body, json!({"success": true, "accounts": [1, 2]}));
    }

    #[test]
    fn message_only_response() {
        let response = ApiResponse::message("Account deleted");
        assert_eq!(response.status, StatusCode::OK);
        let body = serde_json::to_value(response).unwrap();
        assert_eq!(body, json!({"success": true, "message": "Account deleted"}));
    }

    #[test]
    fn created_sets_status() {
        let response = ApiResponse::created(Payload { accounts: vec![] });
        assert_eq!(response.status, StatusCode::CREATED);
    }
}
