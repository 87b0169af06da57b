// API error module
// Every handler failure funnels through ApiError and is turned into an envelope once

use hyper::StatusCode;

use super::response::{failure, ApiResponse};
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Invalid input; never reaches the store
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(u64),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to serialize response: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Store(_) | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert into the response envelope.
    ///
    /// Server-side failures carry a generic message plus the underlying error text.
    pub fn into_response(self) -> ApiResponse {
        let status = self.status();
        if status.is_server_error() {
            let mut response = failure(status, "Internal server error");
            response.body.error = Some(self.to_string());
            response
        } else {
            failure(status, &self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_keep_message() {
        let response = ApiError::BadRequest("name is required".into()).into_response();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(!response.body.success);
        assert_eq!(response.body.message.as_deref(), Some("name is required"));
        assert_eq!(response.body.error, None);
    }

    #[test]
    fn test_store_errors_become_500() {
        let err = ApiError::from(StoreError::Backend("table missing".into()));
        let response = err.into_response();
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body.message.as_deref(), Some("Internal server error"));
        assert_eq!(
            response.body.error.as_deref(),
            Some("storage backend error: table missing")
        );
    }

    #[test]
    fn test_payload_too_large_status() {
        let response = ApiError::PayloadTooLarge(10).into_response();
        assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            response.body.message.as_deref(),
            Some("Request body exceeds 10 bytes")
        );
    }
}
