// API response utility functions module

use hyper::StatusCode;
use serde::Serialize;

use super::types::Envelope;
use crate::logger;

/// Transport-neutral response: a status and an envelope
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Envelope,
}

impl ApiResponse {
    /// Serialize the envelope; falls back to a fixed body if serialization fails
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.body).unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            r#"{"success":false,"message":"Internal server error"}"#.to_string()
        })
    }
}

/// Build a successful response carrying `data`
pub fn success<T: Serialize>(
    status: StatusCode,
    data: &T,
    message: Option<&str>,
) -> Result<ApiResponse, serde_json::Error> {
    Ok(ApiResponse {
        status,
        body: Envelope {
            success: true,
            data: Some(serde_json::to_value(data)?),
            message: message.map(ToString::to_string),
            ..Envelope::default()
        },
    })
}

/// Build an unsuccessful response with a message
pub fn failure(status: StatusCode, message: &str) -> ApiResponse {
    ApiResponse {
        status,
        body: Envelope {
            success: false,
            message: Some(message.to_string()),
            ..Envelope::default()
        },
    }
}

/// 404 for routes the router does not know
pub fn route_not_found(method: &str, path: &str) -> ApiResponse {
    let mut response = failure(StatusCode::NOT_FOUND, "Route not found");
    response.body.path = Some(path.to_string());
    response.body.method = Some(method.to_string());
    response
}

/// 200 acknowledgement for CORS preflight requests
pub fn preflight() -> ApiResponse {
    ApiResponse {
        status: StatusCode::OK,
        body: Envelope {
            success: true,
            message: Some("CORS preflight".to_string()),
            ..Envelope::default()
        },
    }
}
