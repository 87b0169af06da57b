//! HTTP response building module
//!
//! Every response leaves through here so the CORS headers are never missed.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::api::ApiResponse;
use crate::config::CorsConfig;

/// Headers attached to every API response, errors included
pub fn cors_headers(cors: &CorsConfig) -> [(&'static str, &str); 4] {
    [
        ("Access-Control-Allow-Origin", cors.allow_origin.as_str()),
        ("Access-Control-Allow-Headers", cors.allow_headers.as_str()),
        ("Access-Control-Allow-Methods", cors.allow_methods.as_str()),
        ("Content-Type", "application/json"),
    ]
}

/// Build the hyper response for a router result
pub fn build_api_response(api: &ApiResponse, cors: &CorsConfig) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(api.status);
    for (name, value) in cors_headers(cors) {
        builder = builder.header(name, value);
    }

    builder
        .body(Full::new(Bytes::from(api.to_json())))
        .unwrap_or_else(|e| {
            log_build_error(api.status.as_str(), &e);
            let mut fallback = Response::new(Full::new(Bytes::from(
                r#"{"success":false,"message":"Internal server error"}"#,
            )));
            *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{failure, route_not_found};
    use hyper::StatusCode;

    #[test]
    fn test_cors_headers_on_success_and_error() {
        let cors = CorsConfig::default();
        for api in [
            route_not_found("GET", "/nope"),
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
            crate::api::preflight(),
        ] {
            let response = build_api_response(&api, &cors);
            assert_eq!(response.status(), api.status);
            let headers = response.headers();
            assert_eq!(headers["Access-Control-Allow-Origin"], "*");
            assert_eq!(headers["Access-Control-Allow-Methods"], "GET,POST,PUT,DELETE,OPTIONS");
            assert_eq!(headers["Content-Type"], "application/json");
            assert!(headers.contains_key("Access-Control-Allow-Headers"));
        }
    }

    #[test]
    fn test_custom_origin() {
        let cors = CorsConfig {
            allow_origin: "https://dashboard.example.com".to_string(),
            ..CorsConfig::default()
        };
        let response = build_api_response(&crate::api::preflight(), &cors);
        assert_eq!(
            response.headers()["Access-Control-Allow-Origin"],
            "https://dashboard.example.com"
        );
    }
}
