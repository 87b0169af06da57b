//! AWS Lambda adapter
//!
//! Translates API Gateway events into [`ApiRequest`]s and router output back
//! into Lambda HTTP responses, with the same CORS headers as the HTTP server.

use hyper::body::Bytes;
use lambda_http::{Body, Error, Request, RequestExt, Response};

use crate::api::{self, ApiRequest, ApiResponse};
use crate::config::{AppState, CorsConfig};
use crate::http::cors_headers;

/// Build the router request from an API Gateway event
pub fn to_api_request(event: &Request) -> ApiRequest {
    // raw_http_path has no stage prefix; it is empty outside API Gateway
    let raw_path = event.raw_http_path();
    let path = if raw_path.is_empty() {
        event.uri().path().to_string()
    } else {
        raw_path.to_string()
    };
    let mut req = ApiRequest::new(event.method().clone(), path);

    let body: &[u8] = event.body();
    if !body.is_empty() {
        req.body = Some(Bytes::copy_from_slice(body));
    }
    if let Some(id) = event.path_parameters_ref().and_then(|params| params.first("id")) {
        req.path_id = Some(id.to_string());
    }
    req
}

/// Build the Lambda response for a router result
pub fn to_lambda_response(api: &ApiResponse, cors: &CorsConfig) -> Result<Response<Body>, Error> {
    let mut builder = Response::builder().status(api.status.as_u16());
    for (name, value) in cors_headers(cors) {
        builder = builder.header(name, value);
    }
    Ok(builder.body(Body::from(api.to_json()))?)
}

/// Lambda entry point: one invocation per HTTP request
pub async fn handle_event(event: Request, state: &AppState) -> Result<Response<Body>, Error> {
    let response = api::dispatch(to_api_request(&event), state).await;
    to_lambda_response(&response, &state.config.http.cors)
}
