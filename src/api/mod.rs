// API module entry
// Routes item requests and wraps every outcome in the response envelope

mod error;
mod handlers;
mod response;
mod types;


use hyper::body::Bytes;
use hyper::Method;

use crate::config::AppState;
use crate::logger;

// Re-export public types
pub use error::ApiError;
pub use response::*;
pub use types::*;

pub const HEALTH_PATH: &str = "/health";
pub const ITEMS_PATH: &str = "/api/v1/items";

/// Request as seen by the router, independent of the hosting transport
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Bytes>,
    /// `{id}` path parameter when the host has already extracted it
    pub path_id: Option<String>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            path_id: None,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn with_path_id(mut self, id: impl Into<String>) -> Self {
        self.path_id = Some(id.into());
        self
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Health,
    ListItems,
    CreateItem,
    GetItem(&'a str),
    UpdateItem(&'a str),
    DeleteItem(&'a str),
    Preflight,
    NotFound,
}

/// Match method and path against the routing table
fn resolve<'a>(method: &Method, path: &'a str, path_id: Option<&'a str>) -> Route<'a> {
    if *method == Method::OPTIONS {
        return Route::Preflight;
    }

    match (method, path) {
        (&Method::GET, HEALTH_PATH) => return Route::Health,
        (&Method::GET, ITEMS_PATH) => return Route::ListItems,
        (&Method::POST, ITEMS_PATH) => return Route::CreateItem,
        _ => {}
    }

    // /api/v1/items/{id}: exactly one non-empty trailing segment
    let Some(segment) = path
        .strip_prefix(ITEMS_PATH)
        .and_then(|rest| rest.strip_prefix('/'))
        .filter(|s| !s.is_empty() && !s.contains('/'))
    else {
        return Route::NotFound;
    };
    let id = path_id.filter(|id| !id.is_empty()).unwrap_or(segment);

    match *method {
        Method::GET => Route::GetItem(id),
        Method::PUT => Route::UpdateItem(id),
        Method::DELETE => Route::DeleteItem(id),
        _ => Route::NotFound,
    }
}

/// Dispatch a request to its handler.
///
/// This is the single recovery boundary: handler errors become envelopes
/// here and nowhere else.
pub async fn dispatch(req: ApiRequest, state: &AppState) -> ApiResponse {
    let ApiRequest {
        method,
        path,
        body,
        path_id,
    } = req;
    let body = body.as_deref();

    let result = match resolve(&method, &path, path_id.as_deref()) {
        Route::Health => handlers::health(state),
        Route::ListItems => handlers::list_items(state).await,
        Route::CreateItem => handlers::create_item(state, body).await,
        Route::GetItem(id) => handlers::get_item(state, id).await,
        Route::UpdateItem(id) => handlers::update_item(state, id, body).await,
        Route::DeleteItem(id) => handlers::delete_item(state, id).await,
        Route::Preflight => Ok(preflight()),
        Route::NotFound => Ok(route_not_found(method.as_str(), &path)),
    };

    let response = result.unwrap_or_else(|e| {
        if e.status().is_server_error() {
            logger::log_error(&format!("{method} {path} failed: {e}"));
        }
        e.into_response()
    });

    logger::log_api_request(method.as_str(), &path, response.status.as_u16());
    response
}
