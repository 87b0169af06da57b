// Item handlers module
// One function per route; each returns a response or an ApiError for the router to map

use hyper::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use super::error::ApiError;
use super::response::{success, ApiResponse};
use super::types::{CreateItemRequest, HealthData, MemoryUsage, UpdateItemRequest};
use crate::config::AppState;
use crate::model::{Item, ItemPatch};
use crate::store;

const ITEM_NOT_FOUND: &str = "Item not found";

/// GET /health
pub fn health(state: &AppState) -> Result<ApiResponse, ApiError> {
    let data = HealthData {
        status: "healthy",
        environment: state.config.app.environment.clone(),
        timestamp: state.clock.now(),
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs_f64(),
        memory: MemoryUsage::current(),
        backend: state.store.backend(),
        table: state.store.table_name().map(ToString::to_string),
    };
    Ok(success(StatusCode::OK, &data, Some("Service is healthy"))?)
}

/// GET /api/v1/items
pub async fn list_items(state: &AppState) -> Result<ApiResponse, ApiError> {
    let mut items = store::bounded(state.config.store_timeout(), state.store.list()).await?;
    // Stable sort: equal timestamps keep the store's order
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let count = items.len();
    let mut response = success(StatusCode::OK, &items, None)?;
    response.body.count = Some(count);
    Ok(response)
}

/// GET /api/v1/items/{id}
pub async fn get_item(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    let item = store::bounded(state.config.store_timeout(), state.store.get(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(ITEM_NOT_FOUND.to_string()))?;
    Ok(success(StatusCode::OK, &item, None)?)
}

/// POST /api/v1/items
pub async fn create_item(state: &AppState, body: Option<&[u8]>) -> Result<ApiResponse, ApiError> {
    let request: CreateItemRequest = parse_body(body)?;

    let name = request.name.filter(|n| !n.trim().is_empty());
    let description = request.description.filter(|d| !d.trim().is_empty());
    let (name, description) = match (name, description) {
        (Some(name), Some(description)) => (name, description),
        (None, Some(_)) => return Err(missing_fields("name")),
        (Some(_), None) => return Err(missing_fields("description")),
        (None, None) => return Err(missing_fields("name, description")),
    };

    let item = Item::new(state.store.next_id(), name, description, state.clock.now());
    store::bounded(state.config.store_timeout(), state.store.put(&item)).await?;

    info!(id = %item.id, "Item created");
    Ok(success(
        StatusCode::CREATED,
        &item,
        Some("Item created successfully"),
    )?)
}

/// PUT /api/v1/items/{id}
pub async fn update_item(
    state: &AppState,
    id: &str,
    body: Option<&[u8]>,
) -> Result<ApiResponse, ApiError> {
    let request: UpdateItemRequest = parse_body(body)?;
    let patch = ItemPatch {
        name: non_empty(request.name, "name")?,
        description: non_empty(request.description, "description")?,
    };
    if patch.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one of name or description is required".to_string(),
        ));
    }

    let item = store::bounded(
        state.config.store_timeout(),
        state.store.update(id, &patch, state.clock.now()),
    )
    .await?
    .ok_or_else(|| ApiError::NotFound(ITEM_NOT_FOUND.to_string()))?;

    info!(id = %item.id, "Item updated");
    Ok(success(
        StatusCode::OK,
        &item,
        Some("Item updated successfully"),
    )?)
}

/// DELETE /api/v1/items/{id}
pub async fn delete_item(state: &AppState, id: &str) -> Result<ApiResponse, ApiError> {
    let item = store::bounded(state.config.store_timeout(), state.store.delete(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(ITEM_NOT_FOUND.to_string()))?;

    info!(id = %item.id, "Item deleted");
    Ok(success(
        StatusCode::OK,
        &item,
        Some("Item deleted successfully"),
    )?)
}

/// Decode a JSON object body, rejecting empty or malformed input
fn parse_body<T: DeserializeOwned>(body: Option<&[u8]>) -> Result<T, ApiError> {
    let body = body
        .filter(|b| !b.iter().all(u8::is_ascii_whitespace))
        .ok_or_else(|| ApiError::BadRequest("Request body is required".to_string()))?;

    serde_json::from_slice(body).map_err(|e| {
        debug!("Rejected request body: {e}");
        ApiError::BadRequest(format!("Invalid request body: {e}"))
    })
}

fn missing_fields(fields: &str) -> ApiError {
    ApiError::BadRequest(format!("Missing required fields: {fields}"))
}

/// Supplied update fields must not be blank
fn non_empty(value: Option<String>, field: &str) -> Result<Option<String>, ApiError> {
    match value {
        Some(v) if v.trim().is_empty() => {
            Err(ApiError::BadRequest(format!("{field} must not be empty")))
        }
        other => Ok(other),
    }
}
