// API type definitions
// Response envelope and request bodies for the items API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Response envelope shared by every endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Number of items, list endpoint only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Echoed request path, unknown routes only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Echoed request method, unknown routes only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// POST /api/v1/items body
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// PUT /api/v1/items/{id} body
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateItemRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// GET /health payload
#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: &'static str,
    pub environment: String,
    pub timestamp: DateTime<Utc>,
    pub version: &'static str,
    /// Seconds since process start
    pub uptime: f64,
    pub memory: Option<MemoryUsage>,
    pub backend: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

/// Process memory in bytes
#[derive(Debug, Serialize)]
pub struct MemoryUsage {
    pub rss: usize,
    #[serde(rename = "virtual")]
    pub virtual_mem: usize,
}

impl MemoryUsage {
    pub fn current() -> Option<Self> {
        memory_stats::memory_stats().map(|stats| Self {
            rss: stats.physical_mem,
            virtual_mem: stats.virtual_mem,
        })
    }
}
