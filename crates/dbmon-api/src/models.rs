// Backend response types
//
// Every JSON endpoint wraps its payload in the `ApiEnvelope<T>` shape.
// Fields use `#[serde(default)]` liberally because older backend releases
// omit keys instead of sending nulls.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

// ── Response Envelope ────────────────────────────────────────────────

/// Standard backend response envelope.
///
/// ```json
/// { "success": true, "message": "optional", "data": { ... } }
/// ```
///
/// `success` is optional: read-only endpoints frequently leave it out.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Best human-readable message carried by the envelope.
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| fallback.to_owned())
    }
}

// ── Statistics ───────────────────────────────────────────────────────

/// Aggregate counters from `instances/api/statistics`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    pub total_instances: u64,
    pub active_instances: u64,
    pub inactive_instances: u64,
    pub deleted_instances: u64,
    /// Instance counts keyed by database type (`mysql`, `postgresql`, ...).
    pub db_types: BTreeMap<String, u64>,
}

// ── Instance list ────────────────────────────────────────────────────

/// Rows from `instances/api/instances`.
///
/// Rows stay as raw JSON: the grid endpoint and the export endpoint
/// disagree on column sets, and the store only needs `id` and `name`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceList {
    pub items: Vec<serde_json::Value>,
    pub total: Option<u64>,
}

/// The list endpoint returns either a bare array or a paged object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum InstanceListData {
    Bare(Vec<serde_json::Value>),
    Paged {
        #[serde(default)]
        items: Vec<serde_json::Value>,
        #[serde(default)]
        total: Option<u64>,
    },
}

impl From<InstanceListData> for InstanceList {
    fn from(data: InstanceListData) -> Self {
        match data {
            InstanceListData::Paged { items, total } => Self { items, total },
            InstanceListData::Bare(items) => {
                let total = u64::try_from(items.len()).ok();
                Self { items, total }
            }
        }
    }
}

// ── Mutating endpoints ───────────────────────────────────────────────

/// Outcome of a sync / delete call.
///
/// `success` is passed through untouched; deciding what `Some(false)`
/// means is the caller's business.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Outcome of a bulk instance import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchCreateResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    /// Per-row failures ("row 4: duplicate name").
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub created_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct BatchCreateData {
    pub errors: Vec<String>,
    pub created_count: Option<u64>,
}

// ── Uploads ──────────────────────────────────────────────────────────

/// A file handed to a multipart upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub content: Bytes,
    pub mime: Option<String>,
}
