// ── API-to-domain type conversions ──
//
// Bridges raw `dbmon_api` payloads into `dbmon_core::model` types.

use dbmon_api::{BatchCreateResponse, Statistics, UploadFile};

use crate::model::{InstanceStats, UploadPayload, UploadResult};

impl From<Statistics> for InstanceStats {
    fn from(s: Statistics) -> Self {
        Self {
            total_instances: s.total_instances,
            active_instances: s.active_instances,
            inactive_instances: s.inactive_instances,
            deleted_instances: s.deleted_instances,
            db_types: s.db_types,
        }
    }
}

impl From<UploadPayload> for UploadFile {
    fn from(p: UploadPayload) -> Self {
        Self {
            file_name: p.file_name,
            content: p.content,
            mime: p.content_type,
        }
    }
}

/// Build the stored upload result; the message falls back to a summary
/// of the created count when the backend sends none.
pub(crate) fn upload_result(resp: BatchCreateResponse) -> UploadResult {
    let message = resp.message.unwrap_or_else(|| match resp.created_count {
        Some(n) => format!("{n} instance(s) created"),
        None => "batch create finished".to_owned(),
    });
    UploadResult {
        message,
        errors: resp.errors,
        created_count: resp.created_count,
    }
}
