// ── Bulk-create upload ──

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// File-like content for the bulk-create endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPayload {
    pub file_name: String,
    pub content: Bytes,
    pub content_type: Option<String>,
}

impl UploadPayload {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content: content.into(),
            content_type: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Reject payloads the backend could never accept.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.file_name.trim().is_empty() {
            return Err(StoreError::validation("upload is missing a file name"));
        }
        if self.content.is_empty() {
            return Err(StoreError::validation("upload file is empty"));
        }
        Ok(())
    }
}

/// Last bulk-create result kept in state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub message: String,
    pub errors: Vec<String>,
    pub created_count: Option<u64>,
}
