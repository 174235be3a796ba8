// Backend HTTP client
//
// Wraps `reqwest::Client` with URL construction and `{success, message,
// data}` envelope unwrapping. Read endpoints return unwrapped payloads;
// mutating endpoints hand back the outcome so the caller can decide what
// an explicit `success: false` means.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{
    ActionResponse, ApiEnvelope, BatchCreateData, BatchCreateResponse, InstanceList,
    InstanceListData, Statistics, UploadFile,
};
use crate::transport::TransportConfig;

const STATISTICS_PATH: &str = "instances/api/statistics";
const INSTANCES_PATH: &str = "instances/api/instances";
const SYNC_ALL_PATH: &str = "account_sync/api/sync-all";
const BATCH_DELETE_PATH: &str = "instances/api/batch-delete";
const BATCH_CREATE_PATH: &str = "instances/api/batch-create";

/// Raw HTTP client for the monitoring backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the application root (e.g. `https://dbmon.internal`);
    /// endpoint paths are appended to it.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch aggregate instance counters.
    pub async fn get_statistics(&self) -> Result<Statistics, Error> {
        let url = self.url(STATISTICS_PATH)?;
        let envelope: ApiEnvelope<Statistics> = self.get(url, &[]).await?;
        reject_if_failed(&envelope)?;
        Ok(envelope.data.unwrap_or_default())
    }

    /// Fetch the instance grid, filtered by the given query pairs.
    pub async fn list_instances(&self, query: &[(String, String)]) -> Result<InstanceList, Error> {
        let url = self.url(INSTANCES_PATH)?;
        let envelope: ApiEnvelope<InstanceListData> = self.get(url, query).await?;
        reject_if_failed(&envelope)?;
        Ok(envelope.data.map(InstanceList::from).unwrap_or_default())
    }

    /// Trigger an account sync for one instance.
    pub async fn sync_instance_accounts(&self, instance_id: i64) -> Result<ActionResponse, Error> {
        let url = self.url(&format!("account_sync/api/instances/{instance_id}/sync"))?;
        self.post(url, &json!({})).await
    }

    /// Trigger a capacity collection for one instance.
    pub async fn sync_instance_capacity(&self, instance_id: i64) -> Result<ActionResponse, Error> {
        let url = self.url(&format!(
            "capacity/api/instances/{instance_id}/sync-capacity"
        ))?;
        self.post(url, &json!({})).await
    }

    /// Trigger an account sync across every active instance.
    pub async fn sync_all_accounts(&self) -> Result<ActionResponse, Error> {
        let url = self.url(SYNC_ALL_PATH)?;
        self.post(url, &json!({})).await
    }

    /// Delete several instances in one request.
    pub async fn batch_delete_instances(&self, ids: &[i64]) -> Result<ActionResponse, Error> {
        let url = self.url(BATCH_DELETE_PATH)?;
        self.post(url, &json!({ "instance_ids": ids })).await
    }

    /// Upload a file of instance definitions for bulk creation.
    pub async fn batch_create_instances(
        &self,
        file: UploadFile,
    ) -> Result<BatchCreateResponse, Error> {
        let url = self.url(BATCH_CREATE_PATH)?;
        debug!(file = %file.file_name, bytes = file.content.len(), "POST {}", url);

        let mut part = reqwest::multipart::Part::bytes(file.content.to_vec())
            .file_name(file.file_name);
        if let Some(mime) = file.mime.as_deref() {
            part = part.mime_str(mime)?;
        }
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(Error::Transport)?;
        let envelope: ApiEnvelope<BatchCreateData> = parse_envelope(resp).await?;

        let data = envelope.data.unwrap_or_default();
        Ok(BatchCreateResponse {
            success: envelope.success,
            message: envelope.message.or(envelope.error),
            errors: data.errors,
            created_count: data.created_count,
        })
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build `{base}/{path}`, tolerating a trailing slash on the base.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(String, String)],
    ) -> Result<ApiEnvelope<T>, Error> {
        debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(Error::Transport)?;
        parse_envelope(resp).await
    }

    async fn post(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<ActionResponse, Error> {
        debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        let envelope: ApiEnvelope<serde_json::Value> = parse_envelope(resp).await?;
        Ok(ActionResponse {
            success: envelope.success,
            message: envelope.message.or(envelope.error),
            data: envelope.data,
        })
    }
}

/// Parse the `{ success, message, data }` envelope.
///
/// Non-2xx statuses become `Error::Http`, using the envelope's message
/// when the body carries one.
async fn parse_envelope<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<ApiEnvelope<T>, Error> {
    let status = resp.status();
    let body = resp.text().await.map_err(Error::Transport)?;

    if !status.is_success() {
        let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
            .ok()
            .and_then(|env| env.message.or(env.error))
            .unwrap_or_else(|| {
                let preview: String = body.chars().take(200).collect();
                if preview.is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_owned()
                } else {
                    preview
                }
            });
        return Err(Error::Http {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })
}

/// Read endpoints have no outcome to hand back, so an explicit
/// `success: false` is surfaced as an error right here.
fn reject_if_failed<T>(envelope: &ApiEnvelope<T>) -> Result<(), Error> {
    if envelope.success == Some(false) {
        return Err(Error::Rejected {
            message: envelope.message_or("request rejected by backend"),
        });
    }
    Ok(())
}
