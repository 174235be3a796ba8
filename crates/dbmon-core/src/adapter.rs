// ── Service adapter ──
//
// The store never talks HTTP itself. Every remote call goes through a
// `ServiceAdapter`, injected at construction. `HttpAdapter` is the
// production implementation over `dbmon_api::ApiClient`; tests inject
// stubs.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use dbmon_api::{ActionResponse, ApiClient, BatchCreateResponse};

use crate::config::ServiceConfig;
use crate::model::filters::to_query;
use crate::model::{EntityId, Filters, InstanceStats, UploadPayload};

/// Error type returned by adapters.
pub type AdapterError = dbmon_api::Error;

/// Remote operations the instance store depends on.
///
/// Outcomes are returned as-is; an explicit `success: false` is judged by
/// the store, not the adapter.
#[async_trait]
pub trait ServiceAdapter: Send + Sync {
    async fn fetch_statistics(&self) -> Result<InstanceStats, AdapterError>;

    /// Rows for the instance grid, narrowed by `filters`.
    async fn fetch_instances(&self, filters: &Filters) -> Result<Vec<Value>, AdapterError>;

    async fn sync_instance_accounts(&self, id: EntityId) -> Result<ActionResponse, AdapterError>;

    async fn sync_instance_capacity(&self, id: EntityId) -> Result<ActionResponse, AdapterError>;

    async fn sync_all_accounts(&self) -> Result<ActionResponse, AdapterError>;

    async fn batch_delete_instances(
        &self,
        ids: &[EntityId],
    ) -> Result<ActionResponse, AdapterError>;

    async fn batch_create_instances(
        &self,
        payload: UploadPayload,
    ) -> Result<BatchCreateResponse, AdapterError>;
}

/// `ServiceAdapter` backed by the backend's REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpAdapter {
    client: ApiClient,
}

impl HttpAdapter {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Build the HTTP client described by `config`.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, AdapterError> {
        let client = ApiClient::new(config.base_url.clone(), &config.transport())?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

#[async_trait]
impl ServiceAdapter for HttpAdapter {
    async fn fetch_statistics(&self) -> Result<InstanceStats, AdapterError> {
        self.client.get_statistics().await.map(InstanceStats::from)
    }

    async fn fetch_instances(&self, filters: &Filters) -> Result<Vec<Value>, AdapterError> {
        let query = to_query(filters);
        let list = self.client.list_instances(&query).await?;
        debug!(rows = list.items.len(), total = ?list.total, "fetched instances");
        Ok(list.items)
    }

    async fn sync_instance_accounts(&self, id: EntityId) -> Result<ActionResponse, AdapterError> {
        self.client.sync_instance_accounts(id.get()).await
    }

    async fn sync_instance_capacity(&self, id: EntityId) -> Result<ActionResponse, AdapterError> {
        self.client.sync_instance_capacity(id.get()).await
    }

    async fn sync_all_accounts(&self) -> Result<ActionResponse, AdapterError> {
        self.client.sync_all_accounts().await
    }

    async fn batch_delete_instances(
        &self,
        ids: &[EntityId],
    ) -> Result<ActionResponse, AdapterError> {
        let raw: Vec<i64> = ids.iter().copied().map(EntityId::get).collect();
        self.client.batch_delete_instances(&raw).await
    }

    async fn batch_create_instances(
        &self,
        payload: UploadPayload,
    ) -> Result<BatchCreateResponse, AdapterError> {
        self.client.batch_create_instances(payload.into()).await
    }
}
