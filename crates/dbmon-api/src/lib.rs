// dbmon-api: Async Rust client for the instance/capacity monitoring backend.

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::ApiClient;
pub use error::Error;
pub use models::{ActionResponse, BatchCreateResponse, InstanceList, Statistics, UploadFile};
pub use transport::{TlsMode, TransportConfig};
