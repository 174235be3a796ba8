// ── Domain model ──

pub mod entity;
pub mod filters;
pub mod stats;
pub mod upload;

pub use entity::{EntityId, EntityInput, EntityRef};
pub use filters::{FilterValue, Filters};
pub use stats::InstanceStats;
pub use upload::{UploadPayload, UploadResult};

/// Outcome of a sync / delete call, passed through from the backend.
pub use dbmon_api::ActionResponse as Outcome;
