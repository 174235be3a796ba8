// dbmon-core: reactive instance store between dbmon-api and front-ends.
//
// A store owns one state container. Front-ends read snapshots, subscribe
// to typed events, and mutate only through the action set; remote I/O
// goes through an injected `ServiceAdapter`.

pub mod adapter;
pub mod config;
pub mod convert;
pub mod emitter;
pub mod error;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use adapter::{AdapterError, HttpAdapter, ServiceAdapter};
pub use config::{ServiceConfig, StoreConfig, TlsVerification};
pub use emitter::{ChannelEmitter, Emitter, Event, Handler, SubscriptionId};
pub use error::StoreError;
pub use store::{
    ErrorMeta, ErrorTarget, EventKind, InstanceActions, InstanceStore, LoadOptions, LoadingFlags,
    LoadingTarget, OperationKind, OperationTracker, Selection, SelectionReason, Snapshot,
    StoreEvent, StoreSeed, StoreState, Subscription,
};
pub use stream::{EventStream, StateStream};

pub use model::{
    EntityId, EntityInput, EntityRef, FilterValue, Filters, InstanceStats, Outcome, UploadPayload,
    UploadResult,
};
