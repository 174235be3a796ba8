// ── Runtime store configuration ──
//
// These types describe where the backend lives and how a store names its
// channels. They never touch disk: front-ends build them (usually from a
// `dbmon-config` profile) and hand them in.

use std::time::Duration;

use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed internal deployments).
    DangerAcceptInvalid,
}

/// How to reach the monitoring backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Application root, e.g. `https://dbmon.internal`.
    pub base_url: Url,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ServiceConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub(crate) fn transport(&self) -> dbmon_api::TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => dbmon_api::TlsMode::System,
            TlsVerification::CustomCa(path) => dbmon_api::TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => dbmon_api::TlsMode::DangerAcceptInvalid,
        };
        dbmon_api::TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}

/// Default channel namespace.
pub const DEFAULT_NAMESPACE: &str = "instances";

/// Per-store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Prefix for channel names (`<namespace>:<kind>`).
    pub namespace: String,
    /// Capacity of the broadcast buffer behind `InstanceStore::events()`.
    pub event_buffer: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_owned(),
            event_buffer: 256,
        }
    }
}

impl StoreConfig {
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }
}
