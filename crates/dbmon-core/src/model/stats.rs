// ── Aggregate counters ──

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Instance counters shown on the dashboard header.
///
/// Defaults to all zeros until the first successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceStats {
    pub total_instances: u64,
    pub active_instances: u64,
    pub inactive_instances: u64,
    pub deleted_instances: u64,
    pub db_types: BTreeMap<String, u64>,
}

impl InstanceStats {
    /// Named counters in display order.
    pub fn counters(&self) -> [(&'static str, u64); 4] {
        [
            ("total", self.total_instances),
            ("active", self.active_instances),
            ("inactive", self.inactive_instances),
            ("deleted", self.deleted_instances),
        ]
    }
}
