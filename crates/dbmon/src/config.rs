//! CLI configuration: thin wrapper around `dbmon_config`.
//!
//! Resolves the active profile and applies `GlobalOpts` flag overrides
//! (--url, --insecure, --timeout) on top of it.

use std::sync::Arc;
use std::time::Duration;

use dbmon_core::{
    ChannelEmitter, HttpAdapter, InstanceStore, ServiceConfig, StoreConfig, StoreError, StoreEvent,
};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use dbmon_config::{Config, Profile, config_path, load_config, save_config};

/// Everything a backend-facing command needs.
#[derive(Debug, Clone)]
pub struct Context {
    pub profile_name: String,
    pub service: ServiceConfig,
    pub store: StoreConfig,
    pub poll_interval: Duration,
}

impl Context {
    /// Build a store wired to the HTTP adapter.
    pub fn build_store(&self) -> Result<InstanceStore, CliError> {
        let adapter = HttpAdapter::from_config(&self.service).map_err(|e| {
            CliError::from(StoreError::from(e))
                .in_context(self.service.base_url.as_str(), self.timeout_secs())
        })?;
        Ok(InstanceStore::with_emitter(
            Arc::new(adapter),
            Arc::new(ChannelEmitter::<StoreEvent>::new()),
            self.store.clone(),
        ))
    }

    /// Add URL and timeout to a store failure.
    pub fn explain(&self, err: StoreError) -> CliError {
        CliError::from(err).in_context(self.service.base_url.as_str(), self.timeout_secs())
    }

    fn timeout_secs(&self) -> u64 {
        self.service.timeout.as_secs()
    }
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Load config and turn the selected profile plus flags into a `Context`.
pub fn resolve(global: &GlobalOpts) -> Result<Context, CliError> {
    let config = load_config()?;
    resolve_with(global, &config)
}

pub(crate) fn resolve_with(global: &GlobalOpts, config: &Config) -> Result<Context, CliError> {
    let profile_name = active_profile_name(global, config);

    // A bare --url works without any config file
    let mut profile = match (config.profiles.get(&profile_name), global.url.as_deref()) {
        (Some(profile), _) => profile.clone(),
        (None, Some(url)) => Profile::new(url),
        (None, None) if config.profiles.is_empty() => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
        (None, None) => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: config
                    .profiles
                    .keys()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }
    };

    if let Some(url) = &global.url {
        profile.base_url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let service = dbmon_config::profile_to_service_config(&profile, &config.defaults)?;
    let store = dbmon_config::profile_to_store_config(&profile);
    let poll_interval = dbmon_config::poll_interval(&profile, &config.defaults);

    tracing::debug!(
        profile = %profile_name,
        url = %service.base_url,
        namespace = %store.namespace,
        "resolved backend profile"
    );

    Ok(Context {
        profile_name,
        service,
        store,
        poll_interval,
    })
}
