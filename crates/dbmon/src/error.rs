//! CLI error types with miette diagnostics.
//!
//! Maps `StoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use dbmon_config::ConfigError;
use dbmon_core::StoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach the backend at {url}")]
    #[diagnostic(
        code(dbmon::connection_failed),
        help(
            "Check that the service is running and accessible.\n\
             Detail: {reason}\n\
             Self-signed certificate? Try --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(dbmon::timeout),
        help("Increase timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Resources ────────────────────────────────────────────────────

    #[error("Instance '{identifier}' not found")]
    #[diagnostic(
        code(dbmon::not_found),
        help("Run: dbmon instances to see available instances")
    )]
    NotFound { identifier: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(dbmon::api_error))]
    ApiError { code: String, message: String },

    #[error("Request rejected: {message}")]
    #[diagnostic(code(dbmon::rejected))]
    Rejected { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(dbmon::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(dbmon::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: dbmon config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(dbmon::no_config),
        help(
            "Create a profile with: dbmon config init\n\
             Or pass --url / set DBMON_URL.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(dbmon::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(dbmon::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Prompt failed: {0}")]
    #[diagnostic(code(dbmon::prompt))]
    Prompt(String),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(dbmon::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. }
            | Self::Config(_) => exit_code::USAGE,
            Self::ApiError { .. } | Self::Prompt(_) | Self::Io(_) | Self::Json(_) => {
                exit_code::GENERAL
            }
        }
    }

    /// Fill in the backend URL and timeout the store cannot know about.
    pub fn in_context(self, url: &str, timeout_secs: u64) -> Self {
        match self {
            Self::ConnectionFailed { reason, .. } => Self::ConnectionFailed {
                url: url.to_owned(),
                reason,
            },
            Self::Timeout { .. } => Self::Timeout {
                seconds: timeout_secs,
            },
            other => other,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation { message } => Self::Validation {
                field: "input".into(),
                reason: message,
            },
            StoreError::Rejected { message } => Self::Rejected { message },
            StoreError::Remote {
                message,
                status: Some(404),
            } => Self::NotFound {
                identifier: message,
            },
            StoreError::Remote {
                message,
                status: Some(status),
            } => Self::ApiError {
                code: status.to_string(),
                message,
            },
            StoreError::Remote {
                message,
                status: None,
            } if message == "request timed out" => Self::Timeout { seconds: 0 },
            StoreError::Remote {
                message,
                status: None,
            } => Self::ConnectionFailed {
                url: String::new(),
                reason: message,
            },
            StoreError::Destroyed | StoreError::Internal(_) => Self::ApiError {
                code: "internal".into(),
                message: err.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(Box::new(other)),
        }
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Prompt(err.to_string())
    }
}
