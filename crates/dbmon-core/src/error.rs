// ── Core error types ──
//
// User-facing errors from dbmon-core. Consumers never see raw HTTP or
// JSON failures: the `From<dbmon_api::Error>` impl folds transport-layer
// errors into `Remote`, and explicit `success: false` outcomes become
// `Rejected`. Errors are `Clone` because they travel inside event payloads
// and the store's `last_error` slot.

use thiserror::Error;

/// Unified error type for the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    // ── Local ────────────────────────────────────────────────────────
    /// Malformed or missing input. Raised before any remote call is made.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// The store was torn down with `destroy()`.
    #[error("Store has been destroyed")]
    Destroyed,

    // ── Remote ───────────────────────────────────────────────────────
    /// The service call itself failed (network, HTTP status, bad payload).
    #[error("Request failed: {message}")]
    Remote {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    /// The call went through but the backend reported `success: false`.
    #[error("{message}")]
    Rejected { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Human-readable message suitable for a toast or status line.
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message }
            | Self::Remote { message, .. }
            | Self::Rejected { message } => message.clone(),
            Self::Destroyed | Self::Internal(_) => self.to_string(),
        }
    }

    /// `true` for errors raised before the store reached a pending state.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Destroyed)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<dbmon_api::Error> for StoreError {
    fn from(err: dbmon_api::Error) -> Self {
        match err {
            dbmon_api::Error::Rejected { message } => Self::Rejected { message },
            dbmon_api::Error::Http { status, message } => Self::Remote {
                message,
                status: Some(status),
            },
            dbmon_api::Error::Transport(ref e) => Self::Remote {
                message: if e.is_timeout() {
                    "request timed out".into()
                } else {
                    e.to_string()
                },
                status: e.status().map(|s| s.as_u16()),
            },
            dbmon_api::Error::Deserialization { message, body: _ } => Self::Remote {
                message: format!("unexpected response from server: {message}"),
                status: None,
            },
            dbmon_api::Error::InvalidUrl(e) => Self::Internal(format!("invalid URL: {e}")),
            dbmon_api::Error::Tls(msg) => Self::Remote {
                message: format!("TLS error: {msg}"),
                status: None,
            },
        }
    }
}

/// Treat an explicit `success: false` as a failed call.
pub(crate) fn ensure_success(
    success: Option<bool>,
    message: Option<&str>,
    fallback: &str,
) -> Result<(), StoreError> {
    if success == Some(false) {
        return Err(StoreError::Rejected {
            message: message.unwrap_or(fallback).to_owned(),
        });
    }
    Ok(())
}
