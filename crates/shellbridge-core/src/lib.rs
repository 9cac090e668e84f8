#![warn(missing_docs)]
//! # shellbridge-core
//!
//! ## Purpose
//! Defines the operating-mode contract and the shared failure shape used
//! across the `shellbridge` workspace.
//!
//! ## Responsibilities
//! - Resolve the process operating mode once, at startup, from explicit
//!   signals ([`resolve`], [`ModeSignals`]).
//! - Carry the derived [`RuntimeConfig`] whose invariants cannot be broken by
//!   callers (fields are private; the resolver is the only constructor).
//! - Define [`NormalizedError`], the single error shape every outbound
//!   request failure is reduced to.
//!
//! ## Data flow
//! Environment -> [`ModeSignals::from_env`] -> [`resolve`] ->
//! [`RuntimeConfig`] handed by value to the request pipeline and the host
//! gateway.
//!
//! ## Ownership and lifetimes
//! `RuntimeConfig` is a small owned value; callers clone it instead of
//! sharing a global.
//!
//! ## Error model
//! Mode resolution never fails. Malformed backend overrides degrade to
//! offline mode.
//!
//! ## Example
//! ```rust
//! use shellbridge_core::{resolve, ModeSignals, OperatingMode};
//!
//! let config = resolve(&ModeSignals::production(None));
//! assert_eq!(config.mode(), OperatingMode::OfflineProduction);
//! assert!(config.offline_mode());
//! assert!(config.backend_base_url().is_none());
//! ```

mod mode;

use serde_json::{Value, json};
use thiserror::Error;

pub use mode::{
    DEVELOPMENT_BASE_URL, ENV_API_URL, ENV_MODE, ModeSignals, OperatingMode, RuntimeConfig,
    resolve,
};

/// Message used when the transport reports a failure without description.
pub const DEFAULT_TRANSPORT_MESSAGE: &str = "Network request failed";

/// Message returned for network-backed calls attempted in offline mode.
pub const OFFLINE_MESSAGE: &str = "Backend unavailable in offline mode";

/// Uniform failure shape produced by the request pipeline.
///
/// Every variant carries a non-empty message. Only application errors carry
/// a status code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizedError {
    /// A network-backed call was attempted while running offline.
    #[error("{message}")]
    OfflineUnavailable {
        /// Human-readable description.
        message: String,
    },
    /// No response was obtained from the backend.
    #[error("{message}")]
    Transport {
        /// Transport failure description.
        message: String,
    },
    /// The backend answered with a non-success status.
    #[error("{status}: {message}")]
    Application {
        /// HTTP status code of the response.
        status: u16,
        /// Message parsed from the error body or a generic fallback.
        message: String,
    },
}

impl NormalizedError {
    /// Builds the offline-mode rejection.
    pub fn offline() -> Self {
        Self::OfflineUnavailable {
            message: OFFLINE_MESSAGE.to_string(),
        }
    }

    /// Builds a transport failure, substituting a default for blank text.
    pub fn transport(description: impl Into<String>) -> Self {
        Self::Transport {
            message: non_empty_or(description.into(), || DEFAULT_TRANSPORT_MESSAGE.to_string()),
        }
    }

    /// Builds an application failure for `status`.
    ///
    /// A missing or blank `message` becomes `API Error: <status>`.
    pub fn application(status: u16, message: Option<String>) -> Self {
        let message = non_empty_or(message.unwrap_or_default(), || {
            format!("API Error: {status}")
        });
        Self::Application { status, message }
    }

    /// Response status code, absent for offline and transport failures.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Application { status, .. } => Some(*status),
            Self::OfflineUnavailable { .. } | Self::Transport { .. } => None,
        }
    }

    /// Human-readable message without the status prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::OfflineUnavailable { message }
            | Self::Transport { message }
            | Self::Application { message, .. } => message,
        }
    }

    /// Returns `true` for the offline-mode rejection.
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::OfflineUnavailable { .. })
    }

    /// Plain-data form `{statusCode?, message}` safe to hand across the
    /// channel boundary.
    pub fn to_json(&self) -> Value {
        match self.status_code() {
            Some(status) => json!({ "statusCode": status, "message": self.message() }),
            None => json!({ "message": self.message() }),
        }
    }
}

// Whitespace only decides blankness; non-blank text is kept verbatim.
fn non_empty_or(value: String, fallback: impl FnOnce() -> String) -> String {
    if value.trim().is_empty() {
        fallback()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for error normalization helpers.

    use super::*;

    #[test]
    fn blank_messages_fall_back_to_defaults() {
        assert_eq!(
            NormalizedError::transport("  ").message(),
            DEFAULT_TRANSPORT_MESSAGE
        );
        assert_eq!(
            NormalizedError::application(502, Some(String::new())).message(),
            "API Error: 502"
        );
    }

    #[test]
    fn display_prefixes_status_for_application_errors() {
        let error = NormalizedError::application(401, Some("Unauthorized".to_string()));
        assert_eq!(error.to_string(), "401: Unauthorized");
        assert_eq!(error.status_code(), Some(401));

        let offline = NormalizedError::offline();
        assert_eq!(offline.to_string(), OFFLINE_MESSAGE);
        assert_eq!(offline.status_code(), None);
    }
}
