//! Startup mode resolution.

use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

/// Environment variable carrying the development/production signal.
pub const ENV_MODE: &str = "SHELLBRIDGE_ENV";

/// Environment variable carrying the optional backend URL override.
pub const ENV_API_URL: &str = "SHELLBRIDGE_API_URL";

/// Backend address used in development mode.
pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:5000";

/// Operating mode fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OperatingMode {
    /// Local development against the dev backend.
    Development,
    /// Production build talking to a configured backend.
    ConnectedProduction,
    /// Production build without backend; local data only.
    OfflineProduction,
}

/// Inputs consumed by [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeSignals {
    /// Whether the development signal is set.
    pub development: bool,
    /// Optional backend URL override.
    pub backend_url: Option<String>,
}

impl ModeSignals {
    /// Development signals. Any override is ignored by the resolver.
    pub fn development() -> Self {
        Self {
            development: true,
            backend_url: None,
        }
    }

    /// Production signals with an optional backend override.
    pub fn production(backend_url: Option<&str>) -> Self {
        Self {
            development: false,
            backend_url: backend_url.map(str::to_string),
        }
    }

    /// Reads [`ENV_MODE`] and [`ENV_API_URL`] from the process environment.
    ///
    /// `SHELLBRIDGE_ENV=development` (case-insensitive) sets the development
    /// flag; anything else, including unset, means production.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ModeSignals::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let development = lookup(ENV_MODE)
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("development"));
        Self {
            development,
            backend_url: lookup(ENV_API_URL),
        }
    }
}

/// Settings derived from the resolved [`OperatingMode`].
///
/// Invariants:
/// - `offline_mode` is `true` iff mode is [`OperatingMode::OfflineProduction`].
/// - `backend_base_url` is present iff mode is not offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    mode: OperatingMode,
    is_development: bool,
    offline_mode: bool,
    backend_base_url: Option<String>,
}

impl RuntimeConfig {
    /// Resolved operating mode.
    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// Returns `true` in development mode.
    pub fn is_development(&self) -> bool {
        self.is_development
    }

    /// Returns `true` when no backend is reachable by design.
    pub fn offline_mode(&self) -> bool {
        self.offline_mode
    }

    /// Backend base address, absent in offline mode.
    pub fn backend_base_url(&self) -> Option<&str> {
        self.backend_base_url.as_deref()
    }

    fn new(mode: OperatingMode, backend_base_url: Option<String>) -> Self {
        Self {
            mode,
            is_development: mode == OperatingMode::Development,
            offline_mode: mode == OperatingMode::OfflineProduction,
            backend_base_url,
        }
    }
}

/// Resolves the operating mode from `signals`.
///
/// Pure and synchronous; identical inputs yield identical configs.
pub fn resolve(signals: &ModeSignals) -> RuntimeConfig {
    if signals.development {
        debug!(mode = ?OperatingMode::Development, "operating mode resolved");
        return RuntimeConfig::new(
            OperatingMode::Development,
            Some(DEVELOPMENT_BASE_URL.to_string()),
        );
    }

    let config = match validated_override(signals.backend_url.as_deref()) {
        Some(base_url) => RuntimeConfig::new(OperatingMode::ConnectedProduction, Some(base_url)),
        None => RuntimeConfig::new(OperatingMode::OfflineProduction, None),
    };
    debug!(mode = ?config.mode, "operating mode resolved");
    config
}

fn validated_override(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        return None;
    }

    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {
            Some(trimmed.trim_end_matches('/').to_string())
        }
        Ok(url) => {
            warn!(
                scheme = url.scheme(),
                "backend override rejected; falling back to offline mode"
            );
            None
        }
        Err(error) => {
            warn!(%error, "backend override unparsable; falling back to offline mode");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed_from_override() {
        let config = resolve(&ModeSignals::production(Some(" https://api.example.com/ ")));
        assert_eq!(config.backend_base_url(), Some("https://api.example.com"));
    }

    #[test]
    fn lookup_reads_development_flag_case_insensitively() {
        let signals = ModeSignals::from_lookup(|key| match key {
            ENV_MODE => Some(" Development ".to_string()),
            _ => None,
        });
        assert!(signals.development);

        let signals = ModeSignals::from_lookup(|key| match key {
            ENV_MODE => Some("production".to_string()),
            ENV_API_URL => Some("https://api.example.com".to_string()),
            _ => None,
        });
        assert!(!signals.development);
        assert_eq!(signals.backend_url.as_deref(), Some("https://api.example.com"));
    }

    #[test]
    fn non_http_override_degrades_to_offline() {
        let config = resolve(&ModeSignals::production(Some("ftp://files.example.com")));
        assert_eq!(config.mode(), OperatingMode::OfflineProduction);
        assert!(config.backend_base_url().is_none());
    }
}
