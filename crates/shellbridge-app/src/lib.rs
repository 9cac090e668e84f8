#![warn(missing_docs)]
//! # shellbridge-app
//!
//! ## Purpose
//! Wires mode resolution, session storage, the request pipeline, and the
//! channel gateway into one desktop shell process.
//!
//! ## Responsibilities
//! - Read process configuration once from the environment ([`AppConfig`]).
//! - Install structured logging ([`init_tracing`]).
//! - Build every collaborator explicitly and hand them out as a [`Shell`].
//! - Serve the `app-message` channel on the host side
//!   ([`AppMessageHandler`]).
//!
//! ## Data flow
//! Env -> [`AppConfig`] -> [`bootstrap`] -> [`Shell`] {runtime config,
//! session, pipeline, gateway}. The binary runs the gateway loops until
//! shutdown.
//!
//! ## Error model
//! Setup failures are wrapped in [`AppError`]. Runtime request failures stay
//! [`shellbridge_core::NormalizedError`] values owned by callers.
//!
//! ## Security and privacy notes
//! - The surface only reaches the host through allowlisted channels.
//! - [`redact_sensitive`] strips token/credential text before logging.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Value, json};
use shellbridge_channel::{
    APP_MESSAGE_CHANNEL, CapabilityHandler, ChannelAllowlist, ConfigurationError, Gateway,
    GatewayBuilder, HostEmitter, ShellInfo, VersionInfo,
};
use shellbridge_core::{ModeSignals, RuntimeConfig, resolve};
use shellbridge_request::{
    DEFAULT_TIMEOUT_MS, HttpTransport, ReqwestTransport, RequestPipeline, TransportError,
};
use shellbridge_session::{FileSlot, MemorySlot, SessionStore, TokenSlot};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("SHELLBRIDGE_VERSION");

/// Version of the host runtime crate set.
pub const HOST_RUNTIME_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter directive variable.
pub const ENV_LOG: &str = "SHELLBRIDGE_LOG";

/// Per-request timeout variable, in milliseconds.
pub const ENV_REQUEST_TIMEOUT_MS: &str = "SHELLBRIDGE_REQUEST_TIMEOUT_MS";

/// Optional path of the file-backed session slot.
pub const ENV_SESSION_FILE: &str = "SHELLBRIDGE_SESSION_FILE";

/// Rendering engine version reported by the embedder.
pub const ENV_ENGINE_VERSION: &str = "SHELLBRIDGE_ENGINE_VERSION";

const DEFAULT_LOG_FILTER: &str = "info";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Process configuration read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Signals consumed by the mode resolver.
    pub mode: ModeSignals,
    /// Per-request timeout for the HTTP transport.
    pub request_timeout_ms: u64,
    /// File-backed session slot; in-memory when absent.
    pub session_file: Option<PathBuf>,
    /// `tracing` filter directive.
    pub log_filter: String,
    /// Rendering engine version exposed to the surface.
    pub engine_version: String,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration from an arbitrary variable source.
    ///
    /// Blank values count as unset; an unparsable or zero timeout falls back
    /// to [`DEFAULT_TIMEOUT_MS`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            mode: ModeSignals::from_lookup(&lookup),
            request_timeout_ms: non_blank(ENV_REQUEST_TIMEOUT_MS)
                .and_then(|value| value.parse::<u64>().ok())
                .filter(|value| *value > 0)
                .unwrap_or(DEFAULT_TIMEOUT_MS),
            session_file: non_blank(ENV_SESSION_FILE).map(PathBuf::from),
            log_filter: non_blank(ENV_LOG).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            engine_version: non_blank(ENV_ENGINE_VERSION).unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

/// Installs the global `tracing` subscriber.
///
/// An invalid directive falls back to `info`.
///
/// # Errors
/// Returns [`AppError::Logging`] when a global subscriber is already set.
pub fn init_tracing(filter: &str) -> Result<(), AppError> {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|error| AppError::Logging(error.to_string()))
}

/// Facts about this host handed to the rendering surface.
pub fn shell_info(engine_version: &str) -> ShellInfo {
    ShellInfo::current(VersionInfo {
        host_runtime: HOST_RUNTIME_VERSION.to_string(),
        rendering_engine: engine_version.to_string(),
        shell: APP_VERSION.to_string(),
    })
}

/// Every collaborator of a running shell.
#[derive(Debug)]
pub struct Shell {
    /// Mode fixed for the process lifetime.
    pub runtime: RuntimeConfig,
    /// Session handle shared with the pipeline.
    pub session: SessionStore,
    /// Outbound request pipeline.
    pub pipeline: RequestPipeline,
    /// Host and surface halves of the channel gateway.
    pub gateway: Gateway,
}

/// Builds a shell using the production HTTP transport.
///
/// # Errors
/// Returns [`AppError`] when the transport or gateway cannot be set up.
pub fn bootstrap(config: &AppConfig) -> Result<Shell, AppError> {
    let transport = ReqwestTransport::new(config.request_timeout_ms)?;
    bootstrap_with_transport(config, Arc::new(transport))
}

/// Builds a shell over the given transport.
///
/// # Errors
/// Returns [`AppError::Gateway`] when capability registration fails.
pub fn bootstrap_with_transport(
    config: &AppConfig,
    transport: Arc<dyn HttpTransport>,
) -> Result<Shell, AppError> {
    let runtime = resolve(&config.mode);
    info!(
        mode = ?runtime.mode(),
        offline = runtime.offline_mode(),
        "runtime mode resolved"
    );

    let slot: Arc<dyn TokenSlot> = match &config.session_file {
        Some(path) => {
            debug!(path = %path.display(), "using file-backed session slot");
            Arc::new(FileSlot::new(path))
        }
        None => Arc::new(MemorySlot::new()),
    };
    let session = SessionStore::new(slot);
    let pipeline = RequestPipeline::new(runtime.clone(), session.clone(), transport);

    let shell = shell_info(&config.engine_version);
    let mut builder = GatewayBuilder::new(ChannelAllowlist::default());
    builder.expose_capability(
        APP_MESSAGE_CHANNEL,
        AppMessageHandler::new(runtime.clone(), shell.clone()),
    )?;
    let gateway = builder.build(shell);

    Ok(Shell {
        runtime,
        session,
        pipeline,
        gateway,
    })
}

/// Host-side handler for the `app-message` channel.
///
/// Expects the first argument to be an object with a string `type`:
/// `ping` answers `pong`, `mode` answers the runtime config, `shell-info`
/// answers platform and versions. Everything else answers an `error` reply.
#[derive(Debug, Clone)]
pub struct AppMessageHandler {
    runtime: RuntimeConfig,
    shell: ShellInfo,
}

impl AppMessageHandler {
    /// Creates the handler.
    pub fn new(runtime: RuntimeConfig, shell: ShellInfo) -> Self {
        Self { runtime, shell }
    }

    /// Computes the reply for one inbound message.
    pub fn respond(&self, args: &[Value]) -> Value {
        let kind = args
            .first()
            .and_then(|request| request.get("type"))
            .and_then(Value::as_str);

        match kind {
            Some("ping") => json!({ "type": "pong" }),
            Some("mode") => json!({
                "type": "mode",
                "config": serde_json::to_value(&self.runtime).unwrap_or(Value::Null),
            }),
            Some("shell-info") => json!({
                "type": "shell-info",
                "shell": serde_json::to_value(&self.shell).unwrap_or(Value::Null),
            }),
            Some(_) => json!({ "type": "error", "message": "unsupported message type" }),
            None => json!({
                "type": "error",
                "message": "expected an object with a string `type` field",
            }),
        }
    }
}

impl CapabilityHandler for AppMessageHandler {
    fn handle(&mut self, args: Vec<Value>, reply: &HostEmitter) {
        let response = self.respond(&args);
        debug!(reply_type = ?response.get("type"), "app-message handled");
        reply.emit(APP_MESSAGE_CHANNEL, vec![response]);
    }
}

const SENSITIVE_KEYS: [&str; 5] = ["password", "token", "authorization", "bearer", "cookie"];

/// Redacts common secret markers in log-safe output.
///
/// The value after each sensitive key is replaced up to the next `,`, `;`,
/// `&` or newline; surrounding text is kept.
pub fn redact_sensitive(input: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `input`.
    let lower = input.to_ascii_lowercase();
    let mut output = String::with_capacity(input.len());
    let mut cursor = 0;

    while let Some((start, key)) = next_sensitive_key(&lower, cursor) {
        let key_end = start + key.len();
        let value_end = lower[key_end..]
            .find([',', ';', '&', '\n'])
            .map_or(input.len(), |offset| key_end + offset);
        output.push_str(&input[cursor..start]);
        output.push_str(key);
        output.push_str("=<redacted>");
        cursor = value_end;
    }

    output.push_str(&input[cursor..]);
    output
}

fn next_sensitive_key(lower: &str, from: usize) -> Option<(usize, &'static str)> {
    SENSITIVE_KEYS
        .iter()
        .filter_map(|key| lower[from..].find(key).map(|offset| (from + offset, *key)))
        .min_by_key(|(position, _)| *position)
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Gateway setup error.
    #[error("gateway configuration error: {0}")]
    Gateway(#[from] ConfigurationError),
    /// HTTP transport setup error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Logging setup error.
    #[error("logging setup failed: {0}")]
    Logging(String),
    /// Runtime I/O error in the shell loop.
    #[error("runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}
