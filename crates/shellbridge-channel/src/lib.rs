#![warn(missing_docs)]
//! # shellbridge-channel
//!
//! ## Purpose
//! Allowlisted message bridge between the privileged host and the untrusted
//! rendering surface.
//!
//! ## Responsibilities
//! - Fix the set of forwardable channel names at build time
//!   ([`ChannelAllowlist`]).
//! - Fail fast when a capability is registered under an undeclared name.
//! - Silently drop traffic on undeclared names in both directions.
//! - Keep the two sides isolated: they share nothing but two FIFO queues.
//!
//! ## Data flow
//! Surface -> [`SurfaceBridge::send_message`] -> queue -> [`HostGateway`]
//! -> registered [`CapabilityHandler`] -> [`HostEmitter::emit`] -> queue ->
//! [`SurfaceLoop`] -> callbacks registered with
//! [`SurfaceBridge::receive_message`].
//!
//! ## Ordering
//! One unbounded FIFO per direction, so messages from one sender on one
//! channel arrive in send order. Sends never block.
//!
//! ## Error model
//! Only setup can fail ([`ConfigurationError`]). Unknown channels at runtime
//! are dropped and traced, never surfaced to the sender.
//!
//! ## Security and privacy notes
//! Payloads are forwarded untouched; validating them is the receiving
//! handler's job. Payload contents are never logged.

mod host;
mod surface;

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

pub use host::{CapabilityHandler, HostEmitter, HostGateway};
pub use surface::{ShellInfo, SurfaceBridge, SurfaceLoop, VersionInfo};

/// General-purpose application message channel.
pub const APP_MESSAGE_CHANNEL: &str = "app-message";

/// Channels declared by the application.
pub const APP_CHANNELS: &[&str] = &[APP_MESSAGE_CHANNEL];

/// Build-time set of forwardable channel names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelAllowlist {
    names: &'static [&'static str],
}

impl ChannelAllowlist {
    /// Creates an allowlist from static names.
    pub const fn new(names: &'static [&'static str]) -> Self {
        Self { names }
    }

    /// Returns the canonical static name when `name` is allowlisted.
    pub fn resolve(&self, name: &str) -> Option<&'static str> {
        self.names.iter().copied().find(|allowed| *allowed == name)
    }

    /// Returns `true` when `name` is allowlisted.
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Declared names in declaration order.
    pub fn names(&self) -> &'static [&'static str] {
        self.names
    }
}

impl Default for ChannelAllowlist {
    fn default() -> Self {
        Self::new(APP_CHANNELS)
    }
}

/// One message crossing the boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelMessage {
    /// Allowlisted channel name.
    pub channel: &'static str,
    /// Positional arguments, forwarded as-is.
    pub args: Vec<Value>,
}

/// Setup-time failure registering a capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// Name is not in the allowlist.
    #[error("channel '{0}' is not in the allowlist")]
    UndeclaredChannel(String),
    /// Name already has a handler.
    #[error("channel '{0}' already has a capability handler")]
    DuplicateCapability(String),
}

/// Privileged-side setup for the gateway.
pub struct GatewayBuilder {
    allowlist: ChannelAllowlist,
    handlers: HashMap<&'static str, Box<dyn CapabilityHandler>>,
}

impl GatewayBuilder {
    /// Starts a builder over `allowlist`.
    pub fn new(allowlist: ChannelAllowlist) -> Self {
        Self {
            allowlist,
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` for messages the surface sends on `name`.
    ///
    /// # Errors
    /// Returns [`ConfigurationError::UndeclaredChannel`] for names outside the
    /// allowlist and [`ConfigurationError::DuplicateCapability`] when `name`
    /// already has a handler.
    pub fn expose_capability(
        &mut self,
        name: &str,
        handler: impl CapabilityHandler,
    ) -> Result<&mut Self, ConfigurationError> {
        let Some(channel) = self.allowlist.resolve(name) else {
            return Err(ConfigurationError::UndeclaredChannel(name.to_string()));
        };
        if self.handlers.contains_key(channel) {
            return Err(ConfigurationError::DuplicateCapability(name.to_string()));
        }
        self.handlers.insert(channel, Box::new(handler));
        tracing::debug!(channel, "capability exposed");
        Ok(self)
    }

    /// Wires both sides together.
    pub fn build(self, shell: ShellInfo) -> Gateway {
        let (to_host, from_surface) = mpsc::unbounded_channel();
        let (to_surface, from_host) = mpsc::unbounded_channel();

        let emitter = HostEmitter::new(self.allowlist, to_surface);
        let host = HostGateway::new(self.allowlist, self.handlers, from_surface, emitter);
        let (surface, surface_loop) = surface::split(self.allowlist, shell, to_host, from_host);

        Gateway {
            host,
            surface,
            surface_loop,
        }
    }
}

impl std::fmt::Debug for GatewayBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayBuilder")
            .field("allowlist", &self.allowlist)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// The two isolated halves produced by [`GatewayBuilder::build`].
#[derive(Debug)]
pub struct Gateway {
    /// Privileged event loop.
    pub host: HostGateway,
    /// Capability surface handed to the rendering context.
    pub surface: SurfaceBridge,
    /// Delivery loop running in the rendering context.
    pub surface_loop: SurfaceLoop,
}
