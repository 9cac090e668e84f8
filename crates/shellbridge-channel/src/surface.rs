//! Untrusted side of the gateway: the capability surface and its delivery
//! loop.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace, warn};

use crate::{ChannelAllowlist, ChannelMessage};

type Callback = Box<dyn FnMut(&[Value]) + Send + 'static>;
type Subscriptions = Arc<Mutex<HashMap<&'static str, Vec<Callback>>>>;

/// Version metadata exposed to the surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    /// Host runtime version.
    pub host_runtime: String,
    /// Rendering engine version.
    pub rendering_engine: String,
    /// Desktop shell (application) version.
    pub shell: String,
}

/// Static facts about the host exposed to the surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellInfo {
    /// Platform identifier, e.g. `linux`, `macos`, `windows`.
    pub platform: String,
    /// Version metadata.
    pub versions: VersionInfo,
}

impl ShellInfo {
    /// Describes the current platform.
    pub fn current(versions: VersionInfo) -> Self {
        Self {
            platform: std::env::consts::OS.to_string(),
            versions,
        }
    }
}

pub(crate) fn split(
    allowlist: ChannelAllowlist,
    shell: ShellInfo,
    outbound: UnboundedSender<ChannelMessage>,
    inbound: UnboundedReceiver<ChannelMessage>,
) -> (SurfaceBridge, SurfaceLoop) {
    let subscriptions: Subscriptions = Arc::default();
    let bridge = SurfaceBridge {
        allowlist,
        shell: Arc::new(shell),
        outbound,
        subscriptions: Arc::clone(&subscriptions),
    };
    let surface_loop = SurfaceLoop {
        inbound,
        subscriptions,
    };
    (bridge, surface_loop)
}

/// The only capabilities the rendering surface can reach.
#[derive(Clone)]
pub struct SurfaceBridge {
    allowlist: ChannelAllowlist,
    shell: Arc<ShellInfo>,
    outbound: UnboundedSender<ChannelMessage>,
    subscriptions: Subscriptions,
}

impl SurfaceBridge {
    /// Platform identifier of the host.
    pub fn platform(&self) -> &str {
        &self.shell.platform
    }

    /// Host, engine, and shell versions.
    pub fn versions(&self) -> &VersionInfo {
        &self.shell.versions
    }

    /// Sends `args` to the host on `channel`.
    ///
    /// Undeclared channels are a silent no-op.
    pub fn send_message(&self, channel: &str, args: Vec<Value>) {
        let Some(channel) = self.allowlist.resolve(channel) else {
            trace!(channel, "surface send on undeclared channel dropped");
            return;
        };
        if self.outbound.send(ChannelMessage { channel, args }).is_err() {
            debug!(channel, "host disconnected; surface message dropped");
        }
    }

    /// Registers `callback` for messages the host emits on `channel`.
    ///
    /// The callback runs on the [`SurfaceLoop`] once per message, in arrival
    /// order. Undeclared channels are a silent no-op.
    pub fn receive_message(
        &self,
        channel: &str,
        callback: impl FnMut(&[Value]) + Send + 'static,
    ) {
        let Some(channel) = self.allowlist.resolve(channel) else {
            trace!(channel, "surface subscribe on undeclared channel dropped");
            return;
        };
        match self.subscriptions.lock() {
            Ok(mut subscriptions) => subscriptions
                .entry(channel)
                .or_default()
                .push(Box::new(callback)),
            Err(_) => warn!(channel, "subscription registry poisoned; callback dropped"),
        }
    }
}

impl std::fmt::Debug for SurfaceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceBridge")
            .field("allowlist", &self.allowlist)
            .field("shell", &self.shell)
            .finish_non_exhaustive()
    }
}

/// Delivery loop for host messages, run in the surface context.
pub struct SurfaceLoop {
    inbound: UnboundedReceiver<ChannelMessage>,
    subscriptions: Subscriptions,
}

impl SurfaceLoop {
    /// Runs until the host side has been dropped.
    pub async fn run(mut self) {
        while let Some(message) = self.inbound.recv().await {
            self.deliver(message);
        }
        debug!("host disconnected; surface loop stopped");
    }

    /// Delivers every queued message without waiting. Returns the number of
    /// messages taken off the queue.
    pub fn pump(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(message) = self.inbound.try_recv() {
            self.deliver(message);
            drained += 1;
        }
        drained
    }

    fn deliver(&self, message: ChannelMessage) {
        // Callbacks run outside the lock so they may subscribe re-entrantly.
        let mut callbacks = match self.subscriptions.lock() {
            Ok(mut subscriptions) => subscriptions
                .get_mut(message.channel)
                .map(std::mem::take)
                .unwrap_or_default(),
            Err(_) => {
                warn!(channel = message.channel, "subscription registry poisoned");
                return;
            }
        };
        if callbacks.is_empty() {
            trace!(channel = message.channel, "no subscribers; message dropped");
            return;
        }

        for callback in &mut callbacks {
            callback(message.args.as_slice());
        }

        if let Ok(mut subscriptions) = self.subscriptions.lock() {
            let slot = subscriptions.entry(message.channel).or_default();
            let added_during_delivery = std::mem::replace(slot, callbacks);
            slot.extend(added_during_delivery);
        }
    }
}

impl std::fmt::Debug for SurfaceLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceLoop").finish_non_exhaustive()
    }
}
