//! Privileged side of the gateway.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

use crate::{ChannelAllowlist, ChannelMessage};

/// Handler invoked for each message the surface sends on its channel.
///
/// Handlers run on the host loop, one message at a time, in arrival order.
pub trait CapabilityHandler: Send + 'static {
    /// Handles one message. `reply` pushes messages back to the surface.
    fn handle(&mut self, args: Vec<Value>, reply: &HostEmitter);
}

impl<F> CapabilityHandler for F
where
    F: FnMut(Vec<Value>, &HostEmitter) + Send + 'static,
{
    fn handle(&mut self, args: Vec<Value>, reply: &HostEmitter) {
        self(args, reply);
    }
}

/// Cloneable handle for pushing messages to the surface.
#[derive(Debug, Clone)]
pub struct HostEmitter {
    allowlist: ChannelAllowlist,
    outbound: UnboundedSender<ChannelMessage>,
}

impl HostEmitter {
    pub(crate) fn new(
        allowlist: ChannelAllowlist,
        outbound: UnboundedSender<ChannelMessage>,
    ) -> Self {
        Self {
            allowlist,
            outbound,
        }
    }

    /// Queues `args` for delivery on `channel`.
    ///
    /// Returns `false` when the channel is undeclared or the surface is gone;
    /// nothing is forwarded in either case.
    pub fn emit(&self, channel: &str, args: Vec<Value>) -> bool {
        let Some(channel) = self.allowlist.resolve(channel) else {
            trace!(channel, "host emit on undeclared channel dropped");
            return false;
        };
        if self.outbound.send(ChannelMessage { channel, args }).is_err() {
            debug!(channel, "surface disconnected; host message dropped");
            return false;
        }
        true
    }
}

/// Privileged event loop dispatching surface messages to handlers.
pub struct HostGateway {
    allowlist: ChannelAllowlist,
    handlers: HashMap<&'static str, Box<dyn CapabilityHandler>>,
    inbound: UnboundedReceiver<ChannelMessage>,
    emitter: HostEmitter,
}

impl HostGateway {
    pub(crate) fn new(
        allowlist: ChannelAllowlist,
        handlers: HashMap<&'static str, Box<dyn CapabilityHandler>>,
        inbound: UnboundedReceiver<ChannelMessage>,
        emitter: HostEmitter,
    ) -> Self {
        Self {
            allowlist,
            handlers,
            inbound,
            emitter,
        }
    }

    /// Emitter for host-initiated messages outside handler calls.
    pub fn emitter(&self) -> HostEmitter {
        self.emitter.clone()
    }

    /// Runs until every surface handle has been dropped.
    pub async fn run(mut self) {
        while let Some(message) = self.inbound.recv().await {
            self.dispatch(message);
        }
        debug!("surface disconnected; host gateway stopped");
    }

    /// Dispatches every queued message without waiting. Returns the number
    /// of messages taken off the queue.
    pub fn pump(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(message) = self.inbound.try_recv() {
            self.dispatch(message);
            drained += 1;
        }
        drained
    }

    fn dispatch(&mut self, message: ChannelMessage) {
        // The surface is untrusted; never rely on its side of the check.
        if !self.allowlist.contains(message.channel) {
            trace!(channel = message.channel, "undeclared channel dropped by host");
            return;
        }
        match self.handlers.get_mut(message.channel) {
            Some(handler) => handler.handle(message.args, &self.emitter),
            None => debug!(
                channel = message.channel,
                "no capability registered; message dropped"
            ),
        }
    }
}

impl std::fmt::Debug for HostGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostGateway")
            .field("allowlist", &self.allowlist)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
