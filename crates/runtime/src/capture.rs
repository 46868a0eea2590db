//! Capture node: records what reaches it
//!
//! The flow-level stand-in for a test helper node. Every message it receives
//! is logged, kept in the flow's [`CaptureLog`], and passed on unchanged to
//! its own wires (if any).

use dashmap::DashMap;
use log::info;
use std::sync::Arc;
use tempo_core::{Message, NodeId};
use tempo_ports::{Envelope, Node, NodeContext};

/// Type name in flow definitions
pub const CAPTURE_NODE_TYPE: &str = "helper";

/// Messages received by capture nodes, per node id
#[derive(Clone, Default)]
pub struct CaptureLog {
    messages: Arc<DashMap<NodeId, Vec<Message>>>,
}

impl CaptureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, node: &NodeId, message: Message) {
        self.messages.entry(node.clone()).or_default().push(message);
    }

    /// Everything `node` received so far, oldest first
    pub fn messages(&self, node: &str) -> Vec<Message> {
        self.messages
            .get(node)
            .map(|m| m.value().clone())
            .unwrap_or_default()
    }
}

pub struct CaptureNode {
    ctx: NodeContext,
    log: CaptureLog,
}

impl CaptureNode {
    pub fn new(ctx: NodeContext, log: CaptureLog) -> Self {
        Self { ctx, log }
    }
}

impl Node for CaptureNode {
    fn on_signal(&self, envelope: Envelope) {
        let message = envelope.message();
        info!("[{}] received {}", self.ctx.name(), message.payload);
        self.log.record(self.ctx.id(), message.clone());
        envelope.deliver();
    }

    fn on_shutdown(&self) {}
}
