//! Host adapter: the debounce engine as a single-output node

use log::{debug, warn};
use std::sync::Arc;
use tempo_core::DebounceSettings;
use tempo_ports::{Clock, Envelope, Node, NodeContext};

use crate::engine::DebounceEngine;

/// Type name in flow definitions
pub const DEBOUNCE_NODE_TYPE: &str = "rx-debounce-time";

/// Debounce node
///
/// Forwards the last message of each burst on its only output. Invalid
/// settings are reported to the host on every message.
pub struct DebounceNode {
    ctx: NodeContext,
    engine: DebounceEngine,
}

impl DebounceNode {
    pub fn new(ctx: NodeContext, settings: DebounceSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            engine: DebounceEngine::new(settings, clock),
            ctx,
        }
    }

    pub fn engine(&self) -> &DebounceEngine {
        &self.engine
    }
}

impl Node for DebounceNode {
    fn on_signal(&self, envelope: Envelope) {
        if let Err(err) = self.engine.submit(envelope) {
            warn!("[{}] {}", self.ctx.name(), err);
            self.ctx.report_error(&err);
        }
    }

    fn on_shutdown(&self) {
        if self.engine.is_built() {
            debug!("[{}] Cleaning up subscription", self.ctx.name());
        }
        self.engine.shutdown();
    }
}
