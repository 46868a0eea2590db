//! Flow: a set of wired nodes and the queue routing messages between them
//!
//! Node outputs never reach the next node directly. Each message on a wired
//! port becomes a [`Delivery`] on one unbounded tokio channel, and the flow
//! drains that channel serially. Nodes therefore never re-enter each other,
//! and messages are handled in the order they were emitted.

mod definition;

pub use definition::{FlowDefinition, NodeDefinition};

use log::{debug, error, trace, warn};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempo_clock::{Clock, TokioClock};
use tempo_core::{Message, NodeId, Outputs};
use tempo_ports::{Envelope, ErrorReporter, Node, NodeContext, OutputSender};
use tokio::sync::mpsc;

use crate::capture::CaptureLog;
use crate::error::{HostError, HostResult};
use crate::registry::{BuildContext, NodeRegistry};

/// A message on its way to a node
#[derive(Debug, Clone)]
pub struct Delivery {
    pub target: NodeId,
    pub message: Message,
}

/// Output port of one node: fans each channel out to its wired targets
struct WireSender {
    from: NodeId,
    wires: Vec<Vec<NodeId>>,
    tx: mpsc::UnboundedSender<Delivery>,
}

impl OutputSender for WireSender {
    fn send(&self, outputs: Outputs) {
        for (port, message) in outputs.into_iter().enumerate() {
            let Some(message) = message else {
                continue;
            };
            let Some(targets) = self.wires.get(port) else {
                trace!("{} port {} is not wired, dropping message", self.from, port);
                continue;
            };
            for target in targets {
                let delivery = Delivery {
                    target: target.clone(),
                    message: message.clone(),
                };
                if self.tx.send(delivery).is_err() {
                    debug!("Flow gone, dropping output of {}", self.from);
                    return;
                }
            }
        }
    }
}

/// An error a node reported while running
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    pub node: NodeId,
    pub message: String,
}

#[derive(Default)]
struct FlowErrors(Mutex<Vec<ReportedError>>);

impl ErrorReporter for FlowErrors {
    fn report(&self, node: &NodeId, message: &str) {
        error!("[{}] {}", node, message);
        self.0.lock().push(ReportedError {
            node: node.clone(),
            message: message.to_string(),
        });
    }
}

/// Cloneable handle for feeding a flow from other tasks
#[derive(Clone)]
pub struct Injector {
    tx: mpsc::UnboundedSender<Delivery>,
    known: Arc<HashSet<NodeId>>,
}

impl Injector {
    /// Queue `message` as an inbound signal for `target`
    pub fn inject(&self, target: &str, message: Message) -> HostResult<()> {
        if !self.known.contains(target) {
            return Err(HostError::UnknownNode(target.to_string()));
        }
        self.tx
            .send(Delivery {
                target: target.to_string(),
                message,
            })
            .map_err(|_| HostError::Closed)
    }
}

struct Slot {
    node: Arc<dyn Node>,
    sender: Arc<WireSender>,
}

/// A loaded, running flow
///
/// Dropping the flow closes it.
pub struct Flow {
    order: Vec<NodeId>,
    slots: HashMap<NodeId, Slot>,
    injector: Injector,
    rx: mpsc::UnboundedReceiver<Delivery>,
    acknowledged: Arc<AtomicUsize>,
    errors: Arc<FlowErrors>,
    captures: CaptureLog,
    closed: bool,
}

impl Flow {
    /// Validate `definition` and build its nodes, in definition order
    pub fn load(
        definition: FlowDefinition,
        registry: &NodeRegistry,
        clock: Arc<dyn Clock>,
    ) -> HostResult<Self> {
        let mut known = HashSet::new();
        for node in &definition.nodes {
            if !known.insert(node.id.clone()) {
                return Err(HostError::DuplicateNode(node.id.clone()));
            }
        }
        for node in &definition.nodes {
            if let Some(to) = node.wires.iter().flatten().find(|t| !known.contains(*t)) {
                return Err(HostError::UnknownWireTarget {
                    from: node.id.clone(),
                    to: to.clone(),
                });
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let errors = Arc::new(FlowErrors::default());
        let captures = CaptureLog::new();

        let mut order = Vec::with_capacity(definition.nodes.len());
        let mut slots = HashMap::with_capacity(definition.nodes.len());
        for node_def in &definition.nodes {
            let sender = Arc::new(WireSender {
                from: node_def.id.clone(),
                wires: node_def.wires.clone(),
                tx: tx.clone(),
            });
            let ctx = NodeContext::new(
                node_def.id.clone(),
                node_def.display_name(),
                sender.clone(),
                errors.clone(),
            );
            let node = registry.build(BuildContext {
                definition: node_def,
                node: ctx,
                clock: clock.clone(),
                captures: captures.clone(),
            })?;
            debug!("Built node {} ({})", node_def.id, node_def.kind);

            order.push(node_def.id.clone());
            slots.insert(node_def.id.clone(), Slot { node, sender });
        }

        debug!("Flow loaded with {} nodes on {}", order.len(), clock.name());
        Ok(Self {
            order,
            slots,
            injector: Injector {
                tx,
                known: Arc::new(known),
            },
            rx,
            acknowledged: Arc::new(AtomicUsize::new(0)),
            errors,
            captures,
            closed: false,
        })
    }

    /// Load `definition` on a [`TokioClock`] bound to the current runtime
    ///
    /// Fails with [`HostError::Clock`] outside a tokio runtime.
    pub fn load_realtime(
        definition: FlowDefinition,
        registry: &NodeRegistry,
    ) -> HostResult<Self> {
        let clock = TokioClock::new()?;
        Self::load(definition, registry, clock)
    }

    /// Node ids, in definition order
    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    pub fn contains(&self, node: &str) -> bool {
        self.slots.contains_key(node)
    }

    pub fn injector(&self) -> Injector {
        self.injector.clone()
    }

    /// Queue `message` as an inbound signal for `target`
    pub fn inject(&self, target: &str, message: Message) -> HostResult<()> {
        if self.closed {
            return Err(HostError::Closed);
        }
        self.injector.inject(target, message)
    }

    /// Route every queued delivery, including those produced along the way
    ///
    /// Returns the number of deliveries handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(delivery) = self.rx.try_recv() {
            self.dispatch(delivery);
            handled += 1;
        }
        handled
    }

    /// Route deliveries as they arrive until `shutdown` resolves, then close
    pub async fn run_until_closed<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let delivery = tokio::select! {
                biased;
                _ = &mut shutdown => None,
                delivery = self.rx.recv() => delivery,
            };
            match delivery {
                Some(delivery) => self.dispatch(delivery),
                None => break,
            }
        }
        self.close();
    }

    fn dispatch(&self, delivery: Delivery) {
        if self.closed {
            trace!("Flow closed, dropping message for {}", delivery.target);
            return;
        }
        let Some(slot) = self.slots.get(&delivery.target) else {
            warn!("No node {} in flow, dropping message", delivery.target);
            return;
        };

        let acknowledged = self.acknowledged.clone();
        let envelope = Envelope::new(delivery.message, slot.sender.clone()).with_done(move || {
            acknowledged.fetch_add(1, Ordering::SeqCst);
        });
        slot.node.on_signal(envelope);
    }

    /// Shut every node down, once
    ///
    /// Queued deliveries are discarded.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for id in &self.order {
            if let Some(slot) = self.slots.get(id) {
                debug!("Closing node {}", id);
                slot.node.on_shutdown();
            }
        }
        while self.rx.try_recv().is_ok() {}
        debug!("Flow closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Number of inbound messages nodes have acknowledged
    pub fn acknowledged(&self) -> usize {
        self.acknowledged.load(Ordering::SeqCst)
    }

    pub fn reported_errors(&self) -> Vec<ReportedError> {
        self.errors.0.lock().clone()
    }

    /// Messages received by the capture node `node`
    pub fn captured(&self, node: &str) -> Vec<Message> {
        self.captures.messages(node)
    }
}

impl Drop for Flow {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempo_clock::{ClockError, ManualClock};

    fn load(nodes: Vec<NodeDefinition>) -> HostResult<Flow> {
        Flow::load(
            FlowDefinition::new(nodes),
            &NodeRegistry::with_defaults(),
            ManualClock::new(),
        )
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let result = load(vec![
            NodeDefinition::new("a", "helper"),
            NodeDefinition::new("a", "helper"),
        ]);
        assert!(matches!(result, Err(HostError::DuplicateNode(id)) if id == "a"));
    }

    #[test]
    fn test_rejects_unknown_wire_target() {
        let result = load(vec![NodeDefinition::new("a", "helper").with_output(&["nowhere"])]);
        assert!(matches!(
            result,
            Err(HostError::UnknownWireTarget { from, to }) if from == "a" && to == "nowhere"
        ));
    }

    #[test]
    fn test_rejects_unknown_type() {
        let result = load(vec![NodeDefinition::new("a", "inject")]);
        assert!(matches!(result, Err(HostError::UnknownNodeType { kind, .. }) if kind == "inject"));
    }

    #[test]
    fn test_realtime_load_needs_runtime() {
        let result = Flow::load_realtime(
            FlowDefinition::new(vec![NodeDefinition::new("a", "helper")]),
            &NodeRegistry::with_defaults(),
        );
        assert!(matches!(
            result,
            Err(HostError::Clock(ClockError::NoRuntime(_)))
        ));
    }

    #[tokio::test]
    async fn test_realtime_load_inside_runtime() {
        let flow = Flow::load_realtime(
            FlowDefinition::new(vec![NodeDefinition::new("a", "helper")]),
            &NodeRegistry::with_defaults(),
        )
        .unwrap();
        assert!(flow.contains("a"));
    }

    #[test]
    fn test_fan_out_to_every_wired_target() {
        let mut flow = load(vec![
            NodeDefinition::new("src", "helper").with_output(&["x", "y"]),
            NodeDefinition::new("x", "helper"),
            NodeDefinition::new("y", "helper"),
        ])
        .unwrap();

        flow.inject("src", Message::new(json!(1))).unwrap();
        assert_eq!(flow.pump(), 3);

        assert_eq!(flow.captured("x")[0].payload, json!(1));
        assert_eq!(flow.captured("y")[0].payload, json!(1));
        assert_eq!(flow.acknowledged(), 3);
    }

    #[test]
    fn test_inject_checks_target_and_state() {
        let mut flow = load(vec![NodeDefinition::new("a", "helper")]).unwrap();

        assert!(matches!(
            flow.inject("b", Message::new(json!(1))),
            Err(HostError::UnknownNode(_))
        ));

        flow.close();
        assert!(flow.is_closed());
        assert!(matches!(
            flow.inject("a", Message::new(json!(1))),
            Err(HostError::Closed)
        ));
        assert_eq!(flow.pump(), 0);
    }
}
