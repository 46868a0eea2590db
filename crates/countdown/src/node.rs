//! Host adapter: a countdown timer as a three-output node

use log::debug;
use std::sync::Arc;
use tempo_core::{
    ConfigResult, CountdownConfig, CountdownSettings, Message, Outputs, Port, on_port,
};
use tempo_ports::{Clock, Envelope, Node, NodeContext, OutputSender};

use crate::engine::{CountdownEngine, CountdownEvent, CountdownListener};

/// Type name in flow definitions
pub const COUNTDOWN_NODE_TYPE: &str = "configurable-countdown-timer";

/// Output channels, in order
pub const TICK_PORT: Port = 0;
pub const COMPLETE_PORT: Port = 1;
pub const CANCEL_PORT: Port = 2;
pub const OUTPUT_COUNT: usize = 3;

/// Payload on the completion channel
pub const COUNTDOWN_ENDED: &str = "Countdown ended";

/// Payload on the cancellation channel
pub const COUNTDOWN_CANCELLED: &str = "onCountdownCancel";

/// Maps countdown notifications onto the node's output channels
struct ChannelRouter {
    sender: Arc<dyn OutputSender>,
}

impl ChannelRouter {
    fn outputs(event: CountdownEvent) -> Outputs {
        match event {
            CountdownEvent::Tick(value) => on_port(OUTPUT_COUNT, TICK_PORT, Message::new(value)),
            CountdownEvent::Complete(value) => {
                let mut outputs = on_port(OUTPUT_COUNT, TICK_PORT, Message::new(value));
                outputs[COMPLETE_PORT] = Some(Message::new(COUNTDOWN_ENDED));
                outputs
            }
            CountdownEvent::Cancel => on_port(
                OUTPUT_COUNT,
                CANCEL_PORT,
                Message::new(COUNTDOWN_CANCELLED),
            ),
        }
    }
}

impl CountdownListener for ChannelRouter {
    fn notify(&self, event: CountdownEvent) {
        self.sender.send(Self::outputs(event));
    }
}

/// Countdown timer node
///
/// - Output 1: every count, including the final `0`
/// - Output 2: `"Countdown ended"` once per completed run
/// - Output 3: `"onCountdownCancel"` once per cancelled run
pub struct CountdownNode {
    ctx: NodeContext,
    engine: CountdownEngine,
}

impl CountdownNode {
    pub fn new(ctx: NodeContext, config: CountdownConfig, clock: Arc<dyn Clock>) -> Self {
        let router = Arc::new(ChannelRouter {
            sender: ctx.sender(),
        });
        debug!(
            "[{}] Countdown node from {} (restart: {})",
            ctx.name(),
            config.count_from(),
            config.restart_on_second_message()
        );

        Self {
            engine: CountdownEngine::new(config, clock, router),
            ctx,
        }
    }

    /// Validate settings from a flow definition and build the node
    pub fn from_settings(
        ctx: NodeContext,
        settings: &CountdownSettings,
        clock: Arc<dyn Clock>,
    ) -> ConfigResult<Self> {
        let config = CountdownConfig::from_settings(settings)?;
        Ok(Self::new(ctx, config, clock))
    }

    pub fn engine(&self) -> &CountdownEngine {
        &self.engine
    }
}

impl Node for CountdownNode {
    fn on_signal(&self, envelope: Envelope) {
        let outcome = self.engine.submit(&envelope.message().payload);
        debug!("[{}] Signal handled: {:?}", self.ctx.name(), outcome);
        envelope.complete();
    }

    fn on_shutdown(&self) {
        debug!("[{}] Cleaning up nodes", self.ctx.name());
        self.engine.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempo_clock::ManualClock;
    use tempo_ports::ErrorReporter;

    #[derive(Default)]
    struct Wire(Mutex<Vec<Outputs>>);

    impl OutputSender for Wire {
        fn send(&self, outputs: Outputs) {
            self.0.lock().push(outputs);
        }
    }

    impl Wire {
        /// Payloads seen on one channel
        fn channel(&self, port: usize) -> Vec<Value> {
            self.0
                .lock()
                .iter()
                .filter_map(|o| o[port].as_ref().map(|m| m.payload.clone()))
                .collect()
        }
    }

    struct NoErrors;

    impl ErrorReporter for NoErrors {
        fn report(&self, node: &String, message: &str) {
            panic!("unexpected error from {}: {}", node, message);
        }
    }

    fn node(settings: Value) -> (CountdownNode, Arc<ManualClock>, Arc<Wire>) {
        let clock = ManualClock::new();
        let wire = Arc::new(Wire::default());
        let ctx = NodeContext::new("cct", None, wire.clone(), Arc::new(NoErrors));
        let settings: CountdownSettings = serde_json::from_value(settings).unwrap();
        let node = CountdownNode::from_settings(ctx, &settings, clock.clone()).unwrap();
        (node, clock, wire)
    }

    fn signal(node: &CountdownNode, wire: &Arc<Wire>, payload: Value) -> Arc<AtomicUsize> {
        let acks = Arc::new(AtomicUsize::new(0));
        let acks_clone = acks.clone();
        let envelope = Envelope::new(Message::new(payload), wire.clone()).with_done(move || {
            acks_clone.fetch_add(1, Ordering::SeqCst);
        });
        node.on_signal(envelope);
        acks
    }

    #[test]
    fn test_channels_on_completion() {
        let (node, clock, wire) = node(json!({ "countdownFrom": "3" }));

        let acks = signal(&node, &wire, json!(true));
        clock.advance(Duration::from_secs(5));

        assert_eq!(acks.load(Ordering::SeqCst), 1);
        assert_eq!(wire.channel(TICK_PORT), vec![json!(3), json!(2), json!(1), json!(0)]);
        assert_eq!(wire.channel(COMPLETE_PORT), vec![json!(COUNTDOWN_ENDED)]);
        assert!(wire.channel(CANCEL_PORT).is_empty());
    }

    #[test]
    fn test_channels_on_cancel() {
        let (node, clock, wire) = node(json!({ "countdownFrom": "3" }));

        signal(&node, &wire, json!(true));
        clock.advance(Duration::from_secs(1));
        let acks = signal(&node, &wire, json!(false));
        clock.advance(Duration::from_secs(5));

        assert_eq!(acks.load(Ordering::SeqCst), 1);
        assert_eq!(wire.channel(TICK_PORT), vec![json!(3), json!(2)]);
        assert!(wire.channel(COMPLETE_PORT).is_empty());
        assert_eq!(wire.channel(CANCEL_PORT), vec![json!(COUNTDOWN_CANCELLED)]);
    }

    #[test]
    fn test_every_signal_is_acknowledged() {
        let (node, _clock, wire) = node(json!({ "countdownFrom": "3" }));

        for payload in [json!("text"), json!(false), json!(true), json!(true)] {
            let acks = signal(&node, &wire, payload);
            assert_eq!(acks.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_shutdown_stops_output() {
        let (node, clock, wire) = node(json!({ "countdownFrom": 5 }));

        signal(&node, &wire, json!(true));
        node.on_shutdown();
        clock.advance(Duration::from_secs(10));

        assert_eq!(wire.channel(TICK_PORT), vec![json!(5)]);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let clock = ManualClock::new();
        let wire = Arc::new(Wire::default());
        let ctx = NodeContext::new("cct", None, wire, Arc::new(NoErrors));
        let settings = CountdownSettings {
            countdown_from: Some("0".into()),
            restart_on_second_message: false,
        };

        assert!(CountdownNode::from_settings(ctx, &settings, clock).is_err());
    }
}
