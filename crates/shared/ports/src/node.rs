use std::fmt;
use std::sync::Arc;

use tempo_core::{Message, NodeId, Outputs};

/// Port for routing a node's outputs downstream (the "send" callback)
///
/// Implementations must not call back into the sending node synchronously:
/// nodes may emit while holding their own state lock.
pub trait OutputSender: Send + Sync {
    fn send(&self, outputs: Outputs);
}

/// Port for reporting node errors to the host
pub trait ErrorReporter: Send + Sync {
    fn report(&self, node: &NodeId, message: &str);
}

/// Completion callback of an inbound message
pub type DoneCallback = Box<dyn FnOnce() + Send + 'static>;

/// An inbound message together with its send and completion callbacks
///
/// The completion callback runs at most once, through `complete` or
/// `deliver`. Dropping an envelope supersedes it: completion never runs.
pub struct Envelope {
    message: Message,
    sender: Arc<dyn OutputSender>,
    done: Option<DoneCallback>,
}

impl Envelope {
    pub fn new(message: Message, sender: Arc<dyn OutputSender>) -> Self {
        Self {
            message,
            sender,
            done: None,
        }
    }

    /// Attach a completion callback
    pub fn with_done(mut self, done: impl FnOnce() + Send + 'static) -> Self {
        self.done = Some(Box::new(done));
        self
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn message_mut(&mut self) -> &mut Message {
        &mut self.message
    }

    /// Acknowledge the message
    pub fn complete(mut self) {
        if let Some(done) = self.done.take() {
            done();
        }
    }

    /// Send the message itself on the first output, then acknowledge it
    pub fn deliver(self) {
        let Envelope {
            message,
            sender,
            done,
        } = self;
        sender.send(vec![Some(message)]);
        if let Some(done) = done {
            done();
        }
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("message", &self.message)
            .field("has_done", &self.done.is_some())
            .finish()
    }
}

/// Port implemented by every node the host can run
///
/// The host delivers inbound messages with `on_signal` and calls
/// `on_shutdown` exactly once when the flow closes.
pub trait Node: Send + Sync {
    fn on_signal(&self, envelope: Envelope);

    fn on_shutdown(&self);
}

/// What a node gets from the host at construction
#[derive(Clone)]
pub struct NodeContext {
    id: NodeId,
    name: Option<String>,
    sender: Arc<dyn OutputSender>,
    reporter: Arc<dyn ErrorReporter>,
}

impl NodeContext {
    pub fn new(
        id: impl Into<NodeId>,
        name: Option<String>,
        sender: Arc<dyn OutputSender>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            id: id.into(),
            name,
            sender,
            reporter,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    /// Display name, falling back to the id
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn sender(&self) -> Arc<dyn OutputSender> {
        self.sender.clone()
    }

    /// Wrap an inbound message with this node's sender
    pub fn envelope(&self, message: Message) -> Envelope {
        Envelope::new(message, self.sender.clone())
    }

    /// Report an error to the host
    pub fn report_error(&self, error: &dyn fmt::Display) {
        self.reporter.report(&self.id, &error.to_string());
    }
}

impl fmt::Debug for NodeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeContext")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}
