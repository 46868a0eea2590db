//! Tempo Runtime - Host for tempo nodes
//!
//! Loads a flow of wired nodes and runs it on a [`Clock`](tempo_clock::Clock):
//!
//! - **Definition**: Node-RED style JSON (`id`, `type`, `name`, `wires`, settings)
//! - **Registry**: node type name to constructor
//! - **Flow**: builds the nodes, routes their outputs, closes them
//! - **Capture**: the `helper` node, recording whatever reaches it
//!
//! ## Routing
//!
//! ```text
//!  inject ──► queue ──► node.on_signal(envelope)
//!               ▲              │
//!               │   outputs    │ send([port 0, port 1, ...])
//!               └── wires ◄────┘
//! ```
//!
//! The queue is drained by one caller at a time: [`Flow::pump`] on virtual
//! time, [`Flow::run_until_closed`] on a tokio runtime.

pub mod capture;
pub mod error;
pub mod flow;
pub mod registry;

pub use capture::{CAPTURE_NODE_TYPE, CaptureLog, CaptureNode};
pub use error::{HostError, HostResult};
pub use flow::{Delivery, Flow, FlowDefinition, Injector, NodeDefinition, ReportedError};
pub use registry::{BuildContext, NodeFactory, NodeRegistry};
