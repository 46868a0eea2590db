//! Error types for the runtime crate

use tempo_clock::ClockError;
use tempo_core::{ConfigError, NodeId};
use thiserror::Error;

/// Host-level errors (flow loading, wiring, injection)
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Unknown node type {kind:?} for node {node}")]
    UnknownNodeType { node: NodeId, kind: String },

    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    #[error("Node {from} is wired to unknown node {to}")]
    UnknownWireTarget { from: NodeId, to: NodeId },

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Invalid settings for node {node}: {source}")]
    InvalidSettings {
        node: NodeId,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration for node {node}: {source}")]
    Config {
        node: NodeId,
        #[source]
        source: ConfigError,
    },

    #[error("Flow is closed")]
    Closed,

    #[error("Clock error: {0}")]
    Clock(#[from] ClockError),

    #[error("Failed to read flow file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse flow: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type HostResult<T> = std::result::Result<T, HostError>;
