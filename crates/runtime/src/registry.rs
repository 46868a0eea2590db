//! Node types the host knows how to build

use std::collections::HashMap;
use std::sync::Arc;
use tempo_clock::Clock;
use tempo_core::{CountdownSettings, DebounceSettings};
use tempo_countdown::{COUNTDOWN_NODE_TYPE, CountdownNode};
use tempo_debounce::{DEBOUNCE_NODE_TYPE, DebounceNode};
use tempo_ports::{Node, NodeContext};

use crate::capture::{CAPTURE_NODE_TYPE, CaptureLog, CaptureNode};
use crate::error::{HostError, HostResult};
use crate::flow::NodeDefinition;

/// Everything a factory gets to build one node
pub struct BuildContext<'a> {
    pub definition: &'a NodeDefinition,
    pub node: NodeContext,
    pub clock: Arc<dyn Clock>,
    pub captures: CaptureLog,
}

/// Builds a node from its definition
pub type NodeFactory = Box<dyn Fn(BuildContext<'_>) -> HostResult<Arc<dyn Node>> + Send + Sync>;

/// Registry of node types by type name
pub struct NodeRegistry {
    factories: HashMap<String, NodeFactory>,
}

impl NodeRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the countdown, debounce and capture node types
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(COUNTDOWN_NODE_TYPE, |build| {
            let settings: CountdownSettings = build.definition.settings()?;
            let node = CountdownNode::from_settings(build.node, &settings, build.clock).map_err(
                |source| HostError::Config {
                    node: build.definition.id.clone(),
                    source,
                },
            )?;
            Ok(Arc::new(node))
        });

        registry.register(DEBOUNCE_NODE_TYPE, |build| {
            let settings: DebounceSettings = build.definition.settings()?;
            Ok(Arc::new(DebounceNode::new(build.node, settings, build.clock)))
        });

        registry.register(CAPTURE_NODE_TYPE, |build| {
            Ok(Arc::new(CaptureNode::new(build.node, build.captures)))
        });

        registry
    }

    /// Register (or replace) a node type
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(BuildContext<'_>) -> HostResult<Arc<dyn Node>> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Build the node described by `build.definition`
    pub fn build(&self, build: BuildContext<'_>) -> HostResult<Arc<dyn Node>> {
        let factory = self.factories.get(&build.definition.kind).ok_or_else(|| {
            HostError::UnknownNodeType {
                node: build.definition.id.clone(),
                kind: build.definition.kind.clone(),
            }
        })?;
        factory(build)
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
