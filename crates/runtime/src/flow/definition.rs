use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::path::Path;
use tempo_core::NodeId;

use crate::error::{HostError, HostResult};

/// One node of a flow, as exported by the flow editor
///
/// ```json
/// { "id": "n1", "type": "rx-debounce-time", "name": "", "wires": [["n2"]], "debounceInMs": "100" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Downstream node ids, one list per output channel
    #[serde(default)]
    pub wires: Vec<Vec<NodeId>>,
    /// Type-specific settings
    #[serde(flatten)]
    pub settings: Map<String, Value>,
}

impl NodeDefinition {
    pub fn new(id: impl Into<NodeId>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            name: None,
            wires: Vec::new(),
            settings: Map::new(),
        }
    }

    /// Add a channel wired to `targets`
    pub fn with_output(mut self, targets: &[&str]) -> Self {
        self.wires
            .push(targets.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Deserialize the type-specific settings
    pub fn settings<T: DeserializeOwned>(&self) -> HostResult<T> {
        serde_json::from_value(Value::Object(self.settings.clone())).map_err(|source| {
            HostError::InvalidSettings {
                node: self.id.clone(),
                source,
            }
        })
    }

    /// Name if set and non-empty
    pub fn display_name(&self) -> Option<String> {
        self.name.clone().filter(|n| !n.is_empty())
    }
}

/// A whole flow: a flat list of nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowDefinition {
    pub nodes: Vec<NodeDefinition>,
}

impl FlowDefinition {
    pub fn new(nodes: Vec<NodeDefinition>) -> Self {
        Self { nodes }
    }

    /// Load a flow from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> HostResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load a flow from a JSON string
    pub fn from_json(json: &str) -> HostResult<Self> {
        let flow: FlowDefinition = serde_json::from_str(json)?;
        Ok(flow)
    }
}
