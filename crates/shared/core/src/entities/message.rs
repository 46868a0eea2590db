use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::values::MessageId;

/// A message travelling between nodes
///
/// Mirrors the host's message envelope: a `_msgid`, a `payload`, an optional
/// `topic`, and any number of free-form properties that nodes may attach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_msgid", default = "Uuid::new_v4")]
    pub id: MessageId,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Any other properties set on the message
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Message {
    /// Create a new message with a fresh id
    pub fn new(payload: impl Into<Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload: payload.into(),
            topic: None,
            properties: Map::new(),
        }
    }

    /// Boolean payload, if the payload is a JSON boolean
    pub fn as_bool(&self) -> Option<bool> {
        self.payload.as_bool()
    }

    /// Read a free-form property
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Set (or overwrite) a free-form property
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(key.into(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape() {
        let mut msg = Message::new(true);
        msg.topic = Some("door".to_string());
        msg.set_property("info", "hello");

        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["payload"], json!(true));
        assert_eq!(value["topic"], json!("door"));
        assert_eq!(value["info"], json!("hello"));
        assert!(value["_msgid"].is_string());
    }

    #[test]
    fn test_missing_id_gets_generated() {
        let msg: Message = serde_json::from_value(json!({ "payload": 5, "extra": "x" })).unwrap();
        assert_eq!(msg.payload, json!(5));
        assert_eq!(msg.property("extra"), Some(&json!("x")));
        assert_eq!(msg.as_bool(), None);
    }
}
