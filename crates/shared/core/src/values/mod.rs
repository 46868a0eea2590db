use uuid::Uuid;

/// Node identifier, as written in the flow definition
pub type NodeId = String;

/// Unique identifier carried by every message (`_msgid` on the wire)
pub type MessageId = Uuid;

/// Output channel index of a node (0-based, positional)
pub type Port = usize;
