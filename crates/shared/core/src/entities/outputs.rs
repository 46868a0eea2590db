use crate::entities::Message;
use crate::values::Port;

/// Messages for each output channel of a node, addressed positionally
///
/// `outputs[i]` is sent on channel `i`; `None` means "nothing on this channel".
pub type Outputs = Vec<Option<Message>>;

/// Build outputs for a node with `channels` outputs, with `message` placed on `port`
///
/// Returns an all-`None` vector if `port` is out of range.
pub fn on_port(channels: usize, port: Port, message: Message) -> Outputs {
    let mut outputs: Outputs = vec![None; channels];
    if let Some(slot) = outputs.get_mut(port) {
        *slot = Some(message);
    }
    outputs
}
