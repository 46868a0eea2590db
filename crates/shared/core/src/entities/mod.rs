mod message;
mod outputs;

pub use message::Message;
pub use outputs::{Outputs, on_port};
