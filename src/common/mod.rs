pub mod errors;
pub mod types;

pub use errors::RelayError;
pub use types::{BROADCAST_TARGET, ChatMessage, MessageKind, Participant};
