pub mod channel;
pub mod events;

pub use channel::{ChannelEvent, ChannelHandle, SessionChannel};
pub use events::{ControlMessage, InboundEvent};
