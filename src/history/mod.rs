mod codec;
mod event_store;
mod packets;

pub use codec::*;
pub use event_store::*;
pub use packets::*;
