mod delivery;
mod transport;

pub use delivery::*;
pub use transport::*;
