mod config;
mod constants;
mod event;
mod history;
mod metrics;
mod rolls;
mod session;
mod store;
mod stream;

pub mod id;
pub mod utils;

pub use config::*;
pub use constants::*;
pub use event::*;
pub use history::*;
pub use metrics::*;
pub use rolls::*;
pub use session::*;
pub use store::*;
pub use stream::*;

mod errors;
pub use errors::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
