mod store;

pub use store::*;

pub mod mem;
pub use mem::*;
