mod event;
mod share;
mod update;

pub use event::*;
pub use share::*;
pub use update::*;

#[cfg(test)]
mod share_test;
