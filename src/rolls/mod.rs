mod generator;
mod roller;

pub use generator::*;
pub use roller::*;

#[cfg(test)]
mod generator_test;
#[cfg(test)]
mod roller_test;
