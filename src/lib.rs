// src/lib.rs

pub mod error;
pub mod generation;
pub mod random;
pub mod rooms;
pub mod spatial;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use error::{GenerateError, LoadError, WeightError};
pub use generation::{Generator, GeneratorConfig};
pub use rooms::RoomSet;
