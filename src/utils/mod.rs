// src/utils/mod.rs
pub mod geometry;
pub mod util;

pub use geometry::{BlockPos, Direction, Region, Rotation, OVERLAP_EPSILON};
