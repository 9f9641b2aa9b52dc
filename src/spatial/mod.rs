// src/spatial/mod.rs
mod spatial_index;

pub use spatial_index::{CellKey, Snapshot, SpatialIndex};

/// Edge length of a spatial index cell, in blocks.
pub const CELL_SIZE: i32 = 16;
