// src/random/mod.rs
mod weighted_list;

pub use weighted_list::WeightedList;
