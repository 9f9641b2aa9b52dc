// src/error.rs
use thiserror::Error;

use crate::generation::SearchFailure;

/// Errors raised by [`WeightedList`](crate::random::WeightedList).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightError {
    #[error("weight must be >= 0, got {0}")]
    NegativeWeight(f64),
    #[error("cannot draw from an empty distribution")]
    EmptyDistribution,
}

/// Data-integrity problems in an authored room set. These abort loading.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("root room `{0}` is not defined")]
    UnknownRoot(String),
    #[error("pool `{pool}` referenced by {referenced_by} does not exist")]
    UnknownPool { pool: String, referenced_by: String },
    #[error("room `{room}` listed in pool `{pool}` does not exist")]
    UnknownRoom { room: String, pool: String },
    #[error("pool references form a cycle: {}", .0.join(" -> "))]
    PoolCycle(Vec<String>),
    #[error("room `{room}` in pool `{pool}` has negative weight {weight}")]
    NegativeWeight { pool: String, room: String, weight: f64 },
    #[error("room `{room}` has non-positive size {size}")]
    InvalidSize { room: String, size: String },
    #[error("connection #{index} of room `{room}` lies outside the room")]
    ConnectionOutsideRoom { room: String, index: usize },
    #[error("room `{room}` is listed in pool `{pool}` but has no connection compatible with it")]
    NoReciprocalConnection { room: String, pool: String },
    #[error("room set contains no terminal rooms")]
    NoTerminalRooms,
    #[error("malformed room set: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not read room set: {0}")]
    Io(#[from] std::io::Error),
}

/// Overall outcome of a planning run that did not produce a dungeon.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("generation gave up after {restarts} restarts (last failure: {last})")]
    Exhausted { restarts: u32, last: SearchFailure },
    #[error("generation was cancelled")]
    Cancelled,
}
