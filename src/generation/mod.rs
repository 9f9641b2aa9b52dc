// src/generation/mod.rs
pub mod candidate;
pub mod config;
pub mod generator;
pub mod orchestrator;
pub mod planned_room;
pub mod policy;
pub mod stats;
pub mod tree;

pub use candidate::{CandidateKey, CandidateReport, CandidateResult, CandidateSolver};
pub use config::{ConnectionOrder, GeneratorConfig, HeuristicConfig};
pub use generator::{CancellationToken, Generator, SearchFailure, Step};
pub use orchestrator::GenerationOrchestrator;
pub use planned_room::{PlacedRoomRecord, PlannedRoom, RoomKey};
pub use policy::{BranchOutPolicy, ConnectionPolicy, SelectionContext};
pub use stats::GenerationStats;
pub use tree::{GenerationTree, MappedNode, MappedTree, NodeId};
