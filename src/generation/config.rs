// src/generation/config.rs

use serde::{Deserialize, Serialize};

use crate::utils::BlockPos;

/// How the next open connection of a room is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionOrder {
    /// Uniformly among the open connections.
    #[default]
    Random,
    /// The connection with the fewest legal candidates, lowest index on ties.
    FewestCandidates,
}

/// Tuning of the acceptance curve and the selection filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    /// `t` of the too-small rejection curve.
    pub steepness: f64,
    /// Ceiling of the too-small rejection probability.
    pub allowable: f64,
    /// Below this fraction of `max_depth`, candidates that would open back
    /// toward the root are dropped.
    pub branch_out_fraction: f64,
    /// Below this fraction of `max_depth`, terminal rooms are avoided.
    pub terminal_filter_fraction: f64,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        HeuristicConfig {
            steepness: 10.0,
            allowable: 0.9,
            branch_out_fraction: 0.8,
            terminal_filter_fraction: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    /// Deepest stack depth a room may be committed at; the root is depth 0.
    pub max_depth: usize,
    /// Full restarts from the root before giving up.
    pub max_restarts: u32,
    /// Failed children a frame tolerates on one connection before the
    /// failure cascades to its parent.
    pub max_local_failures: u32,
    pub start_position: BlockPos,
    pub min_y: i32,
    pub max_y: i32,
    pub parallel_candidates: bool,
    pub connection_order: ConnectionOrder,
    pub heuristic: HeuristicConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            seed: 0,
            max_depth: 10,
            max_restarts: 20,
            max_local_failures: 3,
            start_position: BlockPos::new(0, 64, 0),
            min_y: -64,
            max_y: 320,
            parallel_candidates: true,
            connection_order: ConnectionOrder::Random,
            heuristic: HeuristicConfig::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn new(seed: u64) -> Self {
        GeneratorConfig { seed, ..Default::default() }
    }

    /// Single-threaded and shallow, for fast reproducible runs.
    pub fn for_testing(seed: u64) -> Self {
        GeneratorConfig {
            seed,
            max_depth: 5,
            parallel_candidates: false,
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
