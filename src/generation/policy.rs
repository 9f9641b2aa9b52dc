// src/generation/policy.rs

use log::trace;
use rand::RngCore;

use crate::generation::candidate::CandidateResult;
use crate::generation::config::HeuristicConfig;
use crate::generation::generator::SearchFailure;
use crate::generation::planned_room::PlannedRoom;
use crate::random::WeightedList;

/// What a policy may look at when choosing among candidates.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    /// Room whose connection is being satisfied.
    pub room: &'a PlannedRoom,
    pub via: usize,
    /// Depth the chosen candidate would be committed at.
    pub depth: usize,
    pub max_depth: usize,
    /// Center of the root room's bounds.
    pub root_center: [f64; 3],
    pub heuristic: &'a HeuristicConfig,
}

/// Filters the legal candidates for one connection and picks one.
pub trait ConnectionPolicy: Send + Sync {
    fn satisfy(
        &self,
        ctx: &SelectionContext<'_>,
        candidates: Vec<CandidateResult>,
        rng: &mut dyn RngCore,
    ) -> Result<CandidateResult, SearchFailure>;
}

/// Spreads the dungeon away from the root early on, avoids dead ends while
/// shallow, then draws by pool weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchOutPolicy;

impl BranchOutPolicy {
    /// True if any connection the candidate would leave open faces the root,
    /// measured from the centre of the connection block.
    fn faces_root(candidate: &CandidateResult, root_center: [f64; 3]) -> bool {
        let features = candidate.blueprint.features(candidate.rotation);
        let faces = features
            .connectable()
            .filter(|c| c.index != candidate.connection)
            .any(|c| {
                let point = (candidate.position + c.offset).to_f64();
                let unit = c.direction.unit().to_f64();
                let dot: f64 = (0..3).map(|i| unit[i] * (root_center[i] - point[i] - 0.5)).sum();
                dot > 0.0
            });
        faces
    }
}

impl ConnectionPolicy for BranchOutPolicy {
    fn satisfy(
        &self,
        ctx: &SelectionContext<'_>,
        mut candidates: Vec<CandidateResult>,
        rng: &mut dyn RngCore,
    ) -> Result<CandidateResult, SearchFailure> {
        let depth = ctx.depth as f64;
        let max_depth = ctx.max_depth as f64;

        if depth < ctx.heuristic.branch_out_fraction * max_depth {
            candidates.retain(|c| !Self::faces_root(c, ctx.root_center));
        }
        if depth < ctx.heuristic.terminal_filter_fraction * max_depth
            && candidates.iter().any(|c| !c.is_terminal())
        {
            candidates.retain(|c| !c.is_terminal());
        }

        let mut weighted = WeightedList::new();
        for (i, candidate) in candidates.iter().enumerate() {
            // Pool weights were validated at load time.
            weighted
                .put(i, candidate.weight)
                .map_err(|_| SearchFailure::NoValidConnection)?;
        }
        let chosen = *weighted
            .weighted_random(rng)
            .map_err(|_| SearchFailure::NoValidConnection)?;
        trace!(
            "picked `{}` out of {} for connection #{} of `{}`",
            candidates[chosen].blueprint.id(),
            candidates.len(),
            ctx.via,
            ctx.room.blueprint_id()
        );
        Ok(candidates.swap_remove(chosen))
    }
}
