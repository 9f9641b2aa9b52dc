// src/generation/candidate.rs

use std::sync::Arc;

use log::{error, trace, warn};
use rayon::prelude::*;

use crate::generation::planned_room::PlannedRoom;
use crate::rooms::{Pool, RoomBlueprint, RoomSet};
use crate::spatial::Snapshot;
use crate::utils::{BlockPos, Direction, Region, Rotation};

/// A fully specified, not yet committed placement that would satisfy one
/// open connection.
#[derive(Debug, Clone)]
pub struct CandidateResult {
    pub blueprint: Arc<RoomBlueprint>,
    pub rotation: Rotation,
    pub position: BlockPos,
    pub bounds: Region,
    /// Connection on the candidate that meets the host connection.
    pub connection: usize,
    pub weight: f64,
}

/// Identifies a candidate across repeated evaluations of the same connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateKey {
    pub blueprint: String,
    pub rotation: Rotation,
    pub position: BlockPos,
    pub connection: usize,
}

impl CandidateResult {
    pub fn key(&self) -> CandidateKey {
        CandidateKey {
            blueprint: self.blueprint.id().to_string(),
            rotation: self.rotation,
            position: self.position,
            connection: self.connection,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.blueprint.is_terminal()
    }

    pub fn into_planned(&self) -> PlannedRoom {
        PlannedRoom::new(
            Arc::clone(&self.blueprint),
            self.position,
            self.rotation,
            Some(self.connection),
        )
    }
}

/// Candidates for one host connection plus what was filtered on the way.
#[derive(Debug, Default)]
pub struct CandidateReport {
    pub candidates: Vec<CandidateResult>,
    /// Aligned (room, rotation, connection) combinations that were checked
    /// against the vertical bound and the index.
    pub evaluated: usize,
    pub rejected_vertical: usize,
    pub rejected_overlap: usize,
    /// Pool members that offered no compatible, opposite-facing connection at
    /// any rotation.
    pub unmatched_rooms: Vec<String>,
}

#[derive(Debug, Default)]
struct RotationEvaluation {
    candidates: Vec<CandidateResult>,
    matched: usize,
    rejected_vertical: usize,
    rejected_overlap: usize,
}

/// Enumerates legal placements for a host connection against a snapshot of
/// the spatial index.
#[derive(Debug, Clone)]
pub struct CandidateSolver {
    parallel: bool,
}

impl Default for CandidateSolver {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CandidateSolver {
    pub fn new(parallel: bool) -> Self {
        CandidateSolver { parallel }
    }

    /// Every (pool room x rotation x opposite-facing connection) placement
    /// that is pool-compatible, inside the vertical bounds and free of
    /// overlaps in `snapshot`.
    ///
    /// Results keep the sequential order (pool entry, rotation, connection)
    /// whether or not evaluation ran in parallel.
    pub fn compute_candidates(
        &self,
        room_set: &RoomSet,
        owner: &PlannedRoom,
        host: usize,
        host_pool: &Pool,
        snapshot: &Snapshot,
    ) -> CandidateReport {
        let mut report = CandidateReport::default();
        let (Some(host_connection), Some(host_point)) = (owner.connection(host), owner.connection_point(host)) else {
            error!(
                "room `{}` has no connection #{} to evaluate",
                owner.blueprint_id(),
                host
            );
            return report;
        };
        let anchor = host_point.offset(host_connection.direction);
        let facing = host_connection.direction.opposite();

        let mut jobs = Vec::new();
        for (entry, (room_id, weight)) in host_pool.entries().elements().enumerate() {
            let Some(blueprint) = room_set.blueprint(room_id) else {
                error!("pool `{}` lists unknown room `{}`", host_pool.id(), room_id);
                continue;
            };
            for rotation in Rotation::ALL {
                jobs.push((entry, blueprint, weight, rotation));
            }
        }

        let evaluate = |&(_, blueprint, weight, rotation): &(usize, &Arc<RoomBlueprint>, f64, Rotation)| {
            Self::evaluate_rotation(blueprint, weight, rotation, anchor, facing, host_pool, snapshot)
        };
        let results: Vec<RotationEvaluation> = if self.parallel {
            jobs.par_iter().map(evaluate).collect()
        } else {
            jobs.iter().map(evaluate).collect()
        };

        // jobs are grouped by entry, one run of Rotation::ALL.len() per entry.
        let rotations = Rotation::ALL.len();
        for (chunk, group) in results.chunks(rotations).zip(jobs.chunks(rotations)) {
            let blueprint = group[0].1;
            let matched: usize = chunk.iter().map(|r| r.matched).sum();
            if matched == 0 {
                error!(
                    "room `{}` is listed in pool `{}` but has no connection that can meet a {:?} connection",
                    blueprint.id(),
                    host_pool.id(),
                    host_connection.direction
                );
                report.unmatched_rooms.push(blueprint.id().to_string());
            }
            for evaluation in chunk {
                report.evaluated += evaluation.matched;
                report.rejected_vertical += evaluation.rejected_vertical;
                report.rejected_overlap += evaluation.rejected_overlap;
                report.candidates.extend(evaluation.candidates.iter().cloned());
            }
        }

        trace!(
            "{} candidates for connection #{} of `{}` at {}",
            report.candidates.len(),
            host,
            owner.blueprint_id(),
            owner.position()
        );
        report
    }

    fn evaluate_rotation(
        blueprint: &Arc<RoomBlueprint>,
        weight: f64,
        rotation: Rotation,
        anchor: BlockPos,
        facing: Direction,
        host_pool: &Pool,
        snapshot: &Snapshot,
    ) -> RotationEvaluation {
        let mut evaluation = RotationEvaluation::default();
        let features = blueprint.features(rotation);
        for connection in features.connections.iter().filter(|c| c.direction == facing) {
            let Some(pool) = &connection.pool else {
                continue;
            };
            if !pool.is_connected(host_pool) {
                warn!(
                    "room `{}` connection #{} uses pool `{}`, which does not connect to `{}`",
                    blueprint.id(),
                    connection.index,
                    pool.id(),
                    host_pool.id()
                );
                continue;
            }
            evaluation.matched += 1;

            let position = anchor - connection.offset;
            let bounds = blueprint.bounds_with(position, rotation);
            if !snapshot.is_within_vertical_bounds(&bounds) {
                evaluation.rejected_vertical += 1;
                continue;
            }
            if snapshot.intersects(&bounds) {
                evaluation.rejected_overlap += 1;
                continue;
            }
            evaluation.candidates.push(CandidateResult {
                blueprint: Arc::clone(blueprint),
                rotation,
                position,
                bounds,
                connection: connection.index,
                weight,
            });
        }
        evaluation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::SpatialIndex;
    use crate::test_support::{branching_set, scenario_set};

    fn root_room(set: &RoomSet) -> PlannedRoom {
        PlannedRoom::root(Arc::clone(set.root()), BlockPos::new(0, 64, 0))
    }

    fn indexed(room: &PlannedRoom) -> SpatialIndex {
        let mut index = SpatialIndex::new(-64, 320);
        index.index(room.bounds());
        index
    }

    #[test]
    fn test_candidates_align_with_host_connection() {
        let set = scenario_set();
        let root = root_room(&set);
        let index = indexed(&root);
        let pool = set.pool("A").unwrap();
        let report = CandidateSolver::new(false).compute_candidates(&set, &root, 0, pool, &index.snapshot());

        // end at None; hall at None and at Clockwise180.
        assert_eq!(report.candidates.len(), 3);
        assert!(report.unmatched_rooms.is_empty());
        let target = root.connection_point(0).unwrap().offset(Direction::North);
        for candidate in &report.candidates {
            let features = candidate.blueprint.features(candidate.rotation);
            let connection = &features.connections[candidate.connection];
            assert_eq!(connection.direction, Direction::South);
            assert_eq!(candidate.position + connection.offset, target);
            assert!(!candidate.bounds.intersects(&root.bounds()));
        }
    }

    #[test]
    fn test_weights_follow_pool_entries() {
        let set = scenario_set();
        let root = root_room(&set);
        let index = indexed(&root);
        let report =
            CandidateSolver::new(false).compute_candidates(&set, &root, 0, set.pool("A").unwrap(), &index.snapshot());
        for candidate in &report.candidates {
            let expected = if candidate.blueprint.id() == "end" { 1.0 } else { 3.0 };
            assert_eq!(candidate.weight, expected);
        }
    }

    #[test]
    fn test_overlapping_candidates_are_rejected() {
        let set = scenario_set();
        let root = root_room(&set);
        let mut index = indexed(&root);
        // Block the space north of the root.
        index.index(Region::new(BlockPos::new(-10, 60, -30), BlockPos::new(10, 80, -1)));
        let report =
            CandidateSolver::new(false).compute_candidates(&set, &root, 0, set.pool("A").unwrap(), &index.snapshot());
        assert!(report.candidates.is_empty());
        assert_eq!(report.rejected_overlap, 3);
        assert!(report.unmatched_rooms.is_empty());
    }

    #[test]
    fn test_vertical_bound_rejects() {
        let set = scenario_set();
        let root = root_room(&set);
        // Candidates share the root's height, 64..=68, which pokes above 66.
        let mut index = SpatialIndex::new(0, 66);
        index.index(root.bounds());
        let report =
            CandidateSolver::new(false).compute_candidates(&set, &root, 0, set.pool("A").unwrap(), &index.snapshot());
        assert!(report.candidates.is_empty());
        assert_eq!(report.rejected_vertical, 3);
        assert_eq!(report.evaluated, 3);
    }

    #[test]
    fn test_parallel_matches_sequential_order() {
        let set = branching_set();
        let root = root_room(&set);
        let index = indexed(&root);
        let pool = set.pool("halls").unwrap();
        for host in 0..4 {
            let seq = CandidateSolver::new(false).compute_candidates(&set, &root, host, pool, &index.snapshot());
            let par = CandidateSolver::new(true).compute_candidates(&set, &root, host, pool, &index.snapshot());
            let seq_keys: Vec<CandidateKey> = seq.candidates.iter().map(CandidateResult::key).collect();
            let par_keys: Vec<CandidateKey> = par.candidates.iter().map(CandidateResult::key).collect();
            assert!(!seq_keys.is_empty());
            assert_eq!(seq_keys, par_keys);
        }
    }

    #[test]
    fn test_room_without_matching_connection_is_reported() {
        // An upward-facing host: nobody in "A" has a downward connection.
        let json = crate::test_support::scenario_json().replacen(
            r#"{ "position": [2, 1, 0], "direction": "north", "pool": "A" }"#,
            r#"{ "position": [2, 4, 2], "direction": "up", "pool": "A" }"#,
            1,
        );
        let set = RoomSet::from_json_str(&json).unwrap();
        let root = root_room(&set);
        let index = indexed(&root);
        let report =
            CandidateSolver::new(false).compute_candidates(&set, &root, 0, set.pool("A").unwrap(), &index.snapshot());
        assert!(report.candidates.is_empty());
        assert_eq!(report.unmatched_rooms, vec!["end".to_string(), "hall".to_string()]);
    }
}
