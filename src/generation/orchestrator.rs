// src/generation/orchestrator.rs

use std::sync::Arc;

use log::{debug, trace, warn};

use crate::generation::candidate::{CandidateReport, CandidateResult, CandidateSolver};
use crate::generation::config::GeneratorConfig;
use crate::generation::planned_room::PlannedRoom;
use crate::generation::stats::GenerationStats;
use crate::generation::tree::{GenerationTree, NodeId};
use crate::rooms::RoomSet;
use crate::spatial::SpatialIndex;
use crate::utils::BlockPos;

/// Sole owner of the spatial index and the generation tree. Every mutation
/// of either goes through [`commit`](Self::commit), [`revert`](Self::revert)
/// or [`reset`](Self::reset), which keep the two in step.
#[derive(Debug)]
pub struct GenerationOrchestrator {
    room_set: Arc<RoomSet>,
    solver: CandidateSolver,
    index: SpatialIndex,
    tree: GenerationTree,
    root: NodeId,
    start: BlockPos,
    stats: GenerationStats,
}

impl GenerationOrchestrator {
    /// Seeds the tree and index with the unrotated root room at
    /// `config.start_position`.
    pub fn new(room_set: Arc<RoomSet>, config: &GeneratorConfig) -> Self {
        let mut orchestrator = GenerationOrchestrator {
            room_set,
            solver: CandidateSolver::new(config.parallel_candidates),
            index: SpatialIndex::new(config.min_y, config.max_y),
            tree: GenerationTree::new(),
            root: 0,
            start: config.start_position,
            stats: GenerationStats::default(),
        };
        orchestrator.seed();
        orchestrator
    }

    fn seed(&mut self) {
        let root = PlannedRoom::root(Arc::clone(self.room_set.root()), self.start);
        if !self.index.is_within_vertical_bounds(&root.bounds()) {
            warn!("root room `{}` at {} lies outside the vertical bounds", root.blueprint_id(), self.start);
        }
        self.index.index(root.bounds());
        self.root = self.tree.add_node(None, root);
    }

    /// Drops everything but a freshly placed root.
    pub fn reset(&mut self) {
        debug!("resetting to the root room");
        self.stats.rooms_reverted += self.tree.len().saturating_sub(1);
        self.index.clear();
        self.tree.clear();
        self.seed();
    }

    /// Legal candidates for the open connection `via` of `node`, evaluated
    /// against the current index. Empty when the connection has no pool.
    pub fn compute_candidates(&mut self, node: NodeId, via: usize) -> CandidateReport {
        let report = self.evaluate(node, via);
        self.stats.candidates_evaluated += report.evaluated;
        self.stats.rejected_overlap += report.rejected_overlap;
        self.stats.rejected_vertical += report.rejected_vertical;
        report
    }

    /// Number of legal candidates for `via`, leaving the stats untouched.
    pub fn count_candidates(&self, node: NodeId, via: usize) -> usize {
        self.evaluate(node, via).candidates.len()
    }

    fn evaluate(&self, node: NodeId, via: usize) -> CandidateReport {
        let Some(room) = self.tree.get(node) else {
            return CandidateReport::default();
        };
        let Some(pool) = room.connection(via).and_then(|c| c.pool.as_ref()) else {
            return CandidateReport::default();
        };
        self.solver
            .compute_candidates(&self.room_set, room, via, pool, &self.index.snapshot())
    }

    /// Attaches `candidate` under `parent` through the parent's connection
    /// `via`, closing both ends and indexing its bounds.
    ///
    /// # Panics
    /// If `parent` is not in the tree or `via` is not open on it.
    pub fn commit(&mut self, parent: NodeId, via: usize, candidate: &CandidateResult) -> NodeId {
        let host = self
            .tree
            .get_mut(parent)
            .unwrap_or_else(|| panic!("commit under node {} which is not in the tree", parent));
        assert!(
            host.set_closed(via),
            "commit through connection #{} of `{}`, which is not open",
            via,
            host.blueprint_id()
        );

        let mut room = candidate.into_planned();
        room.set_closed(candidate.connection);
        room.set_parent_connects_via(Some(via));
        trace!(
            "commit `{}` at {} {:?} under node {} via #{}",
            room.blueprint_id(),
            room.position(),
            room.rotation(),
            parent,
            via
        );
        self.index.index(room.bounds());
        self.stats.rooms_placed += 1;
        self.tree.add_node(Some(parent), room)
    }

    /// Removes `child` and its subtree, unindexing every room and reopening
    /// the parent connection that led to it.
    ///
    /// # Panics
    /// If `child` is the root or not in the tree.
    pub fn revert(&mut self, child: NodeId) {
        assert!(child != self.root, "the root room cannot be reverted");
        let (parent, via) = match (self.tree.parent(child), self.tree.get(child)) {
            (Some(parent), Some(room)) => (parent, room.parent_connects_via()),
            _ => panic!("revert of node {} which is not in the tree", child),
        };

        let removed = self.tree.remove_node(child);
        for room in &removed {
            assert!(
                self.index.unindex(&room.bounds()),
                "room `{}` at {} was not indexed",
                room.blueprint_id(),
                room.position()
            );
        }
        if let (Some(host), Some(via)) = (self.tree.get_mut(parent), via) {
            host.set_open(via);
        }
        trace!("reverted {} rooms under node {}", removed.len(), parent);
        self.stats.rooms_reverted += removed.len();
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn room(&self, node: NodeId) -> Option<&PlannedRoom> {
        self.tree.get(node)
    }

    pub fn tree(&self) -> &GenerationTree {
        &self.tree
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn stats(&self) -> &GenerationStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut GenerationStats {
        &mut self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{branching_set, scenario_set};

    fn open_sets(tree: &GenerationTree) -> Vec<(String, Vec<usize>)> {
        tree.iter()
            .map(|r| (r.blueprint_id().to_string(), r.open_connections().collect()))
            .collect()
    }

    #[test]
    fn test_new_seeds_root() {
        let orchestrator = GenerationOrchestrator::new(scenario_set(), &GeneratorConfig::for_testing(1));
        assert_eq!(orchestrator.tree().len(), 1);
        assert_eq!(orchestrator.index().len(), 1);
        let root = orchestrator.room(orchestrator.root()).unwrap();
        assert_eq!(root.blueprint_id(), "root");
        assert_eq!(root.position(), BlockPos::new(0, 64, 0));
    }

    #[test]
    fn test_commit_closes_both_ends() {
        let mut orchestrator = GenerationOrchestrator::new(scenario_set(), &GeneratorConfig::for_testing(1));
        let root = orchestrator.root();
        let report = orchestrator.compute_candidates(root, 0);
        let hall = report.candidates.iter().find(|c| c.blueprint.id() == "hall").unwrap();
        let child = orchestrator.commit(root, 0, hall);

        assert!(!orchestrator.room(root).unwrap().is_open(0));
        let room = orchestrator.room(child).unwrap();
        assert!(!room.is_open(hall.connection));
        assert_eq!(room.open_connections().count(), 1);
        assert_eq!(room.parent_connects_via(), Some(0));
        assert_eq!(orchestrator.index().len(), 2);
        assert!(orchestrator.index().intersects(&hall.bounds));
        assert_eq!(orchestrator.stats().rooms_placed, 1);
    }

    #[test]
    fn test_count_candidates_leaves_stats_alone() {
        let mut orchestrator = GenerationOrchestrator::new(scenario_set(), &GeneratorConfig::for_testing(1));
        let root = orchestrator.root();
        assert_eq!(orchestrator.count_candidates(root, 0), 3);
        assert_eq!(orchestrator.stats(), &GenerationStats::default());

        let report = orchestrator.compute_candidates(root, 0);
        assert_eq!(report.candidates.len(), 3);
        assert_eq!(orchestrator.stats().candidates_evaluated, report.evaluated);
    }

    #[test]
    fn test_commit_then_revert_restores_state() {
        let mut orchestrator = GenerationOrchestrator::new(branching_set(), &GeneratorConfig::for_testing(1));
        let root = orchestrator.root();
        let first = orchestrator.compute_candidates(root, 0).candidates.remove(0);
        orchestrator.commit(root, 0, &first);

        let snapshot = orchestrator.index().snapshot();
        let shape = orchestrator.tree().map(|r| r.key());
        let open = open_sets(orchestrator.tree());

        for via in [1, 2] {
            let candidate = orchestrator.compute_candidates(root, via).candidates.remove(0);
            let child = orchestrator.commit(root, via, &candidate);
            let grandchild_via = orchestrator.room(child).unwrap().open_connections().next();
            if let Some(gv) = grandchild_via {
                if let Some(next) = orchestrator.compute_candidates(child, gv).candidates.first().cloned() {
                    orchestrator.commit(child, gv, &next);
                }
            }
            orchestrator.revert(child);

            assert_eq!(orchestrator.index().snapshot(), snapshot);
            assert_eq!(orchestrator.tree().map(|r| r.key()), shape);
            assert_eq!(open_sets(orchestrator.tree()), open);
        }
    }

    #[test]
    #[should_panic(expected = "not open")]
    fn test_commit_through_closed_connection_panics() {
        let mut orchestrator = GenerationOrchestrator::new(scenario_set(), &GeneratorConfig::for_testing(1));
        let root = orchestrator.root();
        let candidates = orchestrator.compute_candidates(root, 0).candidates;
        orchestrator.commit(root, 0, &candidates[0]);
        orchestrator.commit(root, 0, &candidates[1]);
    }

    #[test]
    #[should_panic(expected = "root room cannot be reverted")]
    fn test_revert_root_panics() {
        let mut orchestrator = GenerationOrchestrator::new(scenario_set(), &GeneratorConfig::for_testing(1));
        let root = orchestrator.root();
        orchestrator.revert(root);
    }

    #[test]
    #[should_panic(expected = "not in the tree")]
    fn test_revert_unknown_node_panics() {
        let mut orchestrator = GenerationOrchestrator::new(scenario_set(), &GeneratorConfig::for_testing(1));
        orchestrator.revert(42);
    }

    #[test]
    fn test_reset_keeps_only_root() {
        let mut orchestrator = GenerationOrchestrator::new(scenario_set(), &GeneratorConfig::for_testing(1));
        let root = orchestrator.root();
        let candidate = orchestrator.compute_candidates(root, 0).candidates.remove(0);
        orchestrator.commit(root, 0, &candidate);
        orchestrator.reset();
        assert_eq!(orchestrator.tree().len(), 1);
        assert_eq!(orchestrator.index().len(), 1);
        assert!(orchestrator.room(orchestrator.root()).unwrap().is_open(0));
    }
}
