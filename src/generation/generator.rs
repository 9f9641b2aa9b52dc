// src/generation/generator.rs

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::GenerateError;
use crate::generation::candidate::{CandidateKey, CandidateResult};
use crate::generation::config::{ConnectionOrder, GeneratorConfig};
use crate::generation::orchestrator::GenerationOrchestrator;
use crate::generation::planned_room::PlacedRoomRecord;
use crate::generation::policy::{BranchOutPolicy, ConnectionPolicy, SelectionContext};
use crate::generation::stats::GenerationStats;
use crate::generation::tree::{GenerationTree, MappedTree, NodeId};
use crate::rooms::RoomSet;
use crate::utils::util::too_small_probability;

/// Why a connection could not be satisfied. These are ordinary search
/// outcomes that drive backtracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchFailure {
    DepthExceeded,
    NoValidConnection,
    NoPool,
    EmptyPool,
    TooSmall,
}

impl fmt::Display for SearchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchFailure::DepthExceeded => "depth exceeded",
            SearchFailure::NoValidConnection => "no valid connection",
            SearchFailure::NoPool => "connection has no pool",
            SearchFailure::EmptyPool => "pool is empty",
            SearchFailure::TooSmall => "too small",
        };
        f.write_str(name)
    }
}

/// Cooperative cancellation flag shared with whoever drives [`Generator`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Outcome of one [`Generator::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue,
    Finished(Result<(), GenerateError>),
}

#[derive(Debug)]
enum State {
    PickConnection,
    PickCandidate,
    Plan(Result<CandidateResult, SearchFailure>),
    Backtrack(SearchFailure),
    Finished(Result<(), GenerateError>),
}

/// One room on the search stack and the connection it is working on.
#[derive(Debug)]
struct Frame {
    node: NodeId,
    depth: usize,
    connection: Option<usize>,
    failures: u32,
    /// Candidates already committed for `connection`.
    tried: Vec<CandidateKey>,
    last_failure: Option<SearchFailure>,
}

impl Frame {
    fn new(node: NodeId, depth: usize) -> Self {
        Frame {
            node,
            depth,
            connection: None,
            failures: 0,
            tried: Vec::new(),
            last_failure: None,
        }
    }
}

/// Backtracking planner driven by an explicit frame stack.
pub struct Generator {
    config: GeneratorConfig,
    orchestrator: GenerationOrchestrator,
    policy: Box<dyn ConnectionPolicy>,
    rng: StdRng,
    stack: Vec<Frame>,
    state: State,
    restarts: u32,
    root_center: [f64; 3],
    started: Option<Instant>,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("state", &self.state)
            .field("stack", &self.stack.len())
            .field("restarts", &self.restarts)
            .finish()
    }
}

impl Generator {
    pub fn new(room_set: Arc<RoomSet>, config: GeneratorConfig) -> Self {
        Self::with_policy(room_set, config, BranchOutPolicy)
    }

    pub fn with_policy(room_set: Arc<RoomSet>, config: GeneratorConfig, policy: impl ConnectionPolicy + 'static) -> Self {
        let orchestrator = GenerationOrchestrator::new(room_set, &config);
        let root = orchestrator.root();
        let root_center = orchestrator
            .room(root)
            .map(|r| r.bounds().center())
            .unwrap_or_else(|| config.start_position.to_f64());
        Generator {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            orchestrator,
            policy: Box::new(policy),
            stack: vec![Frame::new(root, 0)],
            state: State::PickConnection,
            restarts: 0,
            root_center,
            started: None,
        }
    }

    /// Runs the search to completion and returns the planned rooms.
    pub fn generate(&mut self) -> Result<MappedTree<PlacedRoomRecord>, GenerateError> {
        self.generate_until(&CancellationToken::new())
    }

    /// Like [`generate`](Self::generate), checking `token` between steps.
    pub fn generate_until(&mut self, token: &CancellationToken) -> Result<MappedTree<PlacedRoomRecord>, GenerateError> {
        loop {
            if token.is_cancelled() {
                info!("generation cancelled after {}", self.stats());
                self.state = State::Finished(Err(GenerateError::Cancelled));
                return Err(GenerateError::Cancelled);
            }
            if let Step::Finished(result) = self.step() {
                return result.map(|()| self.placed_rooms());
            }
        }
    }

    /// Performs a single state transition.
    pub fn step(&mut self) -> Step {
        let started = *self.started.get_or_insert_with(Instant::now);
        let state = mem::replace(&mut self.state, State::PickConnection);
        trace!("step {:?} with {} frames", state, self.stack.len());
        match state {
            State::PickConnection => self.pick_connection(),
            State::PickCandidate => self.pick_candidate(),
            State::Plan(result) => self.plan(result),
            State::Backtrack(failure) => self.backtrack(failure),
            State::Finished(result) => self.state = State::Finished(result),
        }
        self.orchestrator.stats_mut().elapsed = started.elapsed();

        match &self.state {
            State::Finished(result) => Step::Finished(result.clone()),
            _ => Step::Continue,
        }
    }

    fn finish(&mut self, result: Result<(), GenerateError>) {
        match &result {
            Ok(()) => info!(
                "planned {} rooms: {}",
                self.orchestrator.tree().len(),
                self.orchestrator.stats()
            ),
            Err(e) => info!("generation failed: {} ({})", e, self.orchestrator.stats()),
        }
        self.state = State::Finished(result);
    }

    fn pick_connection(&mut self) {
        let Some(frame) = self.stack.last() else {
            self.finish(Ok(()));
            return;
        };
        let (node, depth) = (frame.node, frame.depth);
        let room = self
            .orchestrator
            .room(node)
            .unwrap_or_else(|| panic!("frame refers to node {} which is not in the tree", node));
        let open: Vec<usize> = room.open_connections().collect();

        if open.is_empty() {
            if depth > 0 && room.connectable_count() <= 1 {
                let heuristic = &self.config.heuristic;
                let p = too_small_probability(depth, self.config.max_depth, heuristic.steepness, heuristic.allowable);
                if self.rng.random::<f64>() < p {
                    debug!("`{}` at depth {} rejected as too small", room.blueprint_id(), depth);
                    self.state = State::Backtrack(SearchFailure::TooSmall);
                    return;
                }
            }
            trace!("`{}` at depth {} is complete", room.blueprint_id(), depth);
            self.stack.pop();
            self.orchestrator.stats_mut().ascends += 1;
            self.state = State::PickConnection;
            return;
        }

        let via = match self.config.connection_order {
            ConnectionOrder::Random => open[self.rng.random_range(0..open.len())],
            ConnectionOrder::FewestCandidates => self.fewest_candidates(node, &open),
        };
        if let Some(frame) = self.stack.last_mut() {
            frame.connection = Some(via);
            frame.failures = 0;
            frame.tried.clear();
            frame.last_failure = None;
        }
        self.state = State::PickCandidate;
    }

    fn fewest_candidates(&self, node: NodeId, open: &[usize]) -> usize {
        let mut best = (usize::MAX, open[0]);
        for &via in open {
            let count = self.orchestrator.count_candidates(node, via);
            if count < best.0 {
                best = (count, via);
            }
        }
        best.1
    }

    fn pick_candidate(&mut self) {
        let Some(frame) = self.stack.last() else {
            self.finish(Ok(()));
            return;
        };
        let (node, depth) = (frame.node, frame.depth);
        let Some(via) = frame.connection else {
            self.state = State::PickConnection;
            return;
        };
        if depth >= self.config.max_depth {
            self.state = State::Plan(Err(SearchFailure::DepthExceeded));
            return;
        }

        let pool = self
            .orchestrator
            .room(node)
            .and_then(|r| r.connection(via))
            .and_then(|c| c.pool.clone());
        // Only connectable connections are opened, unless a host reopens one.
        match pool {
            None => {
                self.state = State::Plan(Err(SearchFailure::NoPool));
                return;
            }
            Some(pool) if pool.is_empty() => {
                self.state = State::Plan(Err(SearchFailure::EmptyPool));
                return;
            }
            Some(_) => {}
        }

        let mut candidates = self.orchestrator.compute_candidates(node, via).candidates;
        candidates.retain(|c| !frame.tried.contains(&c.key()));
        let room = self
            .orchestrator
            .room(node)
            .unwrap_or_else(|| panic!("frame refers to node {} which is not in the tree", node));
        let ctx = SelectionContext {
            room,
            via,
            depth: depth + 1,
            max_depth: self.config.max_depth,
            root_center: self.root_center,
            heuristic: &self.config.heuristic,
        };
        let result = self.policy.satisfy(&ctx, candidates, &mut self.rng);
        self.state = State::Plan(result);
    }

    fn plan(&mut self, result: Result<CandidateResult, SearchFailure>) {
        let Some(frame) = self.stack.last_mut() else {
            self.finish(Ok(()));
            return;
        };
        match result {
            Ok(candidate) => {
                let (node, depth) = (frame.node, frame.depth);
                let Some(via) = frame.connection else {
                    self.state = State::PickConnection;
                    return;
                };
                frame.tried.push(candidate.key());
                let child = self.orchestrator.commit(node, via, &candidate);
                self.stack.push(Frame::new(child, depth + 1));
                let stats = self.orchestrator.stats_mut();
                stats.descends += 1;
                stats.max_depth_reached = stats.max_depth_reached.max(depth + 1);
                self.state = State::PickConnection;
            }
            Err(failure) => {
                // A retry that runs dry reports what sank the earlier children.
                let failure = match (failure, frame.last_failure) {
                    (SearchFailure::NoValidConnection, Some(previous)) => previous,
                    _ => failure,
                };
                self.state = State::Backtrack(failure);
            }
        }
    }

    fn backtrack(&mut self, failure: SearchFailure) {
        if self.stack.len() <= 1 {
            self.restart(failure);
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        self.orchestrator.stats_mut().ascends += 1;
        debug!("backtracking from depth {} ({})", frame.depth, failure);
        self.orchestrator.revert(frame.node);

        let Some(parent) = self.stack.last_mut() else {
            return;
        };
        parent.failures += 1;
        parent.last_failure = Some(failure);
        self.state = if parent.failures < self.config.max_local_failures {
            State::PickCandidate
        } else {
            State::Backtrack(failure)
        };
    }

    fn restart(&mut self, failure: SearchFailure) {
        if self.restarts >= self.config.max_restarts {
            self.finish(Err(GenerateError::Exhausted {
                restarts: self.restarts,
                last: failure,
            }));
            return;
        }
        self.restarts += 1;
        self.orchestrator.stats_mut().restarts = self.restarts;
        info!(
            "restarting from the root ({}/{}) after {}",
            self.restarts, self.config.max_restarts, failure
        );
        self.orchestrator.reset();
        self.stack = vec![Frame::new(self.orchestrator.root(), 0)];
        self.state = State::PickConnection;
    }

    /// Host-facing records of every planned room, shaped like the tree.
    pub fn placed_rooms(&self) -> MappedTree<PlacedRoomRecord> {
        self.orchestrator.tree().par_map(|room| PlacedRoomRecord::from(room))
    }

    pub fn tree(&self) -> &GenerationTree {
        self.orchestrator.tree()
    }

    pub fn orchestrator(&self) -> &GenerationOrchestrator {
        &self.orchestrator
    }

    pub fn stats(&self) -> &GenerationStats {
        self.orchestrator.stats()
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }
}
