// src/generation/stats.rs

use std::fmt;
use std::time::Duration;

/// Counters collected while planning. Purely informational.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationStats {
    pub rooms_placed: usize,
    pub rooms_reverted: usize,
    pub candidates_evaluated: usize,
    pub rejected_overlap: usize,
    pub rejected_vertical: usize,
    /// Frames pushed.
    pub descends: usize,
    /// Frames popped, whether finished or backtracked.
    pub ascends: usize,
    pub restarts: u32,
    pub max_depth_reached: usize,
    pub elapsed: Duration,
}

impl fmt::Display for GenerationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} placed, {} reverted, {} evaluated ({} overlapping, {} out of bounds), \
             {} descends, {} ascends, {} restarts, depth {}, {:.2?}",
            self.rooms_placed,
            self.rooms_reverted,
            self.candidates_evaluated,
            self.rejected_overlap,
            self.rejected_vertical,
            self.descends,
            self.ascends,
            self.restarts,
            self.max_depth_reached,
            self.elapsed
        )
    }
}
