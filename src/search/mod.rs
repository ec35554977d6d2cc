pub mod driver;
pub mod negamax;
pub mod ordering;
pub mod quiescence;
pub mod transposition_table;
pub mod zobrist;

use std::time::Instant;

/// Per-ply Zobrist/eval-bound scratch space, bounded the same way the
/// move-list buffer is: no per-node heap allocation during search (spec
/// sec. 5).
pub const MAX_SEARCH_PLY: usize = 128;

/// Search-call-scoped state: stats, timing, and the per-ply evaluation
/// trackers. Reset at the start of every `think` call (spec sec. 4.10 step
/// 1; sec. 9 "rewrite as an explicit value that the driver owns and
/// resets").
pub struct SearchRuntime {
    pub start: Instant,
    pub stop_time: Instant,
    pub timed_out: bool,
    pub nodes: u64,
    pub min_eval: [i32; MAX_SEARCH_PLY],
    pub max_eval: [i32; MAX_SEARCH_PLY],
    pub computers_move: Option<crate::types::Move>,
    pub computers_score: i32,
    pub random_swing: i32,
}

impl SearchRuntime {
    pub fn new(time_budget: std::time::Duration, random_swing: i32) -> Self {
        let start = Instant::now();
        SearchRuntime {
            start,
            stop_time: start + time_budget,
            timed_out: false,
            nodes: 0,
            min_eval: [i32::MAX; MAX_SEARCH_PLY],
            max_eval: [i32::MIN; MAX_SEARCH_PLY],
            computers_move: None,
            computers_score: 0,
            random_swing,
        }
    }

    /// Poll the deadline once per call into `search`/`quiesceSearch` (spec
    /// sec. 5: "polling granularity is one call to these functions per
    /// descent").
    pub fn is_timed_out(&mut self) -> bool {
        if self.timed_out {
            return true;
        }
        self.nodes += 1;
        if self.nodes % 2048 == 0 && Instant::now() >= self.stop_time {
            self.timed_out = true;
        }
        self.timed_out
    }

    /// Record this node's static evaluation and propagate it into the
    /// parent ply's min/max trackers (spec sec. 4.8: "propagate
    /// min/maxPositionEval[ply] up one ply").
    pub fn record_eval_bound(&mut self, ply: i32, value: i32) {
        let idx = (ply.max(0) as usize).min(MAX_SEARCH_PLY - 1);
        self.min_eval[idx] = self.min_eval[idx].min(value);
        self.max_eval[idx] = self.max_eval[idx].max(value);
        if idx > 0 {
            self.min_eval[idx - 1] = self.min_eval[idx - 1].min(value);
            self.max_eval[idx - 1] = self.max_eval[idx - 1].max(value);
        }
    }
}
