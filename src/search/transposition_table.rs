//! Fixed-size transposition table (spec sec. 4.6).
//!
//! Grounded on the teacher's `transposition_table.rs`: a flat
//! power-of-two-sized array indexed by the low bits of the full key,
//! depth-preferred replacement with a mate-score exception, and ply-relative
//! mate score storage so a cached mate is correctly interpreted from any
//! ply.

use crate::eval::PIECE_VALUE;
use crate::types::{Move, PieceKind};

pub const WIN_SCORE: i32 = 10_000_000;
/// Scores with magnitude at or above this are "mate scores": distance to
/// mate is folded into the score as `WIN_SCORE - ply`.
pub const MATE_THRESHOLD: i32 = WIN_SCORE - 1000;

#[inline]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_THRESHOLD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Exact,
    LowerBound,
    UpperBound,
}

#[derive(Debug, Clone, Copy)]
struct Record {
    key: u64,
    best_move: Option<Move>,
    score: i32,
    depth: i32,
    bound: Bound,
    next_key: u64,
}

const EMPTY_RECORD: Record = Record {
    key: 0,
    best_move: None,
    score: 0,
    depth: i32::MIN,
    bound: Bound::Exact,
    next_key: 0,
};

pub struct ProbeResult {
    pub best_move: Option<Move>,
    /// `Some(score)` only when the stored depth is sufficient for the
    /// probing depth (or the score is a mate score); otherwise the move is
    /// still usable for ordering but the score must not be trusted.
    pub score: Option<(i32, Bound)>,
    pub next_key: u64,
}

pub struct TranspositionTable {
    records: Vec<Record>,
    /// log2(records.len()); index = key & mask.
    mask: u64,
}

/// Default hash size in MiB (spec sec. 6.1: `hashSizeMB` default 512).
pub const DEFAULT_HASH_SIZE_MB: usize = 512;

impl TranspositionTable {
    pub fn with_size_mb(size_mb: usize) -> Self {
        let record_size = std::mem::size_of::<Record>().max(1);
        let budget_entries = (size_mb.max(1) * 1024 * 1024) / record_size;
        let capacity = budget_entries.next_power_of_two().max(1);
        TranspositionTable {
            records: vec![EMPTY_RECORD; capacity],
            mask: (capacity - 1) as u64,
        }
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key & self.mask) as usize
    }

    pub fn clear(&mut self) {
        for record in &mut self.records {
            *record = EMPTY_RECORD;
        }
    }

    pub fn probe(&self, key: u64, depth: i32, ply: i32) -> Option<ProbeResult> {
        let record = self.records[self.index(key)];
        if record.key != key || record.depth == i32::MIN {
            return None;
        }
        let score = if record.depth >= depth || is_mate_score(record.score) {
            Some((unfold_mate_score(record.score, ply), record.bound))
        } else {
            None
        };
        Some(ProbeResult {
            best_move: record.best_move,
            score,
            next_key: record.next_key,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn store(
        &mut self,
        key: u64,
        best_move: Option<Move>,
        score: i32,
        depth: i32,
        bound: Bound,
        next_key: u64,
        ply: i32,
    ) {
        let idx = self.index(key);
        let existing = self.records[idx];
        let mate = is_mate_score(score);
        if existing.depth == i32::MIN || existing.depth <= depth || mate {
            self.records[idx] = Record {
                key,
                best_move,
                score: fold_mate_score(score, ply),
                depth,
                bound,
                next_key,
            };
        }
    }
}

/// Convert a mate score found at absolute `ply` into a ply-independent
/// stored form (distance-to-mate from the *root*, not from this node).
#[inline]
fn fold_mate_score(score: i32, ply: i32) -> i32 {
    if !is_mate_score(score) {
        return score;
    }
    if score > 0 {
        score + ply
    } else {
        score - ply
    }
}

/// Inverse of [`fold_mate_score`]: reinterpret a stored mate score as seen
/// from the current `ply`.
#[inline]
fn unfold_mate_score(score: i32, ply: i32) -> i32 {
    if !is_mate_score(score) {
        return score;
    }
    if score > 0 {
        score - ply
    } else {
        score + ply
    }
}

pub fn classify_bound(score: i32, alpha_original: i32, beta: i32) -> Bound {
    if score >= beta {
        Bound::LowerBound
    } else if score <= alpha_original {
        Bound::UpperBound
    } else {
        Bound::Exact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{move_flags, Move};

    fn sample_move() -> Move {
        Move::new(12, 28, move_flags::PAWN_MOVE | move_flags::TWO_SQUARE_PAWN, None)
    }

    #[test]
    fn probe_after_store_round_trips_exact_score() {
        let mut tt = TranspositionTable::with_size_mb(1);
        tt.store(0xABCD, Some(sample_move()), 250, 6, Bound::Exact, 0x1234, 0);
        let probe = tt.probe(0xABCD, 4, 0).expect("should hit");
        assert_eq!(probe.best_move, Some(sample_move()));
        assert_eq!(probe.score, Some((250, Bound::Exact)));
    }

    #[test]
    fn shallower_probe_depth_returns_move_without_usable_score() {
        let mut tt = TranspositionTable::with_size_mb(1);
        tt.store(0xABCD, Some(sample_move()), 250, 4, Bound::Exact, 0, 0);
        let probe = tt.probe(0xABCD, 8, 0).expect("should hit on key");
        assert_eq!(probe.best_move, Some(sample_move()));
        assert!(probe.score.is_none());
    }

    #[test]
    fn mate_score_is_ply_adjusted_across_store_and_probe() {
        let mut tt = TranspositionTable::with_size_mb(1);
        let mate_in_two_from_here = WIN_SCORE - 2;
        tt.store(0x55, None, mate_in_two_from_here, 10, Bound::Exact, 0, 5);
        // Probed from a different ply, the absolute mate distance shifts.
        let probe = tt.probe(0x55, 1, 3).unwrap();
        let (score, _) = probe.score.unwrap();
        assert_eq!(score, mate_in_two_from_here + (5 - 3));
    }

    #[test]
    fn shallower_non_mate_store_does_not_overwrite_deeper_record() {
        let mut tt = TranspositionTable::with_size_mb(1);
        tt.store(0x9, Some(sample_move()), 100, 10, Bound::Exact, 0, 0);
        // Same key, shallower depth, not a mate score: must be rejected.
        tt.store(0x9, None, 50, 2, Bound::Exact, 0, 0);
        let probe = tt.probe(0x9, 10, 0).unwrap();
        assert_eq!(probe.best_move, Some(sample_move()));
        assert_eq!(probe.score, Some((100, Bound::Exact)));
    }

    #[test]
    fn piece_value_table_is_wired_for_downstream_scoring() {
        assert_eq!(PIECE_VALUE[PieceKind::Pawn.index()], 10_000);
    }
}
