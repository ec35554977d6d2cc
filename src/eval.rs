//! Evaluation interface and the two evaluators wired into this crate (spec
//! sec. 6.2, `[ADDED]` sec. 4.14).
//!
//! `PIECE_VALUE` matches the source's scaling: one pawn is approximately
//! 10000 units, so search scores and evaluation scores share a unit system.
//! The training loop itself (TD-lambda over a game database) is out of
//! scope; what's preserved is the contract the core leans on: a scalar
//! score from the current position, and a hook to nudge every active
//! weight by a small offset (spec sec. 9: "gradient-style updates require
//! exposing an 'add this offset to every active weight' hook").

use crate::game_state::GameState;
use crate::types::PieceKind;

/// One pawn ~= 10000 units; mirrors the source's `PIECE_VALUE` table.
pub const PIECE_VALUE: [i32; 6] = [10000, 30000, 30000, 50000, 90000, 0];

pub trait Evaluator {
    /// Full evaluation (material plus any positional terms), from the
    /// side-to-move's perspective.
    fn evaluate(&self, gs: &GameState) -> i32;

    /// Material-only evaluation, used for quiescence's cheap stand-pat
    /// bound test and for the "quick" training-pipeline quiescence variant
    /// (sec. 4.12). Side-to-move's perspective.
    fn material_only(&self, gs: &GameState) -> i32;
}

fn material_balance(gs: &GameState) -> i32 {
    let mut total = 0i32;
    for square in gs.squares.iter().flatten() {
        let value = PIECE_VALUE[square.kind.index()];
        total += if square.color == gs.side_to_move {
            value
        } else {
            -value
        };
    }
    total
}

/// Material-only evaluator. No positional terms; `evaluate` and
/// `material_only` coincide.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaterialEvaluator;

impl Evaluator for MaterialEvaluator {
    fn evaluate(&self, gs: &GameState) -> i32 {
        material_balance(gs)
    }

    fn material_only(&self, gs: &GameState) -> i32 {
        material_balance(gs)
    }
}

/// Persisted evaluation weights (spec sec. 6.4): stage-indexed
/// piece-square tables, a king-distance table, and a handful of singular
/// weights, plus the four runtime feature flags that gate which terms
/// `evaluate` sums (spec sec. 9).
#[derive(Debug, Clone)]
pub struct TrainableWeights {
    /// `[stage][piece][square]`; stage 0 is opening-like, stage 1 endgame-like.
    pub piece_square: [[[i32; 64]; 6]; 2],
    /// Bonus/penalty indexed by Chebyshev distance between the two kings,
    /// 0..=7.
    pub king_distance: [i32; 8],
    /// Flat bonus for the side to move (tempo).
    pub tempo: i32,

    /// Use a sigmoid squashing function when training rather than a plain
    /// linear error signal.
    pub sigmoid_training: bool,
    /// Include the king-distance feature in `evaluate`.
    pub king_distance_features: bool,
    /// Include an empty-square mobility-style feature in `evaluate`.
    pub empty_square_features: bool,
    /// Skip positional terms entirely and fall back to material, for
    /// high-throughput training passes.
    pub super_fast_mode: bool,
}

impl Default for TrainableWeights {
    fn default() -> Self {
        TrainableWeights {
            piece_square: [[[0; 64]; 6]; 2],
            king_distance: [0; 8],
            tempo: 0,
            sigmoid_training: false,
            king_distance_features: false,
            empty_square_features: false,
            super_fast_mode: false,
        }
    }
}

impl TrainableWeights {
    fn stage_of(&self, gs: &GameState) -> usize {
        let non_pawn_material: i32 = gs
            .squares
            .iter()
            .flatten()
            .filter(|p| !matches!(p.kind, PieceKind::Pawn | PieceKind::King))
            .map(|p| PIECE_VALUE[p.kind.index()])
            .sum();
        // Endgame stage once non-pawn material drops below roughly two
        // rooks and a minor piece per side.
        if non_pawn_material < 2 * (PIECE_VALUE[PieceKind::Rook.index()] + PIECE_VALUE[PieceKind::Bishop.index()]) {
            1
        } else {
            0
        }
    }

    fn positional(&self, gs: &GameState) -> i32 {
        let stage = self.stage_of(gs);
        let mut score = 0i32;
        for (square, piece) in gs
            .squares
            .iter()
            .enumerate()
            .filter_map(|(sq, p)| p.map(|piece| (sq, piece)))
        {
            let table_square = match piece.color {
                crate::types::Color::White => square,
                crate::types::Color::Black => 63 - square,
            };
            let value = self.piece_square[stage][piece.kind.index()][table_square];
            score += if piece.color == gs.side_to_move {
                value
            } else {
                -value
            };
        }

        if self.king_distance_features {
            let white_king = gs.king_square[crate::types::Color::White.index()];
            let black_king = gs.king_square[crate::types::Color::Black.index()];
            let distance = chebyshev_distance(white_king, black_king);
            score += self.king_distance[distance as usize];
        }

        if self.empty_square_features {
            let empty_count = gs.squares.iter().filter(|s| s.is_none()).count() as i32;
            score += empty_count / 4;
        }

        score + self.tempo
    }

    /// Add `offset` to every weight this configuration currently activates
    /// (the gradient-update hook the external training loop drives).
    pub fn apply_offset(&mut self, offset: i32) {
        for stage in &mut self.piece_square {
            for piece in stage {
                for value in piece {
                    *value += offset;
                }
            }
        }
        if self.king_distance_features {
            for value in &mut self.king_distance {
                *value += offset;
            }
        }
        self.tempo += offset;
    }

    /// Train against `desired_output`, returning the squared error. When
    /// `sigmoid_training` is set, the predicted score is squashed into
    /// `[-1, 1]` before comparison; `learning_rate` scales the resulting
    /// offset applied via [`Self::apply_offset`].
    pub fn train(&mut self, gs: &GameState, desired_output: f64, learning_rate: f64) -> f64 {
        let predicted_raw = self.evaluate(gs) as f64;
        let predicted = if self.sigmoid_training {
            1.0 / (1.0 + (-predicted_raw / PIECE_VALUE[PieceKind::Pawn.index()] as f64).exp())
        } else {
            predicted_raw
        };
        let error = desired_output - predicted;
        let offset = (error * learning_rate) as i32;
        self.apply_offset(offset);
        error * error
    }
}

fn chebyshev_distance(a: crate::types::Square, b: crate::types::Square) -> u8 {
    let file_diff = (crate::types::file_of(a) as i16 - crate::types::file_of(b) as i16).unsigned_abs() as u8;
    let rank_diff = (crate::types::rank_of(a) as i16 - crate::types::rank_of(b) as i16).unsigned_abs() as u8;
    file_diff.max(rank_diff)
}

impl Evaluator for TrainableWeights {
    fn evaluate(&self, gs: &GameState) -> i32 {
        if self.super_fast_mode {
            return material_balance(gs);
        }
        material_balance(gs) + self.positional(gs)
    }

    fn material_only(&self, gs: &GameState) -> i32 {
        material_balance(gs)
    }
}
