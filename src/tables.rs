//! Precomputed ray/attack lookup tables, built once and read-only afterwards.
//!
//! Grounded on the teacher's `search/zobrist.rs` use of `std::sync::OnceLock`
//! for idempotent, multi-instance-safe one-time initialization.
//!
//! `posData`'s "skip to next ray on blockage" trick (spec sec. 4.1) collapses
//! here to plain per-direction `Vec<Square>` iteration: each ray is already
//! stored as its own list in direction order, so the move generator simply
//! iterates one ray to its natural end (an occupied square or the slice end,
//! which stands in for the sentinel) and moves on to the next entry in the
//! `[Vec<Square>; 4]` array. No raw pointers or indices are needed to get the
//! same "cheap skip, no direction recompute" behaviour in safe Rust.

use std::sync::OnceLock;

use crate::types::{file_of, on_board, rank_of, Square};

pub const STRAIGHT_N: usize = 0;
pub const STRAIGHT_S: usize = 1;
pub const STRAIGHT_E: usize = 2;
pub const STRAIGHT_W: usize = 3;

pub const DIAGONAL_NE: usize = 0;
pub const DIAGONAL_NW: usize = 1;
pub const DIAGONAL_SE: usize = 2;
pub const DIAGONAL_SW: usize = 3;

const STRAIGHT_DELTAS: [(i16, i16); 4] = [(0, -1), (0, 1), (1, 0), (-1, 0)];
const DIAGONAL_DELTAS: [(i16, i16); 4] = [(1, -1), (-1, -1), (1, 1), (-1, 1)];
const KNIGHT_DELTAS: [(i16, i16); 8] = [
    (1, -2),
    (2, -1),
    (2, 1),
    (1, 2),
    (-1, 2),
    (-2, 1),
    (-2, -1),
    (-1, -2),
];
const KING_DELTAS: [(i16, i16); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

pub struct Tables {
    pub straight_rays: [[Vec<Square>; 4]; 64],
    pub diagonal_rays: [[Vec<Square>; 4]; 64],
    pub knight_moves: [Vec<Square>; 64],
    pub king_moves: [Vec<Square>; 64],
    /// `exposed_attack[king][other]`: direction index `0..=3` (straight,
    /// `STRAIGHT_*`) or `4..=7` (diagonal, `4 + DIAGONAL_*`) along which
    /// `other` lies on a ray from `king`, or `-1` if no such ray exists.
    pub exposed_attack: [[i8; 64]; 64],
    /// `knight_attack[from][target]`: does a knight on `from` attack `target`.
    pub knight_attack: [[bool; 64]; 64],
}

static TABLES: OnceLock<Tables> = OnceLock::new();

/// Populate all lookup tables. Idempotent and safe to call from multiple
/// independent `Engine` instances; the first caller does the work.
pub fn generate_tables() {
    TABLES.get_or_init(build_tables);
}

#[inline]
pub fn tables() -> &'static Tables {
    TABLES.get_or_init(build_tables)
}

fn walk_ray(square: Square, delta: (i16, i16)) -> Vec<Square> {
    let mut out = Vec::new();
    let mut file = file_of(square) as i16 + delta.0;
    let mut rank = rank_of(square) as i16 + delta.1;
    while on_board(file, rank) {
        out.push(crate::types::square_of(file as u8, rank as u8));
        file += delta.0;
        rank += delta.1;
    }
    out
}

fn build_tables() -> Tables {
    let mut straight_rays: [[Vec<Square>; 4]; 64] = std::array::from_fn(|_| Default::default());
    let mut diagonal_rays: [[Vec<Square>; 4]; 64] = std::array::from_fn(|_| Default::default());
    let mut knight_moves: [Vec<Square>; 64] = std::array::from_fn(|_| Default::default());
    let mut king_moves: [Vec<Square>; 64] = std::array::from_fn(|_| Default::default());

    for sq in 0u8..64 {
        for (dir, delta) in STRAIGHT_DELTAS.iter().enumerate() {
            straight_rays[sq as usize][dir] = walk_ray(sq, *delta);
        }
        for (dir, delta) in DIAGONAL_DELTAS.iter().enumerate() {
            diagonal_rays[sq as usize][dir] = walk_ray(sq, *delta);
        }

        let file = file_of(sq) as i16;
        let rank = rank_of(sq) as i16;
        for delta in KNIGHT_DELTAS.iter() {
            let f = file + delta.0;
            let r = rank + delta.1;
            if on_board(f, r) {
                knight_moves[sq as usize].push(crate::types::square_of(f as u8, r as u8));
            }
        }
        for delta in KING_DELTAS.iter() {
            let f = file + delta.0;
            let r = rank + delta.1;
            if on_board(f, r) {
                king_moves[sq as usize].push(crate::types::square_of(f as u8, r as u8));
            }
        }
    }

    let mut exposed_attack = [[-1i8; 64]; 64];
    for king in 0u8..64 {
        for dir in 0..4 {
            for &sq in &straight_rays[king as usize][dir] {
                exposed_attack[king as usize][sq as usize] = dir as i8;
            }
        }
        for dir in 0..4 {
            for &sq in &diagonal_rays[king as usize][dir] {
                exposed_attack[king as usize][sq as usize] = (4 + dir) as i8;
            }
        }
    }

    let mut knight_attack = [[false; 64]; 64];
    for from in 0u8..64 {
        for &to in &knight_moves[from as usize] {
            knight_attack[from as usize][to as usize] = true;
        }
    }

    Tables {
        straight_rays,
        diagonal_rays,
        knight_moves,
        king_moves,
        exposed_attack,
        knight_attack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_rays_have_expected_lengths() {
        generate_tables();
        let t = tables();
        // A8 = 0: straight south ray has 7 squares, north ray is empty.
        assert_eq!(t.straight_rays[0][STRAIGHT_N].len(), 0);
        assert_eq!(t.straight_rays[0][STRAIGHT_S].len(), 7);
        assert_eq!(t.straight_rays[0][STRAIGHT_E].len(), 7);
        assert_eq!(t.straight_rays[0][STRAIGHT_W].len(), 0);
    }

    #[test]
    fn knight_moves_from_corner() {
        generate_tables();
        let t = tables();
        // A8 corner: only two knight destinations.
        assert_eq!(t.knight_moves[0].len(), 2);
    }

    #[test]
    fn exposed_attack_is_symmetric_direction_pairs() {
        generate_tables();
        let t = tables();
        // From e4-like square (index 28), the square directly south should be
        // reachable via STRAIGHT_S.
        let king = 28u8;
        let south_sq = t.straight_rays[king as usize][STRAIGHT_S][0];
        assert_eq!(
            t.exposed_attack[king as usize][south_sq as usize],
            STRAIGHT_S as i8
        );
    }

    #[test]
    fn knight_attack_is_symmetric() {
        generate_tables();
        let t = tables();
        for from in 0u8..64 {
            for &to in &t.knight_moves[from as usize] {
                assert!(t.knight_attack[from as usize][to as usize]);
                assert!(t.knight_attack[to as usize][from as usize]);
            }
        }
    }
}
