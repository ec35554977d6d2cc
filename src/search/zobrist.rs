//! Zobrist hashing support for fast position identity and repetition tracking.
//!
//! The keys are generated from a fixed seed so hashes are deterministic
//! across runs. `GameState::key` stores only the piece-occupancy XOR term
//! (spec sec. 3): castling rights, en-passant, and side-to-move are XORed in
//! on demand by [`position_key`] (used for repetition/draw comparisons, which
//! step two plies at a time so side-to-move cancels out) and [`tt_key`]
//! (which additionally folds in the side-to-move word, for transposition
//! table lookups).
use std::sync::OnceLock;

use crate::game_state::GameState;
use crate::types::{CastleRights, Color, PieceKind, Square, PIECE_KINDS};

struct ZobristTables {
    piece_square: [[[u64; 64]; 6]; 2],
    side_to_move: u64,
    castling: [u64; 16],
    en_passant: [u64; 64],
}

static TABLES: OnceLock<ZobristTables> = OnceLock::new();

#[inline]
fn tables() -> &'static ZobristTables {
    TABLES.get_or_init(build_tables)
}

fn build_tables() -> ZobristTables {
    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;

    let mut piece_square = [[[0u64; 64]; 6]; 2];
    for color in &mut piece_square {
        for piece in color {
            for sq in piece {
                *sq = next_random_u64(&mut seed);
            }
        }
    }

    let side_to_move = next_random_u64(&mut seed);

    let mut castling = [0u64; 16];
    for key in &mut castling {
        *key = next_random_u64(&mut seed);
    }

    let mut en_passant = [0u64; 64];
    for key in &mut en_passant {
        *key = next_random_u64(&mut seed);
    }

    ZobristTables {
        piece_square,
        side_to_move,
        castling,
        en_passant,
    }
}

#[inline]
fn next_random_u64(state: &mut u64) -> u64 {
    // splitmix64
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[inline]
pub fn piece_square_key(color: Color, piece: PieceKind, square: Square) -> u64 {
    tables().piece_square[color.index()][piece.index()][square as usize]
}

#[inline]
pub fn castle_key(castle_rights: CastleRights) -> u64 {
    tables().castling[(castle_rights & 0x0F) as usize]
}

#[inline]
pub fn en_passant_key(square: Square) -> u64 {
    tables().en_passant[square as usize]
}

#[inline]
pub fn side_to_move_key() -> u64 {
    tables().side_to_move
}

/// Recompute the piece-occupancy-only key from scratch. Used to validate
/// incremental maintenance (Zobrist consistency, spec sec. 8) and to build a
/// fresh `GameState`.
pub fn compute_piece_key(game_state: &GameState) -> u64 {
    let mut key = 0u64;
    for sq in 0u8..64 {
        if let Some(piece) = game_state.squares[sq as usize] {
            key ^= piece_square_key(piece.color, piece.kind, sq);
        }
    }
    key
}

/// Full position key used for repetition / draw comparisons: pieces plus
/// castling rights plus en-passant square. Side-to-move is intentionally
/// excluded here because the threefold scan only ever compares plies with
/// the same side to move (spec sec. 4.5).
#[inline]
pub fn position_key(game_state: &GameState) -> u64 {
    let mut key = game_state.key ^ castle_key(game_state.castle_rights);
    if let Some(ep) = game_state.en_passant {
        key ^= en_passant_key(ep);
    }
    key
}

/// Full transposition-table key: [`position_key`] plus the side-to-move
/// word (spec sec. 4.6: "the full key (castle/ep/side-included)").
#[inline]
pub fn tt_key(game_state: &GameState) -> u64 {
    let mut key = position_key(game_state);
    if game_state.side_to_move == Color::Black {
        key ^= side_to_move_key();
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::GameState;

    #[test]
    fn starting_position_hash_is_deterministic() {
        crate::tables::generate_tables();
        let a = GameState::new_game();
        let b = GameState::new_game();
        assert_eq!(a.key, b.key);
        assert_eq!(compute_piece_key(&a), a.key);
    }

    #[test]
    fn side_to_move_only_changes_tt_key() {
        crate::tables::generate_tables();
        let mut w = GameState::new_game();
        let mut b = GameState::new_game();
        b.side_to_move = Color::Black;
        assert_eq!(position_key(&w), position_key(&b));
        assert_ne!(tt_key(&w), tt_key(&b));
        w.side_to_move = Color::White;
    }

    #[test]
    fn castling_rights_change_position_key() {
        crate::tables::generate_tables();
        let mut with_rights = GameState::new_game();
        let mut without_rights = with_rights.clone();
        without_rights.castle_rights = 0;
        assert_ne!(position_key(&with_rights), position_key(&without_rights));
        with_rights.castle_rights = with_rights.castle_rights;
    }
}
