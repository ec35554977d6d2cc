//! Attack tests (spec sec. 4.2).
//!
//! `is_attacked` is the full O(board) scan used for castling safety and
//! "am I now in check" queries. `single_attack` and `test_exposure` are the
//! cheap post-move checks used by make-move to avoid a full rescan on every
//! move (see `makemove.rs`).
//!
//! The source flags its own pawn-capture bound (`square <= 47` for White) as
//! possibly wrong. This rewrite derives the bound from first principles
//! (plain file/rank arithmetic with an on-board guard) instead of carrying
//! the suspicious literal forward; perft counts in `movegen.rs`'s tests cross
//! -check the result (spec sec. 9 open question).

use crate::game_state::GameState;
use crate::tables::tables;
use crate::types::{file_of, on_board, rank_of, square_of, Color, PieceKind, Square};

/// Does a piece of `attacker_color` attack `square` in the current position?
pub fn is_attacked(gs: &GameState, square: Square, attacker_color: Color) -> bool {
    let t = tables();

    for dir in 0..4 {
        for &sq in &t.straight_rays[square as usize][dir] {
            if let Some(piece) = gs.squares[sq as usize] {
                if piece.color == attacker_color
                    && matches!(piece.kind, PieceKind::Rook | PieceKind::Queen)
                {
                    return true;
                }
                break;
            }
        }
    }

    for dir in 0..4 {
        for &sq in &t.diagonal_rays[square as usize][dir] {
            if let Some(piece) = gs.squares[sq as usize] {
                if piece.color == attacker_color
                    && matches!(piece.kind, PieceKind::Bishop | PieceKind::Queen)
                {
                    return true;
                }
                break;
            }
        }
    }

    for &sq in &t.knight_moves[square as usize] {
        if let Some(piece) = gs.squares[sq as usize] {
            if piece.color == attacker_color && piece.kind == PieceKind::Knight {
                return true;
            }
        }
    }

    let pawn_rank_delta: i16 = if attacker_color == Color::White { 1 } else { -1 };
    let target_file = file_of(square) as i16;
    let target_rank = rank_of(square) as i16;
    for file_delta in [-1i16, 1i16] {
        let f = target_file + file_delta;
        let r = target_rank + pawn_rank_delta;
        if on_board(f, r) {
            let sq = square_of(f as u8, r as u8);
            if let Some(piece) = gs.squares[sq as usize] {
                if piece.color == attacker_color && piece.kind == PieceKind::Pawn {
                    return true;
                }
            }
        }
    }

    for &sq in &t.king_moves[square as usize] {
        if let Some(piece) = gs.squares[sq as usize] {
            if piece.color == attacker_color && piece.kind == PieceKind::King {
                return true;
            }
        }
    }

    false
}

/// Does the specific piece on `attacker_square` attack `target`? Does not
/// consider en-passant or castling; callers needing those fall back to
/// `is_attacked`.
pub fn single_attack(gs: &GameState, target: Square, attacker_square: Square) -> bool {
    let Some(piece) = gs.squares[attacker_square as usize] else {
        return false;
    };
    let t = tables();

    match piece.kind {
        PieceKind::Knight => t.knight_attack[attacker_square as usize][target as usize],
        PieceKind::King => t.king_moves[target as usize].contains(&attacker_square),
        PieceKind::Pawn => {
            let file_diff = (file_of(target) as i16 - file_of(attacker_square) as i16).abs();
            let rank_diff = rank_of(target) as i16 - rank_of(attacker_square) as i16;
            let forward = if piece.color == Color::White { -1 } else { 1 };
            file_diff == 1 && rank_diff == forward
        }
        PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => {
            let dir = t.exposed_attack[target as usize][attacker_square as usize];
            if dir < 0 {
                return false;
            }
            let is_straight = (dir as usize) < 4;
            if is_straight && piece.kind == PieceKind::Bishop {
                return false;
            }
            if !is_straight && piece.kind == PieceKind::Rook {
                return false;
            }
            let ray = ray_for_direction(target, dir);
            for &sq in ray {
                if gs.squares[sq as usize].is_some() {
                    return sq == attacker_square;
                }
            }
            false
        }
    }
}

/// Did removing whatever was on `evacuated_square` open a ray from an enemy
/// slider of `attacker_color` onto `target`?
pub fn test_exposure(
    gs: &GameState,
    target: Square,
    evacuated_square: Square,
    attacker_color: Color,
) -> bool {
    let t = tables();
    let dir = t.exposed_attack[target as usize][evacuated_square as usize];
    if dir < 0 {
        return false;
    }
    let is_straight = (dir as usize) < 4;
    let ray = ray_for_direction(target, dir);
    for &sq in ray {
        if let Some(piece) = gs.squares[sq as usize] {
            if piece.color != attacker_color {
                return false;
            }
            return match piece.kind {
                PieceKind::Queen => true,
                PieceKind::Rook => is_straight,
                PieceKind::Bishop => !is_straight,
                _ => false,
            };
        }
    }
    false
}

#[inline]
fn ray_for_direction(from: Square, dir: i8) -> &'static [Square] {
    let t = tables();
    if (dir as usize) < 4 {
        &t.straight_rays[from as usize][dir as usize]
    } else {
        &t.diagonal_rays[from as usize][(dir as usize) - 4]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::GameState;

    #[test]
    fn starting_position_has_no_attacks_on_kings() {
        crate::tables::generate_tables();
        let gs = GameState::new_game();
        assert!(!is_attacked(&gs, gs.king_square[0], Color::Black));
        assert!(!is_attacked(&gs, gs.king_square[1], Color::White));
    }

    #[test]
    fn rook_attacks_along_open_file() {
        crate::tables::generate_tables();
        // Rook on e4, black king on e8: the e-file between them is empty.
        let gs = GameState::from_fen("4k3/8/8/8/4R3/8/8/4K3 w - - 0 1").unwrap();
        assert!(is_attacked(&gs, gs.king_square[Color::Black.index()], Color::White));
    }

    #[test]
    fn single_attack_blocked_by_intervening_piece() {
        crate::tables::generate_tables();
        // Rook on h1, knight on g1: the knight blocks the rank between the
        // rook and the king on e1.
        let gs = GameState::from_fen("4k3/8/8/8/8/8/8/4K1NR w - - 0 1").unwrap();
        assert!(!single_attack(&gs, 60, 63));
    }

    #[test]
    fn exposure_detected_after_blocker_vacates_the_ray() {
        crate::tables::generate_tables();
        // White king on e1, black rook on e5, with e4 now empty (as it would
        // be right after the piece that was there moved away). test_exposure
        // is called post-move, so the evacuated square is already vacant.
        let gs = GameState::from_fen("4k3/8/8/4r3/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(test_exposure(&gs, gs.king_square[Color::White.index()], 36, Color::Black));
    }

    #[test]
    fn no_exposure_when_vacated_square_is_off_the_ray() {
        crate::tables::generate_tables();
        let gs = GameState::from_fen("4k3/8/8/4r3/8/8/8/4K3 w - - 0 1").unwrap();
        // Square 35 (d4) is not aligned with the king on e1, so it can't expose anything.
        assert!(!test_exposure(&gs, gs.king_square[Color::White.index()], 35, Color::Black));
    }
}
