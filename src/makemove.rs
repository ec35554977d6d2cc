//! In-place make / unmake against a pre-allocated history stack (spec sec.
//! 4.4). Operates on `Engine`'s stack-discipline history: every mutation
//! lands on the new top-of-stack entry; illegality retreats the cursor and
//! leaves the previous entries untouched.

use crate::attacks;
use crate::draw;
use crate::game_state::GameState;
use crate::search::zobrist;
use crate::types::{move_flags, Color, Move, Piece, PieceKind};

/// Apply `mv` (assumed pseudo-legal from `history[*cursor]`) on top of the
/// stack. Returns `true` and advances `*cursor` on success; on illegality
/// restores `*cursor` to its original value and returns `false`. `history`
/// must have room for at least one more entry past `*cursor`.
pub fn make_move(history: &mut Vec<GameState>, cursor: &mut usize, mv: Move) -> bool {
    let side = history[*cursor].side_to_move;
    let opponent = side.other();
    let was_in_check = history[*cursor].in_check;

    let mut next = history[*cursor].clone();
    next.last_move = Some(mv);

    // Step 2: castling rook hop + attack check on traversed squares.
    if mv.has_flag(move_flags::CASTLE) {
        let (king_path, rook_from, rook_to) = castle_squares(side, mv.to);
        for sq in king_path {
            if attacks::is_attacked(&next, sq, opponent) {
                return false;
            }
        }
        let rook = next.squares[rook_from as usize].take();
        next.squares[rook_to as usize] = rook;
        if let Some(rook) = rook {
            next.key ^= zobrist::piece_square_key(rook.color, rook.kind, rook_from);
            next.key ^= zobrist::piece_square_key(rook.color, rook.kind, rook_to);
        }
    }

    // Step 3: king-square bookkeeping.
    if mv.from == next.king_square[side.index()] {
        next.king_square[side.index()] = mv.to;
    }

    // Step 4: castling rights update.
    next.castle_rights &= !rights_cleared_by(side, mv.from);
    next.castle_rights &= !rights_cleared_by(opponent, mv.to);
    if let Some(piece) = next.squares[mv.from as usize] {
        if piece.kind == PieceKind::King {
            next.castle_rights &= !side_rights_mask(side);
        }
    }

    // Step 5: en-passant square update.
    next.en_passant = if mv.has_flag(move_flags::TWO_SQUARE_PAWN) {
        Some(behind_square(side, mv.to))
    } else {
        None
    };

    // Step 6: fifty-move counter.
    if mv.has_flag(move_flags::PAWN_MOVE) || mv.has_flag(move_flags::CAPTURE) {
        next.fifty_counter = 0;
    } else {
        next.fifty_counter += 1;
    }

    // Step 7: apply the capture.
    let mut exposed_square = mv.from;
    if mv.has_flag(move_flags::EN_PASSANT) {
        let victim_square = behind_square(opponent, mv.to);
        if let Some(victim) = next.squares[victim_square as usize].take() {
            next.key ^= zobrist::piece_square_key(victim.color, victim.kind, victim_square);
        }
        exposed_square = victim_square;
    } else if mv.has_flag(move_flags::CAPTURE) {
        if let Some(victim) = next.squares[mv.to as usize].take() {
            next.key ^= zobrist::piece_square_key(victim.color, victim.kind, mv.to);
        }
    }

    // Step 8: move the piece (promotion substitutes the landed piece kind).
    let moving = next.squares[mv.from as usize]
        .take()
        .expect("make_move called with no piece on the source square");
    next.key ^= zobrist::piece_square_key(moving.color, moving.kind, mv.from);
    let landed = if let Some(promotion) = mv.promotion {
        Piece::new(promotion, moving.color)
    } else {
        moving
    };
    next.squares[mv.to as usize] = Some(landed);
    next.key ^= zobrist::piece_square_key(landed.color, landed.kind, mv.to);

    // Step 9: flip side to move.
    next.side_to_move = opponent;

    // Step 10: legality check against our own king.
    let own_king = next.king_square[side.index()];
    let opponent_king = next.king_square[opponent.index()];
    let self_in_check = if mv.has_flag(move_flags::CASTLE) {
        false
    } else if was_in_check || mv.to == opponent_king || moving.kind == PieceKind::King {
        // The king itself moved: its destination must be checked against
        // attacks from every direction, not just the ray through the
        // square it vacated.
        attacks::is_attacked(&next, own_king, opponent)
    } else {
        attacks::test_exposure(&next, own_king, exposed_square, opponent)
    };
    if self_in_check {
        return false;
    }

    // Commit `next` to the stack before step 11, since the repetition scan
    // needs it in place as `history[*cursor]`.
    *cursor += 1;
    if history.len() <= *cursor {
        history.push(next);
    } else {
        history[*cursor] = next;
    }

    // Step 11: draw / check flags on the new state.
    let is_draw = history[*cursor].fifty_counter >= 50
        || draw::test_not_enough_material(&history[*cursor])
        || draw::test_repetition(history, *cursor);

    if is_draw {
        history[*cursor].is_draw = true;
    } else {
        let opp_king = history[*cursor].king_square[opponent.index()];
        let state = &history[*cursor];
        let in_check = if mv.has_flag(move_flags::CASTLE) {
            let (_, _, rook_to) = castle_squares(side, mv.to);
            attacks::test_exposure(state, opp_king, rook_to, side)
        } else if mv.has_flag(move_flags::EN_PASSANT) {
            attacks::test_exposure(state, opp_king, exposed_square, side)
                || attacks::single_attack(state, opp_king, mv.to)
        } else {
            attacks::single_attack(state, opp_king, mv.to)
                || attacks::test_exposure(state, opp_king, mv.from, side)
        };
        history[*cursor].in_check = in_check;
        history[*cursor].is_draw = false;
    }

    true
}

/// Pop the top of the stack. No recomputation needed: every mutation lives
/// on the popped entry.
pub fn unmake_move(cursor: &mut usize) {
    *cursor -= 1;
}

fn castle_squares(side: Color, king_to: crate::types::Square) -> ([crate::types::Square; 2], crate::types::Square, crate::types::Square) {
    match (side, king_to) {
        (Color::White, 62) => ([61, 62], 63, 61), // king-side: rook h1 -> f1
        (Color::White, 58) => ([59, 58], 56, 59), // queen-side: rook a1 -> d1
        (Color::Black, 6) => ([5, 6], 7, 5),      // king-side: rook h8 -> f8
        (Color::Black, 2) => ([3, 2], 0, 3),      // queen-side: rook a8 -> d8
        _ => unreachable!("castle move with unexpected destination {king_to}"),
    }
}

fn rights_cleared_by(_side: Color, square: crate::types::Square) -> crate::types::CastleRights {
    use crate::types::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};
    match square {
        56 => CASTLE_WQ,
        63 => CASTLE_WK,
        0 => CASTLE_BQ,
        7 => CASTLE_BK,
        _ => 0,
    }
}

fn side_rights_mask(side: Color) -> crate::types::CastleRights {
    use crate::types::{CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ};
    match side {
        Color::White => CASTLE_WK | CASTLE_WQ,
        Color::Black => CASTLE_BK | CASTLE_BQ,
    }
}

#[inline]
fn behind_square(mover: Color, to: crate::types::Square) -> crate::types::Square {
    use crate::types::{rank_of, square_of, file_of};
    let file = file_of(to);
    let rank = rank_of(to) as i16;
    let behind_rank = match mover {
        Color::White => rank + 1,
        Color::Black => rank - 1,
    };
    square_of(file, behind_rank as u8)
}
