//! Pseudo-legal and capture move generation (spec sec. 4.3).
//!
//! `generateLegal` is not a pure function of a single `GameState`: the
//! source filters by trial make/unmake against the live history stack, so
//! that step lives on `Engine` (`Engine::gen_legal_moves`), which already
//! owns the stack that make/unmake mutates. This module only produces
//! pseudo-legal and capture lists from a single snapshot.

use crate::game_state::GameState;
use crate::tables::tables;
use crate::types::{
    move_flags, file_of, on_board, rank_of, square_of, CastleRights, Color, Move, Piece,
    PieceKind, Square, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ,
};

/// Fixed-capacity inline move buffer (spec sec. 9: "a fixed-cap inline
/// buffer on the stack"). Exhaustion is a recoverable, logged condition
/// (spec sec. 7), not a panic: generation simply stops adding moves.
pub struct MoveList {
    moves: [Move; MoveList::CAPACITY],
    len: usize,
}

impl MoveList {
    pub const CAPACITY: usize = 256;

    pub fn new() -> Self {
        MoveList {
            moves: [Move::new(0, 0, 0, None); Self::CAPACITY],
            len: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, mv: Move) {
        if self.len < Self::CAPACITY {
            self.moves[self.len] = mv;
            self.len += 1;
        } else {
            tracing::warn!("move list buffer exhausted at {} moves; truncating", Self::CAPACITY);
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[Move] {
        &self.moves[..self.len]
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [Move] {
        &mut self.moves[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.as_slice().iter()
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

pub fn generate_pseudo_legal(gs: &GameState, out: &mut MoveList) {
    generate(gs, out, false);
}

/// Captures and promotions only (pawn pushes to the last rank are emitted
/// even without a capture, because they are forcing).
pub fn generate_captures(gs: &GameState, out: &mut MoveList) {
    generate(gs, out, true);
}

fn generate(gs: &GameState, out: &mut MoveList, only_captures: bool) {
    let side = gs.side_to_move;
    for sq in 0u8..64 {
        let Some(piece) = gs.squares[sq as usize] else {
            continue;
        };
        if piece.color != side {
            continue;
        }
        match piece.kind {
            PieceKind::Pawn => generate_pawn_moves(gs, sq, piece, out, only_captures),
            PieceKind::Knight => generate_stepper_moves(
                gs,
                sq,
                piece,
                &tables().knight_moves[sq as usize],
                out,
                only_captures,
            ),
            PieceKind::King => {
                generate_stepper_moves(
                    gs,
                    sq,
                    piece,
                    &tables().king_moves[sq as usize],
                    out,
                    only_captures,
                );
                if !only_captures {
                    generate_castles(gs, side, out);
                }
            }
            PieceKind::Bishop => generate_slider_moves(gs, sq, piece, DIAGONAL_SET, out, only_captures),
            PieceKind::Rook => generate_slider_moves(gs, sq, piece, STRAIGHT_SET, out, only_captures),
            PieceKind::Queen => {
                generate_slider_moves(gs, sq, piece, STRAIGHT_SET, out, only_captures);
                generate_slider_moves(gs, sq, piece, DIAGONAL_SET, out, only_captures);
            }
        }
    }

    if let Some(ep_target) = gs.en_passant {
        generate_en_passant(gs, side, ep_target, out);
    }
}

const STRAIGHT_SET: bool = true;
const DIAGONAL_SET: bool = false;

fn generate_slider_moves(
    gs: &GameState,
    from: Square,
    piece: Piece,
    straight: bool,
    out: &mut MoveList,
    only_captures: bool,
) {
    let t = tables();
    for dir in 0..4 {
        let ray = if straight {
            &t.straight_rays[from as usize][dir]
        } else {
            &t.diagonal_rays[from as usize][dir]
        };
        for &sq in ray {
            match gs.squares[sq as usize] {
                None => {
                    if !only_captures {
                        out.push(Move::new(from, sq, move_flags::NORMAL, None));
                    }
                }
                Some(other) => {
                    if other.color != piece.color {
                        out.push(Move::new(from, sq, move_flags::CAPTURE, None));
                    }
                    break;
                }
            }
        }
    }
}

fn generate_stepper_moves(
    gs: &GameState,
    from: Square,
    piece: Piece,
    destinations: &[Square],
    out: &mut MoveList,
    only_captures: bool,
) {
    for &sq in destinations {
        match gs.squares[sq as usize] {
            None => {
                if !only_captures {
                    out.push(Move::new(from, sq, move_flags::NORMAL, None));
                }
            }
            Some(other) => {
                if other.color != piece.color {
                    out.push(Move::new(from, sq, move_flags::CAPTURE, None));
                }
            }
        }
    }
}

fn generate_pawn_moves(
    gs: &GameState,
    from: Square,
    piece: Piece,
    out: &mut MoveList,
    only_captures: bool,
) {
    let (forward, start_rank, promotion_rank): (i16, u8, u8) = match piece.color {
        Color::White => (-1, 6, 0),
        Color::Black => (1, 1, 7),
    };
    let file = file_of(from) as i16;
    let rank = rank_of(from) as i16;

    // Single / double push.
    let push_rank = rank + forward;
    if on_board(file, push_rank) {
        let push_sq = square_of(file as u8, push_rank as u8);
        if gs.squares[push_sq as usize].is_none() {
            let is_promotion = push_rank as u8 == promotion_rank;
            if is_promotion {
                push_promotions(from, push_sq, move_flags::PAWN_MOVE, out);
            } else if !only_captures {
                out.push(Move::new(from, push_sq, move_flags::PAWN_MOVE, None));
                if rank as u8 == start_rank {
                    let double_rank = rank + 2 * forward;
                    let double_sq = square_of(file as u8, double_rank as u8);
                    if gs.squares[double_sq as usize].is_none() {
                        out.push(Move::new(
                            from,
                            double_sq,
                            move_flags::PAWN_MOVE | move_flags::TWO_SQUARE_PAWN,
                            None,
                        ));
                    }
                }
            }
        }
    }

    // Captures.
    for file_delta in [-1i16, 1i16] {
        let cap_file = file + file_delta;
        let cap_rank = rank + forward;
        if !on_board(cap_file, cap_rank) {
            continue;
        }
        let cap_sq = square_of(cap_file as u8, cap_rank as u8);
        if let Some(target_piece) = gs.squares[cap_sq as usize] {
            if target_piece.color != piece.color {
                let is_promotion = cap_rank as u8 == promotion_rank;
                let flags = move_flags::PAWN_MOVE | move_flags::CAPTURE;
                if is_promotion {
                    push_promotions(from, cap_sq, flags, out);
                } else {
                    out.push(Move::new(from, cap_sq, flags, None));
                }
            }
        }
    }
}

fn push_promotions(from: Square, to: Square, base_flags: u8, out: &mut MoveList) {
    for &promotion in PieceKind::PROMOTIONS.iter() {
        out.push(Move::new(
            from,
            to,
            base_flags | move_flags::PROMOTION,
            Some(promotion),
        ));
    }
}

fn generate_en_passant(gs: &GameState, side: Color, ep_target: Square, out: &mut MoveList) {
    let (capture_rank_delta, pawn_rank): (i16, u8) = match side {
        Color::White => (1, 3),
        Color::Black => (-1, 4),
    };
    let target_file = file_of(ep_target) as i16;
    let target_rank = rank_of(ep_target) as i16;
    // The capturing pawn sits one rank behind the ep target (from the
    // mover's perspective) on an adjacent file.
    let source_rank = target_rank + capture_rank_delta;
    if source_rank as u8 != pawn_rank {
        return;
    }
    for file_delta in [-1i16, 1i16] {
        let source_file = target_file + file_delta;
        if !on_board(source_file, source_rank) {
            continue;
        }
        let source_sq = square_of(source_file as u8, source_rank as u8);
        if let Some(piece) = gs.squares[source_sq as usize] {
            if piece.kind == PieceKind::Pawn && piece.color == side {
                out.push(Move::new(
                    source_sq,
                    ep_target,
                    move_flags::PAWN_MOVE | move_flags::CAPTURE | move_flags::EN_PASSANT,
                    None,
                ));
            }
        }
    }
}

fn generate_castles(gs: &GameState, side: Color, out: &mut MoveList) {
    if gs.in_check {
        return;
    }
    let (king_right, queen_right, king_from, king_side_to, queen_side_to, king_path, queen_path): (
        CastleRights,
        CastleRights,
        Square,
        Square,
        Square,
        [Square; 2],
        [Square; 3],
    ) = match side {
        Color::White => (CASTLE_WK, CASTLE_WQ, 60, 62, 58, [61, 62], [57, 58, 59]),
        Color::Black => (CASTLE_BK, CASTLE_BQ, 4, 6, 2, [5, 6], [1, 2, 3]),
    };

    if gs.castle_rights & king_right != 0 && king_path.iter().all(|&sq| gs.squares[sq as usize].is_none())
    {
        out.push(Move::new(king_from, king_side_to, move_flags::CASTLE, None));
    }
    if gs.castle_rights & queen_right != 0
        && queen_path.iter().all(|&sq| gs.squares[sq as usize].is_none())
    {
        out.push(Move::new(king_from, queen_side_to, move_flags::CASTLE, None));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::GameState;

    #[test]
    fn starting_position_has_twenty_pseudo_legal_moves() {
        crate::tables::generate_tables();
        let gs = GameState::new_game();
        let mut out = MoveList::new();
        generate_pseudo_legal(&gs, &mut out);
        assert_eq!(out.len(), 20);
    }

    #[test]
    fn captures_only_generator_emits_no_quiet_knight_moves() {
        crate::tables::generate_tables();
        let gs = GameState::new_game();
        let mut out = MoveList::new();
        generate_captures(&gs, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn pawn_promotion_expands_to_four_moves() {
        crate::tables::generate_tables();
        let gs = GameState::from_fen("8/4P3/8/8/8/8/4k3/4K3 w - - 0 1").unwrap();
        let mut out = MoveList::new();
        generate_pseudo_legal(&gs, &mut out);
        let promo_count = out
            .iter()
            .filter(|m| m.has_flag(move_flags::PROMOTION))
            .count();
        assert_eq!(promo_count, 4);
    }

    #[test]
    fn en_passant_move_generated_for_correct_pawn() {
        crate::tables::generate_tables();
        let gs =
            GameState::from_fen("rnbqkbnr/pp1ppppp/8/2pP4/8/8/PPP1PPPP/RNBQKBNR w KQkq c6 0 3")
                .unwrap();
        let mut out = MoveList::new();
        generate_pseudo_legal(&gs, &mut out);
        assert!(out
            .iter()
            .any(|m| m.has_flag(move_flags::EN_PASSANT) && m.to == square_of(2, 2)));
    }

    #[test]
    fn castling_blocked_by_occupied_intermediate_square() {
        crate::tables::generate_tables();
        let gs = GameState::from_fen("4k3/8/8/8/8/8/8/R3KB1R w KQ - 0 1").unwrap();
        let mut out = MoveList::new();
        generate_pseudo_legal(&gs, &mut out);
        assert!(!out.iter().any(|m| m.has_flag(move_flags::CASTLE) && m.to == 62));
    }
}
