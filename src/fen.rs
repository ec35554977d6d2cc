//! FEN-like position setup and rendering (spec sec. 4.13, `[ADDED]`).
//!
//! Grounded on the teacher's `utils/fen_parser.rs` / `utils/fen_generator.rs`,
//! rewritten against the mailbox `GameState` instead of bitboards. Standard
//! FEN field order: piece placement, side to move, castling rights,
//! en-passant target, halfmove clock, fullmove number. The fullmove number
//! is accepted and rendered but not stored on `GameState` (spec's data model
//! has no field for it; `Engine` is the ply counter of record).

use crate::error::{ChessError, ChessResult};
use crate::game_state::GameState;
use crate::search::zobrist;
use crate::types::{
    square_of, CastleRights, Color, Piece, PieceKind, Square, CASTLE_BK, CASTLE_BQ, CASTLE_WK,
    CASTLE_WQ,
};

pub fn parse_fen(text: &str) -> ChessResult<GameState> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(ChessError::InvalidPosition(format!(
            "expected at least 4 FEN fields, got {}: {text:?}",
            fields.len()
        )));
    }

    let mut gs = GameState::empty();
    parse_placement(fields[0], &mut gs)?;
    gs.side_to_move = parse_side_to_move(fields[1])?;
    gs.castle_rights = parse_castling(fields[2])?;
    gs.en_passant = parse_en_passant(fields[3])?;
    gs.fifty_counter = fields
        .get(4)
        .map(|s| s.parse::<u16>())
        .transpose()
        .map_err(|_| ChessError::InvalidPosition(format!("bad halfmove clock in {text:?}")))?
        .unwrap_or(0);

    let white_king = find_king(&gs, Color::White)?;
    let black_king = find_king(&gs, Color::Black)?;
    gs.king_square = [white_king, black_king];

    gs.refresh_key();
    gs.in_check = crate::attacks::is_attacked(
        &gs,
        gs.king_square[gs.side_to_move.index()],
        gs.side_to_move.other(),
    );
    gs.is_draw = crate::draw::test_not_enough_material(&gs);

    Ok(gs)
}

pub fn generate_fen(gs: &GameState) -> String {
    let mut out = String::new();
    for rank in 0u8..8 {
        let mut empty_run = 0u8;
        for file in 0u8..8 {
            let sq = square_of(file, rank);
            match gs.squares[sq as usize] {
                None => empty_run += 1,
                Some(piece) => {
                    if empty_run > 0 {
                        out.push((b'0' + empty_run) as char);
                        empty_run = 0;
                    }
                    out.push(piece_letter(piece));
                }
            }
        }
        if empty_run > 0 {
            out.push((b'0' + empty_run) as char);
        }
        if rank != 7 {
            out.push('/');
        }
    }

    out.push(' ');
    out.push(match gs.side_to_move {
        Color::White => 'w',
        Color::Black => 'b',
    });

    out.push(' ');
    let mut castling = String::new();
    if gs.castle_rights & CASTLE_WK != 0 {
        castling.push('K');
    }
    if gs.castle_rights & CASTLE_WQ != 0 {
        castling.push('Q');
    }
    if gs.castle_rights & CASTLE_BK != 0 {
        castling.push('k');
    }
    if gs.castle_rights & CASTLE_BQ != 0 {
        castling.push('q');
    }
    out.push_str(if castling.is_empty() { "-" } else { &castling });

    out.push(' ');
    match gs.en_passant {
        Some(sq) => out.push_str(&square_name(sq)),
        None => out.push('-'),
    }

    out.push(' ');
    out.push_str(&gs.fifty_counter.to_string());
    out.push_str(" 1");

    out
}

fn parse_placement(field: &str, gs: &mut GameState) -> ChessResult<()> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(ChessError::InvalidPosition(format!(
            "expected 8 ranks in piece placement, got {}: {field:?}",
            ranks.len()
        )));
    }
    for (rank, rank_text) in ranks.iter().enumerate() {
        let mut file = 0u8;
        for ch in rank_text.chars() {
            if let Some(skip) = ch.to_digit(10) {
                file += skip as u8;
                continue;
            }
            if file >= 8 {
                return Err(ChessError::InvalidPosition(format!(
                    "rank {rank} overflows 8 files: {field:?}"
                )));
            }
            let piece = parse_piece_letter(ch)
                .ok_or_else(|| ChessError::InvalidPosition(format!("bad piece letter {ch:?}")))?;
            let sq = square_of(file, rank as u8);
            gs.squares[sq as usize] = Some(piece);
            file += 1;
        }
        if file != 8 {
            return Err(ChessError::InvalidPosition(format!(
                "rank {rank} does not cover 8 files: {field:?}"
            )));
        }
    }
    Ok(())
}

fn parse_piece_letter(ch: char) -> Option<Piece> {
    let color = if ch.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    let kind = match ch.to_ascii_lowercase() {
        'p' => PieceKind::Pawn,
        'n' => PieceKind::Knight,
        'b' => PieceKind::Bishop,
        'r' => PieceKind::Rook,
        'q' => PieceKind::Queen,
        'k' => PieceKind::King,
        _ => return None,
    };
    Some(Piece::new(kind, color))
}

fn piece_letter(piece: Piece) -> char {
    let lower = match piece.kind {
        PieceKind::Pawn => 'p',
        PieceKind::Knight => 'n',
        PieceKind::Bishop => 'b',
        PieceKind::Rook => 'r',
        PieceKind::Queen => 'q',
        PieceKind::King => 'k',
    };
    if piece.color == Color::White {
        lower.to_ascii_uppercase()
    } else {
        lower
    }
}

fn parse_side_to_move(field: &str) -> ChessResult<Color> {
    match field {
        "w" => Ok(Color::White),
        "b" => Ok(Color::Black),
        other => Err(ChessError::InvalidPosition(format!(
            "bad side-to-move field {other:?}"
        ))),
    }
}

fn parse_castling(field: &str) -> ChessResult<CastleRights> {
    if field == "-" {
        return Ok(0);
    }
    let mut rights: CastleRights = 0;
    for ch in field.chars() {
        rights |= match ch {
            'K' => CASTLE_WK,
            'Q' => CASTLE_WQ,
            'k' => CASTLE_BK,
            'q' => CASTLE_BQ,
            other => {
                return Err(ChessError::InvalidPosition(format!(
                    "bad castling-rights character {other:?}"
                )))
            }
        };
    }
    Ok(rights)
}

fn parse_en_passant(field: &str) -> ChessResult<Option<Square>> {
    if field == "-" {
        return Ok(None);
    }
    let mut chars = field.chars();
    let file_ch = chars
        .next()
        .ok_or_else(|| ChessError::InvalidPosition(format!("empty en-passant field {field:?}")))?;
    let rank_ch = chars
        .next()
        .ok_or_else(|| ChessError::InvalidPosition(format!("bad en-passant field {field:?}")))?;
    if chars.next().is_some() {
        return Err(ChessError::InvalidPosition(format!(
            "en-passant field too long: {field:?}"
        )));
    }
    if !('a'..='h').contains(&file_ch) || !('1'..='8').contains(&rank_ch) {
        return Err(ChessError::InvalidPosition(format!(
            "en-passant square out of range: {field:?}"
        )));
    }
    let file = file_ch as u8 - b'a';
    // FEN ranks count 1..8 bottom to top; our rank index 0 is rank 8.
    let rank = 8 - (rank_ch as u8 - b'0');
    Ok(Some(square_of(file, rank)))
}

fn square_name(square: Square) -> String {
    let file = crate::types::file_of(square);
    let rank = crate::types::rank_of(square);
    let file_ch = (b'a' + file) as char;
    let rank_ch = (b'0' + (8 - rank)) as char;
    format!("{file_ch}{rank_ch}")
}

fn find_king(gs: &GameState, color: Color) -> ChessResult<Square> {
    for sq in 0u8..64 {
        if let Some(piece) = gs.squares[sq as usize] {
            if piece.kind == PieceKind::King && piece.color == color {
                return Ok(sq);
            }
        }
    }
    Err(ChessError::InvalidPosition(format!(
        "no {color:?} king found on board"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_position_round_trips() {
        crate::tables::generate_tables();
        let gs = parse_fen(crate::game_state::STARTING_POSITION_FEN).unwrap();
        assert_eq!(generate_fen(&gs), crate::game_state::STARTING_POSITION_FEN);
    }

    #[test]
    fn en_passant_square_parses_to_correct_index() {
        crate::tables::generate_tables();
        let gs = parse_fen(
            "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
        )
        .unwrap();
        // d6 is file 3, FEN-rank 6 => our rank index 8-6=2 => square_of(3,2)=19
        assert_eq!(gs.en_passant, Some(square_of(3, 2)));
    }

    #[test]
    fn rejects_board_with_no_king() {
        crate::tables::generate_tables();
        let result = parse_fen("8/8/8/8/8/8/8/8 w - - 0 1");
        assert!(result.is_err());
    }

    #[test]
    fn castling_rights_parse_subset() {
        crate::tables::generate_tables();
        let gs = parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w Kq - 0 1").unwrap();
        assert_eq!(gs.castle_rights, CASTLE_WK | CASTLE_BQ);
    }
}
