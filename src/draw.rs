//! Draw detection: threefold repetition, the weaker single-repetition test
//! used when reconstructing a PV from the transposition table, the
//! fifty-move rule, and insufficient material (spec sec. 4.5).

use crate::game_state::GameState;
use crate::search::zobrist;
use crate::types::PieceKind;

/// Half-moves since the last pawn move or capture below which no threefold
/// repetition is possible (spec sec. 4.5: "only invoked when fiftyCounter
/// >= 8").
const MIN_FIFTY_COUNTER_FOR_REPETITION: u16 = 8;

/// Scan the history backwards in steps of two plies (same side to move),
/// comparing the full position key (pieces + castle rights + en-passant).
/// Two earlier matches (three positions total, counting `current_ply`)
/// means a threefold repetition.
pub fn test_repetition(history: &[GameState], current_ply: usize) -> bool {
    let current = &history[current_ply];
    if current.fifty_counter < MIN_FIFTY_COUNTER_FOR_REPETITION {
        return false;
    }
    let target_key = zobrist::position_key(current);

    let mut matches = 0;
    let mut idx = current_ply as i64 - 4;
    while idx >= 0 {
        let distance = (current_ply - idx as usize) as u16;
        if distance > current.fifty_counter {
            break;
        }
        if zobrist::position_key(&history[idx as usize]) == target_key {
            matches += 1;
            if matches >= 2 {
                return true;
            }
        }
        idx -= 2;
    }
    false
}

/// Weaker repetition test used only to break cycles while replaying the
/// principal variation out of the transposition table: true if any single
/// earlier ply (stepping by four, i.e. same side to move and same mover
/// sequence) within the fifty-counter window matches the current
/// piece-occupancy key.
pub fn test_single_repetition(history: &[GameState], current_ply: usize, min_ply: usize) -> bool {
    let current = &history[current_ply];
    let mut idx = current_ply as i64 - 4;
    while idx >= min_ply as i64 {
        let distance = (current_ply - idx as usize) as u16;
        if distance > current.fifty_counter {
            break;
        }
        if history[idx as usize].key == current.key {
            return true;
        }
        idx -= 4;
    }
    false
}

/// Insufficient material: true iff neither side retains enough force to
/// force mate, given only bishops and knights remain on the board.
///
/// The source accepts "K+N+N vs K+N" as a draw, which is technically
/// winnable from some positions (helpmate-style sequences exist). This
/// rewrite preserves that behaviour rather than tightening it: the
/// practical false-positive rate is vanishingly small, and silently
/// diverging from a named, explicitly-flagged source behaviour without a
/// reason beyond "more correct" would make the TT's draw-score caching and
/// the search's draw detection disagree with what the rest of this exercise
/// calls ground truth. See DESIGN.md for the recorded decision.
pub fn test_not_enough_material(gs: &GameState) -> bool {
    let mut bishops = [0u8; 2];
    let mut knights = [0u8; 2];

    for square in gs.squares.iter().flatten() {
        match square.kind {
            PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
            PieceKind::Bishop => bishops[square.color.index()] += 1,
            PieceKind::Knight => knights[square.color.index()] += 1,
            PieceKind::King => {}
        }
    }

    (0..2).all(|side| {
        (bishops[side] == 0 && knights[side] <= 2) || (bishops[side] == 1 && knights[side] == 0)
    })
}
