//! Move-path enumeration used for correctness regression tests and the
//! benchmark harness (spec sec. 8 reference counts).
//!
//! Not part of the public engine API surface the spec lists in sec. 6.1;
//! grounded on the teacher's own perft harness (`benches/perft_criterion.rs`),
//! adapted here to the mailbox/history-stack representation.

use crate::game_state::GameState;
use crate::movegen::{self, MoveList};

/// Count leaf nodes reachable in exactly `depth` plies from the state at
/// `history[*cursor]`, trial-making every pseudo-legal move and counting
/// only the ones `make_move` accepts.
pub fn perft(history: &mut Vec<GameState>, cursor: &mut usize, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut list = MoveList::new();
    movegen::generate_pseudo_legal(&history[*cursor], &mut list);

    let mut nodes = 0u64;
    for &mv in list.iter() {
        if !crate::makemove::make_move(history, cursor, mv) {
            continue;
        }
        nodes += perft(history, cursor, depth - 1);
        crate::makemove::unmake_move(cursor);
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_state::GameState;

    fn run(fen: &str, depth: u32) -> u64 {
        crate::tables::generate_tables();
        let gs = GameState::from_fen(fen).unwrap();
        let mut history = vec![gs];
        let mut cursor = 0usize;
        perft(&mut history, &mut cursor, depth)
    }

    #[test]
    fn starting_position_perft_depth_5() {
        assert_eq!(
            run("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 5),
            4_865_609
        );
    }

    /// "Kiwipete": all four castling rights pending for both sides.
    #[test]
    fn kiwipete_perft_depth_4() {
        assert_eq!(
            run(
                "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
                4
            ),
            4_085_603
        );
    }

    /// Classic en-passant-discovered-check position: the rook on h4 pins a
    /// pawn to its own king along the fourth rank, so the en passant
    /// capture that would expose the king must not be generated as legal.
    #[test]
    fn en_passant_pin_position_perft_depth_5() {
        assert_eq!(run("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 5), 674_624);
    }
}
