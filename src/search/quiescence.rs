//! Full quiescence search, plus the cheaper "quick" material-only variant
//! used by the training pipeline (spec sec. 4.8; `[ADDED]` sec. 4.12).

use crate::engine::Engine;
use crate::eval::{Evaluator, PIECE_VALUE};
use crate::movegen::{self, MoveList};
use crate::search::ordering;
use crate::search::transposition_table::{self, Bound};
use crate::search::zobrist;
use crate::types::{Move, PieceKind};

const DRAW_SCORE: i32 = 0;
const PAWN_WINDOW: i32 = PIECE_VALUE[PieceKind::Pawn as usize];

/// Recursive negamax over forcing moves: captures, promotions, and (while
/// in check) all legal evasions.
pub fn quiesce(engine: &mut Engine, ply: i32, mut alpha: i32, mut beta: i32) -> i32 {
    if engine.runtime.is_timed_out() {
        return 0;
    }

    let state = engine.history[engine.cursor].clone();
    if state.is_draw {
        return DRAW_SCORE;
    }

    let key = zobrist::tt_key(&state);
    let probe = engine.tt.probe(key, 0, ply);
    let tt_move = probe.as_ref().and_then(|p| p.best_move);
    if let Some(p) = &probe {
        if let Some((score, bound)) = p.score {
            match bound {
                Bound::Exact => return score,
                Bound::LowerBound => alpha = alpha.max(score),
                Bound::UpperBound => beta = beta.min(score),
            }
            if alpha >= beta {
                return score;
            }
        }
    }

    let material_eval = engine.evaluator.material_only(&state);
    let stand_pat = if material_eval < alpha - PAWN_WINDOW || material_eval > beta + PAWN_WINDOW {
        material_eval
    } else {
        engine.evaluator.evaluate(&state)
    };
    engine.runtime.record_eval_bound(ply, stand_pat);

    if !state.in_check && stand_pat >= beta {
        engine
            .tt
            .store(key, tt_move, stand_pat, 0, Bound::LowerBound, 0, ply);
        return stand_pat;
    }

    let mut best = if state.in_check {
        -transposition_table::WIN_SCORE + ply
    } else {
        alpha = alpha.max(stand_pat);
        stand_pat
    };
    let original_alpha = alpha;
    let mut best_move: Option<Move> = None;
    let mut legal_found = false;

    let mut list = MoveList::new();
    if state.in_check {
        movegen::generate_pseudo_legal(&state, &mut list);
    } else {
        movegen::generate_captures(&state, &mut list);
    }

    let mut moves: Vec<Move> = list.iter().copied().collect();
    let mut scores = vec![0i32; moves.len()];
    ordering::score_moves(
        &engine.ordering,
        &moves,
        &mut scores,
        ply.max(0) as usize,
        tt_move,
        state.last_move,
        |mv| state.squares[mv.to as usize].map(|p| p.kind),
        |mv| state.squares[mv.from as usize].map(|p| p.kind).unwrap_or(PieceKind::Pawn),
    );

    let mut index = 0;
    while index < moves.len() {
        let mv = ordering::select_best(&mut moves, &mut scores, index);
        index += 1;

        if !crate::makemove::make_move(&mut engine.history, &mut engine.cursor, mv) {
            continue;
        }
        legal_found = true;
        let score = -quiesce(engine, ply + 1, -beta, -alpha);
        crate::makemove::unmake_move(&mut engine.cursor);

        if score > best {
            best = score;
            best_move = Some(mv);
        }
        if best > alpha {
            alpha = best;
        }
        if alpha >= beta {
            break;
        }
    }

    if state.in_check && !legal_found {
        return -transposition_table::WIN_SCORE + ply;
    }

    if let Some(mv) = best_move {
        if best > original_alpha {
            engine.ordering.record_quiescence_history(mv);
        }
    }

    let bound = transposition_table::classify_bound(best, original_alpha, beta);
    engine.tt.store(key, best_move.or(tt_move), best, 0, bound, 0, ply);
    best
}

/// Quick, material-only quiescence used by the external training pipeline
/// (spec sec. 4.12, `[ADDED]`): same shape as [`quiesce`], but the stand-pat
/// value and every recursive evaluation use `material_only` instead of the
/// full evaluator, and there is no TT interaction (training passes run
/// single positions, not a shared search tree).
pub fn quiesce_quick(engine: &mut Engine, ply: i32, mut alpha: i32, beta: i32) -> i32 {
    let state = engine.history[engine.cursor].clone();
    if state.is_draw {
        return DRAW_SCORE;
    }

    let stand_pat = engine.evaluator.material_only(&state);
    let mut best = if state.in_check {
        -transposition_table::WIN_SCORE + ply
    } else {
        alpha = alpha.max(stand_pat);
        stand_pat
    };

    let mut list = MoveList::new();
    if state.in_check {
        movegen::generate_pseudo_legal(&state, &mut list);
    } else {
        movegen::generate_captures(&state, &mut list);
    }

    let mut legal_found = false;
    for &mv in list.iter() {
        if !crate::makemove::make_move(&mut engine.history, &mut engine.cursor, mv) {
            continue;
        }
        legal_found = true;
        let score = -quiesce_quick(engine, ply + 1, -beta, -alpha);
        crate::makemove::unmake_move(&mut engine.cursor);
        if score > best {
            best = score;
        }
        if best > alpha {
            alpha = best;
        }
        if alpha >= beta {
            break;
        }
    }

    if state.in_check && !legal_found {
        return -transposition_table::WIN_SCORE + ply;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, EngineConfig};

    #[test]
    fn quiet_position_returns_stand_pat_material_balance() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let score = quiesce(&mut engine, 0, -transposition_table::WIN_SCORE, transposition_table::WIN_SCORE);
        assert_eq!(score, 0);
    }

    #[test]
    fn hanging_queen_capture_is_found() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        // White to move, black queen on e5 undefended, white rook on e1.
        engine
            .set_position("4k3/8/8/4q3/8/8/8/4R1K1 w - - 0 1")
            .unwrap();
        let score = quiesce(&mut engine, 0, -transposition_table::WIN_SCORE, transposition_table::WIN_SCORE);
        assert!(score >= PIECE_VALUE[PieceKind::Queen as usize] - PIECE_VALUE[PieceKind::Rook as usize]);
    }

    #[test]
    fn quiesce_quick_matches_material_only_in_quiet_position() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let score = quiesce_quick(&mut engine, 0, -transposition_table::WIN_SCORE, transposition_table::WIN_SCORE);
        assert_eq!(score, 0);
    }

    #[test]
    fn check_evasion_required_when_in_check() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine
            .set_position("4k3/8/8/8/8/8/4r3/3RK3 w - - 0 1")
            .unwrap();
        assert!(engine.in_check());
        let score = quiesce(&mut engine, 0, -transposition_table::WIN_SCORE, transposition_table::WIN_SCORE);
        // Rxe2 removes the checking rook; the side to move should not be
        // worse than roughly even after resolving the check.
        assert!(score > -PIECE_VALUE[PieceKind::Pawn as usize]);
    }
}
