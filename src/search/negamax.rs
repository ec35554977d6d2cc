//! Iterative-deepening's per-node workhorse: check extension, quiescence
//! descent, null-move pruning, PVS, and the transposition-table tail (spec
//! sec. 4.9).

use crate::engine::Engine;
use crate::eval::{Evaluator, PIECE_VALUE};
use crate::game_state::GameState;
use crate::movegen::{self, MoveList};
use crate::search::ordering;
use crate::search::quiescence::quiesce;
use crate::search::transposition_table::{self, Bound};
use crate::search::zobrist;
use crate::types::{Color, Move, PieceKind};

const DRAW_SCORE: i32 = 0;
/// Below this, the side to move is already being mated; null-move pruning
/// would be unsound (spec sec. 4.9: "beta > losing-mate-bound").
const LOSING_MATE_BOUND: i32 = -transposition_table::MATE_THRESHOLD;

pub fn search(engine: &mut Engine, ply: i32, alpha: i32, beta: i32, depth: i32, allow_null: bool) -> i32 {
    if engine.runtime.is_timed_out() {
        return 0;
    }

    let mut alpha = alpha;
    let mut beta = beta;
    let original_alpha = alpha;

    let state = engine.history[engine.cursor].clone();

    let mut depth = if state.in_check { depth + 1 } else { depth };

    if depth <= 0 {
        let score = quiesce(engine, ply, alpha, beta);
        if transposition_table::is_mate_score(score) {
            depth += 1;
        } else {
            return score;
        }
    }

    if state.is_draw {
        return DRAW_SCORE;
    }

    let key = zobrist::tt_key(&state);
    let probe = engine.tt.probe(key, depth, ply);
    let mut tt_move = probe.as_ref().and_then(|p| p.best_move);
    let mut tt_was_upperbound = false;
    if let Some(p) = &probe {
        if let Some((score, bound)) = p.score {
            match bound {
                Bound::Exact => return score,
                Bound::LowerBound => alpha = alpha.max(score),
                Bound::UpperBound => {
                    beta = beta.min(score);
                    tt_was_upperbound = true;
                }
            }
            if alpha >= beta {
                return score;
            }
        }
    }

    let side = state.side_to_move;
    let opponent = side.other();

    let static_material = engine.evaluator.material_only(&state);
    let mut mate_threat_extension = false;
    if ply > 1
        && allow_null
        && depth > 1
        && !state.in_check
        && !tt_was_upperbound
        && material_for(&state, side) > PIECE_VALUE[PieceKind::Bishop.index()]
        && material_for(&state, opponent) > 0
        && static_material + PIECE_VALUE[PieceKind::Pawn.index()] > beta
        && beta > LOSING_MATE_BOUND
    {
        let mut null_state = state.clone();
        null_state.side_to_move = opponent;
        null_state.en_passant = None;
        null_state.fifty_counter = 0;
        null_state.last_move = None;
        engine.cursor += 1;
        if engine.history.len() <= engine.cursor {
            engine.history.push(null_state);
        } else {
            engine.history[engine.cursor] = null_state;
        }
        let null_score = -search(engine, ply + 1, -beta, -beta + 1, depth - 3, false);
        engine.cursor -= 1;

        if null_score >= beta {
            return null_score;
        }
        if transposition_table::is_mate_score(null_score)
            && null_score < 0
            && material_for(&state, side) - material_for(&state, opponent) > beta
        {
            mate_threat_extension = true;
        }
    }
    if mate_threat_extension {
        depth += 1;
    }

    let mut list = MoveList::new();
    movegen::generate_pseudo_legal(&state, &mut list);
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
        |mv| {
            state.squares[mv.from as usize]
                .map(|p| p.kind)
                .unwrap_or(PieceKind::Pawn)
        },
    );

    let mut best = i32::MIN + 1;
    let mut best_move: Option<Move> = None;
    let mut best_next_key = 0u64;
    let mut legal_count = 0usize;

    let mut index = 0;
    while index < moves.len() {
        let mv = ordering::select_best(&mut moves, &mut scores, index);
        index += 1;

        if !crate::makemove::make_move(&mut engine.history, &mut engine.cursor, mv) {
            continue;
        }
        legal_count += 1;
        let next_key = zobrist::tt_key(&engine.history[engine.cursor]);

        let score = if legal_count == 1 {
            -search(engine, ply + 1, -beta, -alpha, depth - 1, true)
        } else {
            let zero_width = -search(engine, ply + 1, -alpha - 1, -alpha, depth - 1, true);
            if zero_width > alpha && zero_width < beta {
                -search(engine, ply + 1, -beta, -alpha, depth - 1, true)
            } else {
                zero_width
            }
        };
        crate::makemove::unmake_move(&mut engine.cursor);

        if score > best {
            best = score;
            best_move = Some(mv);
            best_next_key = next_key;
        }
        if ply == 0 && score > original_alpha && score < beta {
            engine.runtime.computers_move = Some(mv);
            engine.runtime.computers_score = score;
        }
        if best > alpha {
            alpha = best;
        }
        if alpha >= beta {
            break;
        }
    }

    if legal_count == 0 {
        return if state.in_check {
            -transposition_table::WIN_SCORE + ply
        } else {
            DRAW_SCORE
        };
    }

    if let Some(mv) = best_move {
        if best > original_alpha && mv.is_quiet() {
            engine.ordering.record_killer(ply.max(0) as usize, mv);
            engine.ordering.record_history(mv, depth);
        }
    }
    tt_move = best_move.or(tt_move);
    let bound = transposition_table::classify_bound(best, original_alpha, beta);
    engine
        .tt
        .store(key, tt_move, best, depth, bound, best_next_key, ply);

    best
}

fn material_for(gs: &GameState, color: Color) -> i32 {
    gs.squares
        .iter()
        .flatten()
        .filter(|p| p.color == color && p.kind != PieceKind::King)
        .map(|p| PIECE_VALUE[p.kind.index()])
        .sum()
}
