//! Iterative deepening with an aspiration window around the previous
//! iteration's score (spec sec. 4.10).

use std::time::{Duration, Instant};

use rand::seq::IteratorRandom;

use crate::engine::Engine;
use crate::search::negamax::search;
use crate::search::quiescence::quiesce_quick;
use crate::search::transposition_table::{is_mate_score, WIN_SCORE};
use crate::search::SearchRuntime;
use crate::types::{Move, PieceKind};

const HALF_PAWN: i32 = crate::eval::PIECE_VALUE[PieceKind::Pawn as usize] / 2;

pub fn think(
    engine: &mut Engine,
    max_depth: i32,
    max_time_seconds: f64,
    show_thinking: bool,
    random_swing: i32,
) -> Option<Move> {
    // Step 1: reset per-call search state (spec sec. 4.10 step 1).
    engine.ordering.reset();

    // Step 2: wall-clock budget. A depth-only search gets an effectively
    // infinite budget so only the depth limit can end the loop.
    let budget = if max_time_seconds > 0.0 {
        Duration::from_secs_f64(max_time_seconds)
    } else {
        Duration::from_secs(3600 * 24)
    };
    let time_limited = max_time_seconds > 0.0;
    engine.runtime = SearchRuntime::new(budget, random_swing);

    let legal = engine.gen_legal_moves();
    if legal.is_empty() {
        return None;
    }
    let mut last_completed_move = legal[0];
    let mut last_completed_score = 0;

    let mut alpha = -WIN_SCORE;
    let mut beta = WIN_SCORE;

    let max_iter_depth = if max_depth > 0 { max_depth } else { i32::MAX };

    let mut iter_depth = 1;
    while iter_depth <= max_iter_depth {
        let iteration_start = Instant::now();
        let mut window_alpha = alpha;
        let mut window_beta = beta;

        let score = loop {
            engine.runtime.computers_move = None;
            let value = search(engine, 0, window_alpha, window_beta, iter_depth, true);
            if engine.runtime.timed_out {
                break None;
            }
            if value <= window_alpha {
                window_alpha = -WIN_SCORE;
                continue;
            }
            if value >= window_beta {
                window_beta = WIN_SCORE;
                continue;
            }
            break Some(value);
        };

        let score = match score {
            Some(s) => s,
            None => break,
        };

        if let Some(mv) = engine.runtime.computers_move {
            last_completed_move = mv;
            last_completed_score = engine.runtime.computers_score;
        } else {
            last_completed_score = score;
        }

        if show_thinking {
            engine.log_thinking_line(iter_depth, score, iteration_start.elapsed());
        }

        // Step: next iteration's window is centred on this iteration's
        // score, half a pawn either side.
        alpha = score - HALF_PAWN;
        beta = score + HALF_PAWN;

        if time_limited && engine.runtime.is_timed_out() {
            break;
        }
        if is_mate_score(score) {
            break;
        }
        iter_depth += 1;
    }

    if random_swing > 0 {
        last_completed_move = apply_random_swing(engine, last_completed_move, last_completed_score, random_swing);
    }

    Some(last_completed_move)
}

/// `randomSwing`: among root moves whose one-ply material-only evaluation
/// is within `random_swing` centipawns of the chosen move's, pick one at
/// random instead of always playing the engine's single best line. Mirrors
/// the teacher's habit of reaching for `rand` at the move-selection layer
/// (`engine_random.rs`'s `rand::rng()` + `choose`) rather than inside the
/// search itself.
fn apply_random_swing(engine: &mut Engine, best_move: Move, best_score: i32, random_swing: i32) -> Move {
    let legal = engine.gen_legal_moves();
    let mut candidates = Vec::with_capacity(legal.len());
    for mv in legal {
        if !crate::makemove::make_move(&mut engine.history, &mut engine.cursor, mv) {
            continue;
        }
        let eval = -quiesce_quick(engine, 1, -WIN_SCORE, WIN_SCORE);
        crate::makemove::unmake_move(&mut engine.cursor);
        if (eval - best_score).abs() <= random_swing {
            candidates.push(mv);
        }
    }
    let mut rng = rand::rng();
    candidates.into_iter().choose(&mut rng).unwrap_or(best_move)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Engine, EngineConfig};

    #[test]
    fn think_returns_a_legal_move_from_the_starting_position() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let mv = engine.think(3, 0.0, false, 0).expect("should find a move");
        assert!(engine.gen_legal_moves().contains(&mv));
    }

    #[test]
    fn think_finds_mate_in_one() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine
            .set_position("rnbqkbnr/pppp1ppp/8/4p3/5PP1/8/PPPPP2P/RNBQKBNR b KQkq - 0 2")
            .unwrap();
        let mv = engine.think(4, 0.0, false, 0).expect("should find mate");
        assert_eq!((mv.from, mv.to), (3, 39)); // Qd8-h4#
    }

    #[test]
    fn think_respects_a_tiny_time_budget() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let mv = engine.think(0, 0.05, false, 0);
        assert!(mv.is_some());
    }
}
