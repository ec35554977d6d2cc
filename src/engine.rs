//! The caller-owned engine value (spec sec. 9: "bundle these into an
//! explicit `Engine` value owned by the caller, passed to every
//! operation"). Owns the history stack, transposition table, move-ordering
//! state, and the evaluator; exposes the operations listed in spec sec.
//! 6.1.

use std::time::Duration;

use tracing::{info, warn};

use crate::draw;
use crate::error::{ChessError, ChessResult};
use crate::eval::{Evaluator, MaterialEvaluator};
use crate::game_state::GameState;
use crate::movegen::{self, MoveList};
use crate::search::ordering::OrderingState;
use crate::search::transposition_table::TranspositionTable;
use crate::search::{driver, SearchRuntime};
use crate::types::{Color, Move, Square};

/// Upper bound on `max_plies_per_game`: generously above any real game
/// (spec sec. 4.11, `[ADDED]`).
const MAX_PLIES_CEILING: usize = 100_000;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub max_plies_per_game: usize,
    pub hash_size_mb: usize,
    pub use_cpu_time: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_plies_per_game: 1000,
            hash_size_mb: 512,
            use_cpu_time: false,
        }
    }
}

impl EngineConfig {
    fn validate(&self) -> ChessResult<()> {
        if self.max_plies_per_game == 0 || self.max_plies_per_game > MAX_PLIES_CEILING {
            return Err(ChessError::Configuration(format!(
                "max_plies_per_game {} out of range 1..={MAX_PLIES_CEILING}",
                self.max_plies_per_game
            )));
        }
        if self.hash_size_mb == 0 {
            return Err(ChessError::Configuration(
                "hash_size_mb must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) history: Vec<GameState>,
    pub(crate) cursor: usize,
    pub(crate) tt: TranspositionTable,
    pub(crate) ordering: OrderingState,
    pub(crate) evaluator: Box<dyn Evaluator + Send + Sync>,
    pub(crate) runtime: SearchRuntime,
}

impl Engine {
    /// `initEngine(config)`: allocate the history stack, build the
    /// lookup/Zobrist tables, allocate the TT.
    pub fn new(config: EngineConfig) -> ChessResult<Self> {
        config.validate()?;
        crate::tables::generate_tables();
        let history = Vec::with_capacity(config.max_plies_per_game.min(4096));
        Ok(Engine {
            history: {
                let mut h = history;
                h.push(GameState::new_game());
                h
            },
            cursor: 0,
            tt: TranspositionTable::with_size_mb(config.hash_size_mb),
            ordering: OrderingState::new(),
            evaluator: Box::new(MaterialEvaluator),
            runtime: SearchRuntime::new(Duration::from_secs(0), 0),
            config,
        })
    }

    pub fn set_evaluator(&mut self, evaluator: Box<dyn Evaluator + Send + Sync>) {
        self.evaluator = evaluator;
    }

    /// `newGame()`: reset to the standard starting position.
    pub fn new_game(&mut self) {
        self.history.clear();
        self.history.push(GameState::new_game());
        self.cursor = 0;
        self.tt.clear();
        self.ordering.reset();
    }

    /// `setPosition(fields)`: load a position from a FEN-like description.
    pub fn set_position(&mut self, fen: &str) -> ChessResult<()> {
        let gs = GameState::from_fen(fen)?;
        self.history.clear();
        self.history.push(gs);
        self.cursor = 0;
        Ok(())
    }

    pub fn render_fen(&self) -> String {
        self.history[self.cursor].to_fen()
    }

    pub fn current_state(&self) -> &GameState {
        &self.history[self.cursor]
    }

    /// `genLegalMoves()`: pseudo-legal generation filtered by trial
    /// make/unmake (spec sec. 4.3).
    pub fn gen_legal_moves(&mut self) -> Vec<Move> {
        let mut pseudo = MoveList::new();
        movegen::generate_pseudo_legal(&self.history[self.cursor], &mut pseudo);
        let mut legal = Vec::with_capacity(pseudo.len());
        for &mv in pseudo.iter() {
            if crate::makemove::make_move(&mut self.history, &mut self.cursor, mv) {
                crate::makemove::unmake_move(&mut self.cursor);
                legal.push(mv);
            }
        }
        legal
    }

    /// `makeMove(move) -> bool`. Returns `Err` only on the fatal,
    /// non-recoverable case of the history stack being exhausted; the
    /// ordinary "illegal move" case is the `Ok(false)` branch, matching
    /// spec sec. 6.1's boolean contract while surfacing the genuinely
    /// exceptional case through `ChessResult` (spec sec. 7: configuration /
    /// capacity errors are fatal, not a per-move boolean).
    pub fn make_move(&mut self, mv: Move) -> ChessResult<bool> {
        if self.cursor + 1 >= self.config.max_plies_per_game {
            return Err(ChessError::HistoryExhausted);
        }
        Ok(crate::makemove::make_move(&mut self.history, &mut self.cursor, mv))
    }

    /// `takeMoveBack()`.
    pub fn take_move_back(&mut self) {
        crate::makemove::unmake_move(&mut self.cursor);
    }

    pub fn current_key(&self) -> u64 {
        crate::search::zobrist::tt_key(&self.history[self.cursor])
    }

    pub fn is_attacked(&self, square: Square, side: Color) -> bool {
        crate::attacks::is_attacked(&self.history[self.cursor], square, side)
    }

    pub fn test_repetition(&self) -> bool {
        draw::test_repetition(&self.history, self.cursor)
    }

    pub fn test_not_enough_material(&self) -> bool {
        draw::test_not_enough_material(&self.history[self.cursor])
    }

    pub fn in_check(&self) -> bool {
        self.history[self.cursor].in_check
    }

    /// Leaf-node count at `depth` plies from the current position (spec
    /// sec. 8 reference counts); not part of the spec's external API, used
    /// by tests and benchmarks only.
    pub fn perft(&mut self, depth: u32) -> u64 {
        crate::perft::perft(&mut self.history, &mut self.cursor, depth)
    }

    /// `think(maxDepth, maxTimeSeconds, showThinking, randomSwing, weights)
    /// -> Move` (spec sec. 4.10, sec. 6.1).
    pub fn think(
        &mut self,
        max_depth: i32,
        max_time_seconds: f64,
        show_thinking: bool,
        random_swing: i32,
    ) -> Option<Move> {
        driver::think(self, max_depth, max_time_seconds, show_thinking, random_swing)
    }

    pub fn log_fatal_configuration_error(error: &ChessError) {
        tracing::error!(%error, "engine configuration rejected at startup");
    }

    pub(crate) fn log_truncated_history(&self) {
        warn!(
            cursor = self.cursor,
            max = self.config.max_plies_per_game,
            "history stack nearing configured capacity"
        );
    }

    pub(crate) fn log_new_game(&self) {
        info!("engine reset to a new game");
    }

    /// Emit one "thinking" line per completed iteration when requested
    /// (spec sec. 4.10 step 5: "emit a thinking line if requested").
    pub(crate) fn log_thinking_line(&self, depth: i32, score: i32, elapsed: Duration) {
        info!(depth, score, elapsed_ms = elapsed.as_millis() as u64, "iteration complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_max_plies() {
        let config = EngineConfig {
            max_plies_per_game: 0,
            ..EngineConfig::default()
        };
        assert!(Engine::new(config).is_err());
    }

    #[test]
    fn rejects_zero_hash_size() {
        let config = EngineConfig {
            hash_size_mb: 0,
            ..EngineConfig::default()
        };
        assert!(Engine::new(config).is_err());
    }

    #[test]
    fn starting_position_has_twenty_legal_moves() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        assert_eq!(engine.gen_legal_moves().len(), 20);
    }

    #[test]
    fn illegal_move_is_rejected_without_state_change() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let before = engine.current_state().clone();
        let bogus = Move::new(0, 63, crate::types::move_flags::NORMAL, None);
        assert_eq!(engine.make_move(bogus).unwrap(), false);
        assert_eq!(engine.current_state(), &before);
    }

    #[test]
    fn make_then_take_back_restores_position() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let before = engine.current_state().clone();
        let mv = engine.gen_legal_moves()[0];
        assert!(engine.make_move(mv).unwrap());
        engine.take_move_back();
        assert_eq!(engine.current_state(), &before);
    }

    #[test]
    fn scholars_mate_threat_is_not_yet_check() {
        // White's queen and bishop already bear on f7; black hasn't
        // defended yet, but it's black to move so no one is in check.
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine
            .set_position("rnbqkbnr/pppp1ppp/8/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 1 2")
            .unwrap();
        assert!(!engine.in_check());
        assert!(!engine.gen_legal_moves().is_empty());
    }

    fn find_move(engine: &mut Engine, from: Square, to: Square) -> Move {
        engine
            .gen_legal_moves()
            .into_iter()
            .find(|mv| mv.from == from && mv.to == to)
            .unwrap_or_else(|| panic!("no legal move {from}->{to}"))
    }

    #[test]
    fn knight_shuffle_triggers_threefold_repetition() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        // g1-f3, g8-f6, f3-g1, f6-g8, repeated twice: the starting position
        // recurs after each full cycle, for a third occurrence overall.
        for _ in 0..2 {
            let mv = find_move(&mut engine, 62, 45); // Ng1-f3
            assert!(engine.make_move(mv).unwrap());
            let mv = find_move(&mut engine, 6, 21); // Ng8-f6
            assert!(engine.make_move(mv).unwrap());
            let mv = find_move(&mut engine, 45, 62); // Nf3-g1
            assert!(engine.make_move(mv).unwrap());
            let mv = find_move(&mut engine, 21, 6); // Nf6-g8
            assert!(engine.make_move(mv).unwrap());
        }
        assert_eq!(engine.render_fen().split(' ').next(), Some(GameState::new_game().to_fen().split(' ').next().unwrap()));
        assert!(engine.test_repetition());
    }

    #[test]
    fn fifty_quiet_moves_each_side_triggers_the_fifty_move_rule() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        let mut at_f3 = false;
        for _ in 0..50 {
            let (from, to) = if at_f3 { (45, 62) } else { (62, 45) };
            let mv = find_move(&mut engine, from, to);
            assert!(engine.make_move(mv).unwrap());
            let (from, to) = if at_f3 { (21, 6) } else { (6, 21) };
            let mv = find_move(&mut engine, from, to);
            assert!(engine.make_move(mv).unwrap());
            at_f3 = !at_f3;
        }
        assert!(engine.current_state().is_draw);
        assert!(engine.current_state().fifty_counter >= 50);
    }
}
