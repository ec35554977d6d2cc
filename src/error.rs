//! Errors used throughout the chess engine core.
//!
//! This module defines the canonical error type returned by configuration
//! and parsing code. Search and move-making use plain `bool`/`Option` return
//! values for expected control flow (illegal move, search timeout); see
//! `engine.rs` and `search/` for those. `ChessError` is reserved for the
//! fatal-at-startup and malformed-input cases spec'd in the error handling
//! design.
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    /// `maxPliesPerGame` or `hashSizeMB` outside allowed bounds.
    Configuration(String),
    /// A FEN-like position string did not parse.
    InvalidPosition(String),
    /// The pre-allocated history stack has no room for another ply.
    HistoryExhausted,
}

impl fmt::Display for ChessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChessError::Configuration(msg) => write!(f, "invalid engine configuration: {msg}"),
            ChessError::InvalidPosition(msg) => write!(f, "invalid position: {msg}"),
            ChessError::HistoryExhausted => {
                write!(f, "history stack exhausted (maxPliesPerGame reached)")
            }
        }
    }
}

impl Error for ChessError {}

pub type ChessResult<T> = Result<T, ChessError>;
