//! A UCI chess engine.
//!
//! This crate implements the core of a chess engine: a hybrid
//! mailbox/bitboard board with incremental Zobrist hashing,
//! magic-bitboard move generation, a material/piece-square/king-
//! safety evaluation, and an iterative-deepening alpha-beta search
//! with a transposition table, killer moves, null-move and futility
//! pruning, principal-variation search, and aspiration windows.
//!
//! The UCI protocol adapter lives in the [`uci`] module and the
//! `lysander` binary is a thin wrapper around it. Programs can also
//! drive the engine directly:
//!
//! ```no_run
//! use lysander::Engine;
//! use lysander::search::{Limits, NullReporter};
//!
//! let mut engine = Engine::new();
//! engine.set_position_from_fen("6k1/5ppp/8/8/8/8/8/4R1K1 w - - 0 1").unwrap();
//!
//! let limits = Limits { depth: Some(6), ..Default::default() };
//! let result = engine.search(&limits, &mut NullReporter, None);
//! println!("bestmove {}", result.pv[0]);
//! ```

pub mod squares;
pub mod files;
pub mod ranks;
pub mod bitsets;
pub mod value;
pub mod depth;
pub mod board;
pub mod moves;
pub mod notation;
pub mod position;
pub mod search;
pub mod tablebase;
pub mod engine;
pub mod uci;

pub use crate::board::*;
pub use crate::depth::*;
pub use crate::engine::Engine;
pub use crate::moves::*;
pub use crate::position::Position;
pub use crate::value::*;
