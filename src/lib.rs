//! Morris-Rust: a rule engine for Nine Men's Morris.
//!
//! The crate models the standard 24-position board, the two players and their
//! nine pieces each, and the match state machine that runs placing, moving
//! and flying, mill captures and win detection. It does no I/O of its own
//! beyond the optional text protocol and JSON persistence; drivers call the
//! query/command operations on [`game::Match`].
//!
//! ## Modules
//!
//! - [`constants`] - Board topology tables and piece counts
//! - [`topology`] - Read-only adjacency and mill lookups
//! - [`piece`] - Colors, pieces and board spots
//! - [`player`] - Per-player piece pool and capture bookkeeping
//! - [`board`] - Occupancy, movement, mills and legality checks
//! - [`game`] - The match state machine
//! - [`error`] - Rule violations vs. structural errors
//! - [`persist`] - JSON snapshots, save and load
//! - [`protocol`] - Text command protocol for console drivers
//! - [`playout`] - Random self-play
//!
//! ## Example
//!
//! ```
//! use morris_rust::game::{Action, Match, TurnOutcome};
//! use morris_rust::piece::Color;
//!
//! let mut game = Match::new();
//! for to in [0, 9, 1, 10] {
//!     game.play(Action::Place { to }).unwrap();
//! }
//! // Light completes the top row and must capture
//! let outcome = game.play(Action::Place { to: 2 }).unwrap();
//! assert_eq!(outcome, TurnOutcome::CaptureRequired(Color::Light));
//! assert_eq!(game.capture(9).unwrap(), TurnOutcome::NextTurn(Color::Dark));
//! ```

pub mod board;
pub mod constants;
pub mod error;
pub mod game;
pub mod persist;
pub mod piece;
pub mod player;
pub mod playout;
pub mod protocol;
pub mod topology;
