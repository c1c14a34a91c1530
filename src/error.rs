//! Error types for the rule engine.
//!
//! Two classes of failure are kept apart:
//! - [`RuleViolation`]: the requested action breaks a game rule. The driver reports
//!   it and asks again; no state has been touched.
//! - [`InvariantError`]: the caller broke the API contract (bad index, inconsistent
//!   restore data). These abort the operation.

use thiserror::Error;

use crate::piece::Color;
use crate::topology::Point;

/// A recoverable rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    #[error("position {} is already occupied", .0 + 1)]
    PositionOccupied(Point),
    #[error("there is no piece at position {}", .0 + 1)]
    EmptySource(Point),
    #[error("positions {} and {} are not adjacent", .from + 1, .to + 1)]
    NotAdjacent { from: Point, to: Point },
    #[error("the piece at position {} does not belong to {color}", .pos + 1)]
    NotOwned { pos: Point, color: Color },
    #[error("there is no piece to remove at position {}", .0 + 1)]
    EmptyPosition(Point),
    #[error("{0} has no pieces left to place")]
    NoPiecesLeft(Color),
    #[error("the piece at position {} is protected by a mill", .0 + 1)]
    ProtectedPiece(Point),
    #[error("position {} does not hold an opponent piece", .0 + 1)]
    NotOpponentPiece(Point),
    #[error("cannot {action} while {color} is {phase}")]
    WrongPhase {
        action: &'static str,
        color: Color,
        phase: &'static str,
    },
    #[error("a mill was formed: {0} must capture first")]
    CaptureRequired(Color),
    #[error("no capture is pending")]
    NoCapturePending,
    #[error("the match is over")]
    GameOver,
}

/// A structural error: the caller violated the engine's contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    #[error("invalid board position {0} (must be in 0..24)")]
    InvalidPosition(usize),
    #[error("board state must have 24 entries, got {0}")]
    BadLength(usize),
    #[error("{color} cannot have {on_board} pieces on the board with {captured} captured")]
    TooManyPieces {
        color: Color,
        on_board: usize,
        captured: usize,
    },
    #[error("inconsistent state: {0}")]
    Inconsistent(String),
}

/// Any failure raised by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    #[error(transparent)]
    Invariant(#[from] InvariantError),
}

impl GameError {
    /// True if the error is recoverable and the driver should simply ask again.
    pub fn is_rule_violation(&self) -> bool {
        matches!(self, GameError::Rule(_))
    }

    /// The rule violation, if that is what this is.
    pub fn as_rule(&self) -> Option<&RuleViolation> {
        match self {
            GameError::Rule(r) => Some(r),
            GameError::Invariant(_) => None,
        }
    }
}
