//! Random playouts.
//!
//! Plays uniformly random legal actions (and random captures after a mill)
//! until one side wins or the turn limit is reached. Used by the `demo`
//! command and by the randomized invariant tests.

use tracing::debug;

use crate::error::GameError;
use crate::game::{Match, TurnOutcome};
use crate::piece::Color;

/// Default cap on the number of turns in a playout. Nine Men's Morris can
/// shuffle pieces back and forth forever.
pub const MAX_TURNS: usize = 400;

/// How a playout ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayoutResult {
    /// The winner, or `None` if the turn limit was hit first.
    pub winner: Option<Color>,
    /// Number of completed board actions.
    pub turns: usize,
    /// Number of captures made.
    pub captures: usize,
}

/// Play random legal actions from the current state of `game`.
pub fn random_game(
    game: &mut Match,
    rng: &mut fastrand::Rng,
    max_turns: usize,
) -> Result<PlayoutResult, GameError> {
    let mut turns = 0;
    let mut captures = 0;

    'turns: while !game.is_over() && turns < max_turns {
        let mut outcome = if game.pending_capture() {
            None
        } else {
            let actions = game.legal_actions();
            if actions.is_empty() {
                break;
            }
            let action = actions[rng.usize(..actions.len())];
            turns += 1;
            Some(game.play(action)?)
        };

        while game.pending_capture() {
            let targets = game.removable();
            if targets.is_empty() {
                break 'turns;
            }
            let pos = targets[rng.usize(..targets.len())];
            outcome = Some(game.capture(pos)?);
            captures += 1;
        }

        if let Some(TurnOutcome::Won(color)) = outcome {
            debug!(%color, turns, "playout won");
        }
    }

    Ok(PlayoutResult {
        winner: game.winner(),
        turns,
        captures,
    })
}
