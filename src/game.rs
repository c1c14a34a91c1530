//! The match state machine: turn order, per-player phases, the capture
//! sub-step and win detection.
//!
//! A turn is one of:
//! - `play(Place)` / `play(Move)` with no mill formed: the turn passes.
//! - `play(..)` forming a mill, then `capture(pos)`: the turn passes after the
//!   capture.
//!
//! A rejected action returns an error and leaves the match untouched, so the
//! driver can simply ask again.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::board::Board;
use crate::constants::MIN_PIECES_IN_PLAY;
use crate::error::{GameError, RuleViolation};
use crate::piece::Color;
use crate::player::Player;
use crate::topology::Point;

/// Per-player stage of the match.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Putting pieces from hand onto the board.
    Placing,
    /// Sliding pieces along lines to adjacent positions.
    Moving,
    /// Jumping pieces to any empty position.
    Flying,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Placing => "placing",
            Phase::Moving => "moving",
            Phase::Flying => "flying",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A board action for the player to move.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Put a piece from hand on `to`.
    Place { to: Point },
    /// Move the piece on `from` to `to`. A fly while the player is flying.
    Move { from: Point, to: Point },
}

impl Action {
    /// The position the piece ends up on.
    #[inline]
    pub fn to(&self) -> Point {
        match self {
            Action::Place { to } => *to,
            Action::Move { to, .. } => *to,
        }
    }
}

impl fmt::Display for Action {
    /// 1-indexed, as typed by a human.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Place { to } => write!(f, "place {}", to + 1),
            Action::Move { from, to } => write!(f, "move {} {}", from + 1, to + 1),
        }
    }
}

/// What the driver has to do next.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The given player is to move.
    NextTurn(Color),
    /// The given player formed a mill and must call [`Match::capture`].
    CaptureRequired(Color),
    /// The match is over.
    Won(Color),
}

/// A two-player match.
#[derive(Clone, Debug)]
pub struct Match {
    pub(crate) board: Board,
    pub(crate) players: [Player; 2],
    pub(crate) phases: [Phase; 2],
    pub(crate) current: Color,
    pub(crate) last_moved: Option<Point>,
    pub(crate) pending_capture: bool,
    pub(crate) winner: Option<Color>,
}

impl Default for Match {
    fn default() -> Self {
        Self::new()
    }
}

impl Match {
    pub fn new() -> Self {
        Self::with_names("Player 1", "Player 2")
    }

    /// A fresh match; `light` moves first.
    pub fn with_names(light: impl Into<String>, dark: impl Into<String>) -> Self {
        Self {
            board: Board::new(),
            players: [
                Player::new(light, Color::Light),
                Player::new(dark, Color::Dark),
            ],
            phases: [Phase::Placing; 2],
            current: Color::Light,
            last_moved: None,
            pending_capture: false,
            winner: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn player(&self, color: Color) -> &Player {
        &self.players[color.index()]
    }

    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    pub fn phase(&self, color: Color) -> Phase {
        self.phases[color.index()]
    }

    /// The player to act (or to capture, while a capture is pending).
    pub fn current(&self) -> Color {
        self.current
    }

    /// Where the last placed or moved piece landed.
    pub fn last_moved(&self) -> Option<Point> {
        self.last_moved
    }

    pub fn pending_capture(&self) -> bool {
        self.pending_capture
    }

    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Perform the current player's board action.
    #[instrument(skip(self), fields(color = %self.current))]
    pub fn play(&mut self, action: Action) -> Result<TurnOutcome, GameError> {
        self.ensure_can_act()?;
        let color = self.current;
        let idx = color.index();
        let phase = self.phases[idx];

        match (action, phase) {
            (Action::Place { to }, Phase::Placing) => {
                self.board.place(&mut self.players[idx], to)?;
            }
            (Action::Move { from, to }, Phase::Moving | Phase::Flying) => {
                let flying = self.may_fly(color);
                self.board
                    .move_piece(&mut self.players[idx], from, to, flying)?;
            }
            (Action::Place { .. }, _) => return Err(wrong_phase("place", color, phase)),
            (Action::Move { .. }, _) => return Err(wrong_phase("move", color, phase)),
        }
        debug!(%action, "action applied");

        let to = action.to();
        self.last_moved = Some(to);
        let mill = self.board.is_mill_formed(to, &mut self.players[idx])?;
        if mill {
            let opponent = color.opponent();
            if self.board.count(opponent) > 0 {
                info!(%color, pos = to + 1, "mill formed, capture pending");
                self.pending_capture = true;
                return Ok(TurnOutcome::CaptureRequired(color));
            }
            info!(%color, "mill formed but {opponent} has nothing to capture");
        }
        Ok(self.finish_turn())
    }

    /// Remove an opponent piece after forming a mill.
    #[instrument(skip(self), fields(color = %self.current))]
    pub fn capture(&mut self, pos: Point) -> Result<TurnOutcome, GameError> {
        if self.winner.is_some() {
            return Err(RuleViolation::GameOver.into());
        }
        if !self.pending_capture {
            return Err(RuleViolation::NoCapturePending.into());
        }
        let victim = self.current.opponent();
        self.board.capture(&mut self.players[victim.index()], pos)?;
        self.players[victim.index()].increment_captured();
        self.pending_capture = false;
        info!(
            color = %self.current,
            pos = pos + 1,
            left = self.players[victim.index()].active_pieces(),
            "captured {victim} piece"
        );
        Ok(self.finish_turn())
    }

    /// Positions the current player may capture, while a capture is pending.
    pub fn removable(&self) -> Vec<Point> {
        if !self.pending_capture || self.winner.is_some() {
            return Vec::new();
        }
        let victim = self.player(self.current.opponent());
        self.board.removable_opponent_pieces(victim)
    }

    /// Every board action the current player could legally take.
    pub fn legal_actions(&self) -> Vec<Action> {
        if self.pending_capture || self.winner.is_some() {
            return Vec::new();
        }
        let color = self.current;
        match self.phase(color) {
            Phase::Placing => {
                if self.player(color).available_to_place() == 0 {
                    return Vec::new();
                }
                self.board
                    .empty_positions()
                    .map(|to| Action::Place { to })
                    .collect()
            }
            Phase::Moving | Phase::Flying => {
                let flying = self.may_fly(color);
                let mut actions = Vec::new();
                for from in self.board.positions_of(color) {
                    for to in self.destinations(from, flying) {
                        actions.push(Action::Move { from, to });
                    }
                }
                actions
            }
        }
    }

    /// Does `color` have at least one legal move on the board?
    pub fn has_legal_move(&self, color: Color) -> bool {
        let flying = self.may_fly(color);
        self.board
            .positions_of(color)
            .any(|from| !self.destinations(from, flying).is_empty())
    }

    fn destinations(&self, from: Point, flying: bool) -> Vec<Point> {
        if flying {
            return self.board.empty_positions().collect();
        }
        self.board
            .adjacent_positions(from)
            .map(|adj| {
                adj.iter()
                    .copied()
                    .filter(|&p| self.board.is_empty(p).unwrap_or(false))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Flying is decided by the phase; the board's exactly-three reading is the
    /// second gate, as in [`Board::is_valid_move`].
    fn may_fly(&self, color: Color) -> bool {
        self.phase(color) == Phase::Flying || self.board.can_fly(color)
    }

    fn ensure_can_act(&self) -> Result<(), GameError> {
        if self.winner.is_some() {
            return Err(RuleViolation::GameOver.into());
        }
        if self.pending_capture {
            return Err(RuleViolation::CaptureRequired(self.current).into());
        }
        Ok(())
    }

    /// Pass the turn, update phases and look for a winner.
    fn finish_turn(&mut self) -> TurnOutcome {
        let acting = self.current;
        self.current = acting.opponent();
        self.update_phase(acting);
        self.update_phase(self.current);

        if self.has_lost(self.current) {
            info!(winner = %acting, name = self.player(acting).name(), "match over");
            self.winner = Some(acting);
            return TurnOutcome::Won(acting);
        }
        TurnOutcome::NextTurn(self.current)
    }

    pub(crate) fn update_phase(&mut self, color: Color) {
        let idx = color.index();
        let player = &self.players[idx];
        let before = self.phases[idx];
        let mut phase = before;

        if phase == Phase::Placing && player.has_placed_all() {
            phase = Phase::Moving;
        }
        if phase == Phase::Moving && player.can_fly() {
            phase = Phase::Flying;
        }
        if phase != before {
            info!(%color, from = %before, to = %phase, "phase change");
            self.phases[idx] = phase;
        }
    }

    /// A player loses with fewer than three pieces left in play, or when they
    /// are past placing and cannot move.
    pub(crate) fn has_lost(&self, color: Color) -> bool {
        let player = self.player(color);
        if player.pieces_in_play() < MIN_PIECES_IN_PLAY {
            return true;
        }
        match self.phase(color) {
            // Eighteen pieces never fill 24 positions.
            Phase::Placing => false,
            Phase::Moving | Phase::Flying => !self.has_legal_move(color),
        }
    }
}

fn wrong_phase(action: &'static str, color: Color, phase: Phase) -> GameError {
    RuleViolation::WrongPhase {
        action,
        color,
        phase: phase.as_str(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(game: &mut Match, to: Point) -> TurnOutcome {
        game.play(Action::Place { to }).unwrap()
    }

    #[test]
    fn test_new_match() {
        let game = Match::new();
        assert_eq!(game.current(), Color::Light);
        assert_eq!(game.phase(Color::Light), Phase::Placing);
        assert_eq!(game.phase(Color::Dark), Phase::Placing);
        assert_eq!(game.legal_actions().len(), 24);
        assert!(game.removable().is_empty());
        assert!(!game.is_over());
    }

    #[test]
    fn test_turns_alternate() {
        let mut game = Match::new();
        assert_eq!(place(&mut game, 0), TurnOutcome::NextTurn(Color::Dark));
        assert_eq!(place(&mut game, 5), TurnOutcome::NextTurn(Color::Light));
        assert_eq!(game.last_moved(), Some(5));
    }

    #[test]
    fn test_rejected_action_keeps_turn() {
        let mut game = Match::new();
        place(&mut game, 0);
        let err = game.play(Action::Place { to: 0 }).unwrap_err();
        assert_eq!(err, GameError::Rule(RuleViolation::PositionOccupied(0)));
        assert_eq!(game.current(), Color::Dark);
        assert_eq!(game.player(Color::Dark).active_pieces(), 0);
    }

    #[test]
    fn test_move_during_placing_is_rejected() {
        let mut game = Match::new();
        let err = game.play(Action::Move { from: 0, to: 1 }).unwrap_err();
        assert!(matches!(
            err,
            GameError::Rule(RuleViolation::WrongPhase { action: "move", .. })
        ));
    }

    #[test]
    fn test_mill_requires_capture() {
        let mut game = Match::new();
        place(&mut game, 0);
        place(&mut game, 9);
        place(&mut game, 1);
        place(&mut game, 10);
        assert_eq!(place(&mut game, 2), TurnOutcome::CaptureRequired(Color::Light));
        assert_eq!(game.current(), Color::Light);
        assert_eq!(game.removable(), vec![9, 10]);
        assert!(game.legal_actions().is_empty());

        let err = game.play(Action::Place { to: 3 }).unwrap_err();
        assert_eq!(err, GameError::Rule(RuleViolation::CaptureRequired(Color::Light)));

        assert_eq!(game.capture(9).unwrap(), TurnOutcome::NextTurn(Color::Dark));
        assert_eq!(game.player(Color::Dark).captured(), 1);
        assert_eq!(game.player(Color::Dark).active_pieces(), 1);
        assert_eq!(game.player(Color::Light).captured(), 0);
    }

    #[test]
    fn test_capture_without_mill() {
        let mut game = Match::new();
        place(&mut game, 0);
        assert_eq!(
            game.capture(0).unwrap_err(),
            GameError::Rule(RuleViolation::NoCapturePending)
        );
    }

    #[test]
    fn test_invalid_capture_keeps_pending() {
        let mut game = Match::new();
        for to in [0, 9, 1, 10, 2] {
            place(&mut game, to);
        }
        assert!(game.capture(0).is_err(), "own piece");
        assert!(game.capture(4).is_err(), "empty");
        assert!(game.capture(40).is_err(), "off the board");
        assert!(game.pending_capture());
        assert!(game.capture(10).is_ok());
        assert!(!game.pending_capture());
    }

    #[test]
    fn test_mill_with_nothing_to_capture() {
        // Light fills a mill before Dark has anything on the board is not
        // possible by alternation, so set the board up directly.
        let mut game = Match::new();
        let mut cells = [None; 24];
        cells[0] = Some(Color::Light);
        cells[1] = Some(Color::Light);
        let mut players = game.players.clone();
        game.board.set_positions(&cells, &mut players).unwrap();
        game.players = players;

        assert_eq!(place(&mut game, 2), TurnOutcome::NextTurn(Color::Dark));
        assert!(!game.pending_capture());
    }

    #[test]
    fn test_placing_to_moving() {
        let mut game = Match::new();
        // Non-interfering: Light on the outer and middle squares, Dark inside.
        let light = [0, 2, 3, 5, 9, 14, 18, 20, 22];
        let dark = [6, 8, 11, 12, 16, 4, 19, 23, 1];
        for i in 0..9 {
            place(&mut game, light[i]);
            if i < 8 {
                assert_eq!(game.phase(Color::Light), Phase::Placing);
            }
            place(&mut game, dark[i]);
        }
        assert_eq!(game.phase(Color::Light), Phase::Moving);
        assert_eq!(game.phase(Color::Dark), Phase::Moving);
        assert!(game.legal_actions().iter().all(|a| matches!(a, Action::Move { .. })));
        assert_eq!(
            game.play(Action::Place { to: 1 }).unwrap_err(),
            wrong_phase("place", Color::Light, Phase::Moving)
        );
    }

    #[test]
    fn test_boxed_in_while_placing_is_not_lost() {
        // Light's only piece is surrounded, but Light still has pieces in hand
        let mut game = Match::new();
        let mut cells = [None; 24];
        cells[0] = Some(Color::Light);
        cells[1] = Some(Color::Dark);
        cells[9] = Some(Color::Dark);
        let mut players = game.players.clone();
        game.board.set_positions(&cells, &mut players).unwrap();
        game.players = players;

        assert!(!game.has_legal_move(Color::Light));
        assert!(!game.has_lost(Color::Light));
        assert_eq!(place(&mut game, 5), TurnOutcome::NextTurn(Color::Dark));
    }

    #[test]
    fn test_game_over_rejects_actions() {
        let mut game = Match::new();
        game.winner = Some(Color::Light);
        assert_eq!(
            game.play(Action::Place { to: 0 }).unwrap_err(),
            GameError::Rule(RuleViolation::GameOver)
        );
        assert!(game.legal_actions().is_empty());
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::Place { to: 0 }.to_string(), "place 1");
        assert_eq!(Action::Move { from: 8, to: 23 }.to_string(), "move 9 24");
    }
}
