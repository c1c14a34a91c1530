//! Saving and loading matches.
//!
//! A [`Snapshot`] is the plain-data form of a [`Match`]: the 24-entry occupancy,
//! which pieces carry the mill flag, per-player name / losses / phase, the turn
//! and the last-moved-to position. It is stored as JSON.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::board::Board;
use crate::constants::{FLYING_THRESHOLD, NUM_PLAYERS};
use crate::error::{GameError, InvariantError};
use crate::game::{Match, Phase};
use crate::piece::Color;
use crate::player::Player;
use crate::topology::{Point, validate};

/// Per-player part of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub name: String,
    /// Pieces this player has lost.
    pub captured: usize,
    pub phase: Phase,
}

/// Serializable match state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Occupancy by position; must have 24 entries.
    pub positions: Vec<Option<Color>>,
    /// Positions whose piece has its mill flag set.
    #[serde(default)]
    pub in_mill: Vec<Point>,
    /// Light first, then Dark.
    pub players: Vec<PlayerSnapshot>,
    pub current: Color,
    pub last_moved: Option<Point>,
    #[serde(default)]
    pub pending_capture: bool,
    #[serde(default)]
    pub winner: Option<Color>,
}

impl Match {
    /// Capture the full state of the match.
    pub fn snapshot(&self) -> Snapshot {
        let in_mill = self
            .board
            .topology()
            .positions()
            .filter(|&p| {
                self.board
                    .spot(p)
                    .ok()
                    .and_then(|s| s.piece())
                    .and_then(|r| self.players[r.owner.index()].piece(r.index))
                    .is_some_and(|piece| piece.is_in_mill())
            })
            .collect();

        Snapshot {
            positions: self.board.positions().to_vec(),
            in_mill,
            players: Color::ALL
                .iter()
                .map(|&c| PlayerSnapshot {
                    name: self.player(c).name().to_string(),
                    captured: self.player(c).captured(),
                    phase: self.phase(c),
                })
                .collect(),
            current: self.current,
            last_moved: self.last_moved,
            pending_capture: self.pending_capture,
            winner: self.winner,
        }
    }

    /// Rebuild a match from a snapshot, checking it for consistency.
    ///
    /// Only states that normal play can reach are accepted: phases must match
    /// the piece counts, a pending capture needs a completed mill and something
    /// to take, and a recorded winner needs a beaten opponent.
    pub fn restore(snapshot: &Snapshot) -> Result<Match, GameError> {
        if snapshot.players.len() != NUM_PLAYERS {
            return Err(inconsistent(format!(
                "expected {NUM_PLAYERS} players, got {}",
                snapshot.players.len()
            )));
        }
        if let Some(last) = snapshot.last_moved {
            validate(last)?;
        }

        let mut seats = Vec::with_capacity(NUM_PLAYERS);
        for (idx, saved) in snapshot.players.iter().enumerate() {
            let color =
                Color::from_index(idx).ok_or_else(|| inconsistent(format!("no seat {idx}")))?;
            let mut player = Player::new(saved.name.clone(), color);
            for _ in 0..saved.captured {
                player.increment_captured();
            }
            seats.push(player);
        }
        let mut players: [Player; NUM_PLAYERS] = seats
            .try_into()
            .map_err(|_| inconsistent("player seats do not fit the table".to_string()))?;

        let mut board = Board::new();
        board.set_positions(&snapshot.positions, &mut players)?;

        for &pos in &snapshot.in_mill {
            let Some(piece) = board.spot(pos)?.piece() else {
                return Err(inconsistent(format!("mill flag on empty position {pos}")));
            };
            players[piece.owner.index()].set_mill_status(piece.index, true);
        }

        let phases = Color::ALL.map(|c| snapshot.players[c.index()].phase);
        for c in Color::ALL {
            let phase = phases[c.index()];
            let player = &players[c.index()];
            if phase != Phase::Placing && !player.has_placed_all() {
                return Err(inconsistent(format!("{c} is {phase} with pieces still in hand")));
            }
            if phase == Phase::Flying && player.active_pieces() > FLYING_THRESHOLD {
                return Err(inconsistent(format!(
                    "{c} is flying with {} pieces on the board",
                    player.active_pieces()
                )));
            }
        }

        let mut game = Match {
            board,
            players,
            phases,
            current: snapshot.current,
            last_moved: snapshot.last_moved,
            pending_capture: snapshot.pending_capture,
            winner: snapshot.winner,
        };
        for c in Color::ALL {
            game.update_phase(c);
        }

        if game.pending_capture {
            if game.winner.is_some() {
                return Err(inconsistent("capture pending in a finished match".to_string()));
            }
            let Some(last) = game.last_moved else {
                return Err(inconsistent(
                    "a capture is pending but no piece has moved".to_string(),
                ));
            };
            if game.board.complete_mills(last, game.current)?.is_empty() {
                return Err(inconsistent(format!(
                    "a capture is pending but {} has no mill through {last}",
                    game.current
                )));
            }
            if game.removable().is_empty() {
                return Err(inconsistent(
                    "a capture is pending but there is nothing to capture".to_string(),
                ));
            }
        }
        if let Some(winner) = game.winner {
            let loser = winner.opponent();
            if !game.has_lost(loser) {
                return Err(inconsistent(format!(
                    "{winner} is recorded as winner but {loser} has not lost"
                )));
            }
        }
        Ok(game)
    }
}

fn inconsistent(message: String) -> GameError {
    InvariantError::Inconsistent(message).into()
}

/// Serialize a match to pretty-printed JSON.
pub fn to_json(game: &Match) -> Result<String> {
    serde_json::to_string_pretty(&game.snapshot()).context("failed to serialize match")
}

/// Parse and validate a match from JSON.
pub fn from_json(text: &str) -> Result<Match> {
    let snapshot: Snapshot = serde_json::from_str(text).context("malformed save data")?;
    Match::restore(&snapshot).context("save data is not a valid match")
}

/// Write a match to `path`.
pub fn save_to_file(game: &Match, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = to_json(game)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "match saved");
    Ok(())
}

/// Read a match from `path`.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Match> {
    let path = path.as_ref();
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let game = from_json(&text).with_context(|| format!("failed to load {}", path.display()))?;
    info!(path = %path.display(), "match loaded");
    Ok(game)
}
