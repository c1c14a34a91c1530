//! Per-player piece pool and capture bookkeeping.

use crate::constants::{FLYING_THRESHOLD, PIECES_PER_PLAYER};
use crate::piece::{Color, Piece, PieceRef, PieceState, Spot};
use crate::topology::Point;

/// A player: a name, a seat color and nine pieces.
///
/// `captured` counts the pieces this player has LOST. It shrinks the placement
/// budget, so a player who loses pieces during the opening places fewer.
#[derive(Clone, Debug)]
pub struct Player {
    name: String,
    color: Color,
    pieces: Vec<Piece>,
    captured: usize,
}

impl Player {
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            pieces: vec![Piece::new(color); PIECES_PER_PLAYER],
            captured: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, index: usize) -> Option<&Piece> {
        self.pieces.get(index)
    }

    /// Number of pieces this player has lost.
    pub fn captured(&self) -> usize {
        self.captured
    }

    /// Pieces currently on the board.
    pub fn active_pieces(&self) -> usize {
        self.pieces.iter().filter(|p| p.is_placed()).count()
    }

    /// Pieces still in hand.
    pub fn unplaced_count(&self) -> usize {
        self.pieces
            .iter()
            .filter(|p| p.state() == PieceState::Unplaced)
            .count()
    }

    /// Remaining placement budget: `max(0, 9 - captured) - placed`.
    pub fn available_to_place(&self) -> usize {
        PIECES_PER_PLAYER
            .saturating_sub(self.captured)
            .saturating_sub(self.active_pieces())
    }

    /// Pieces on the board plus pieces still to be placed.
    pub fn pieces_in_play(&self) -> usize {
        self.active_pieces() + self.available_to_place()
    }

    /// True once every piece the player is entitled to place is down.
    pub fn has_placed_all(&self) -> bool {
        self.active_pieces() >= PIECES_PER_PLAYER.saturating_sub(self.captured)
    }

    /// Player-level flying reading: three or fewer pieces on the board.
    ///
    /// Compare [`Board::can_fly`](crate::board::Board::can_fly), which requires
    /// exactly three.
    pub fn can_fly(&self) -> bool {
        self.active_pieces() <= FLYING_THRESHOLD
    }

    /// Bind the next unplaced piece to `spot`.
    ///
    /// Returns false, leaving everything untouched, when the placement budget is
    /// spent or the spot is taken.
    pub fn place_piece(&mut self, spot: &mut Spot) -> bool {
        if self.available_to_place() == 0 || !spot.is_empty() {
            return false;
        }
        let Some(index) = self
            .pieces
            .iter()
            .position(|p| p.state() == PieceState::Unplaced)
        else {
            return false;
        };
        self.pieces[index].place(spot.position());
        spot.put(PieceRef {
            owner: self.color,
            index,
        });
        true
    }

    /// Capture the piece standing on `spot`.
    ///
    /// Refuses (returns false) when the spot holds no piece of this player or the
    /// piece is protected by a mill. The fallback that allows taking protected
    /// pieces lives in the board.
    pub fn capture_piece(&mut self, spot: &mut Spot) -> bool {
        let Some(target) = spot.piece() else {
            return false;
        };
        if target.owner != self.color {
            return false;
        }
        match self.pieces.get(target.index) {
            Some(p) if p.position() == Some(spot.position()) && !p.is_in_mill() => {}
            _ => return false,
        }
        spot.take();
        self.pieces[target.index].capture();
        true
    }

    /// Record one more lost piece.
    pub fn increment_captured(&mut self) {
        self.captured += 1;
    }

    pub(crate) fn move_piece(&mut self, index: usize, to: Point) {
        self.pieces[index].place(to);
    }

    pub(crate) fn detach(&mut self, index: usize) {
        self.pieces[index].capture();
    }

    pub(crate) fn set_mill_status(&mut self, index: usize, in_mill: bool) {
        self.pieces[index].set_mill_status(in_mill);
    }

    /// Put every piece back in hand, keeping `captured` of them out for good.
    pub(crate) fn reset_pieces(&mut self, captured: usize) {
        self.captured = captured;
        for (i, piece) in self.pieces.iter_mut().enumerate() {
            *piece = Piece::new(self.color);
            if i < captured {
                piece.capture();
            }
        }
    }
}
