//! Pieces, board spots and player colors.
//!
//! Ownership follows the game: each [`Player`](crate::player::Player) owns its
//! nine pieces and the [`Board`](crate::board::Board) owns the 24 spots. The two
//! sides refer to each other through plain handles: a spot stores a [`PieceRef`]
//! (owner color and index into that player's pieces) and a piece stores the
//! position of the spot it stands on.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::topology::Point;

/// One of the two seats. `Light` is color 0 and moves first.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Light,
    Dark,
}

impl Color {
    /// Both colors in seat order.
    pub const ALL: [Color; 2] = [Color::Light, Color::Dark];

    /// Seat index: 0 for Light, 1 for Dark.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Color::Light => 0,
            Color::Dark => 1,
        }
    }

    /// Color for a seat index.
    pub fn from_index(idx: usize) -> Option<Color> {
        match idx {
            0 => Some(Color::Light),
            1 => Some(Color::Dark),
            _ => None,
        }
    }

    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::Light => Color::Dark,
            Color::Dark => Color::Light,
        }
    }

    /// Board symbol used by the ASCII renderer.
    pub fn symbol(self) -> char {
        match self {
            Color::Light => 'O',
            Color::Dark => 'X',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Light => write!(f, "Light"),
            Color::Dark => write!(f, "Dark"),
        }
    }
}

/// Where a piece is in its lifecycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PieceState {
    /// Still in hand.
    Unplaced,
    /// Standing on the board.
    OnBoard(Point),
    /// Removed by a capture. Terminal.
    Captured,
}

/// A single token. Its owner never changes.
#[derive(Clone, Debug)]
pub struct Piece {
    owner: Color,
    state: PieceState,
    in_mill: bool,
}

impl Piece {
    pub fn new(owner: Color) -> Self {
        Self {
            owner,
            state: PieceState::Unplaced,
            in_mill: false,
        }
    }

    pub fn owner(&self) -> Color {
        self.owner
    }

    pub fn state(&self) -> PieceState {
        self.state
    }

    /// The position the piece stands on, if any.
    pub fn position(&self) -> Option<Point> {
        match self.state {
            PieceState::OnBoard(p) => Some(p),
            _ => None,
        }
    }

    pub fn is_placed(&self) -> bool {
        matches!(self.state, PieceState::OnBoard(_))
    }

    pub fn is_captured(&self) -> bool {
        self.state == PieceState::Captured
    }

    /// Set when the piece was part of a mill at the last evaluation.
    pub fn is_in_mill(&self) -> bool {
        self.in_mill
    }

    /// Put the piece on `pos`. Moving a piece clears its mill flag.
    pub(crate) fn place(&mut self, pos: Point) {
        debug_assert!(!self.is_captured(), "captured pieces never return");
        self.state = PieceState::OnBoard(pos);
        self.in_mill = false;
    }

    pub(crate) fn capture(&mut self) {
        self.state = PieceState::Captured;
        self.in_mill = false;
    }

    pub(crate) fn set_mill_status(&mut self, in_mill: bool) {
        self.in_mill = in_mill;
    }
}

/// Non-owning handle to a piece: its owner and its index in that player's pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PieceRef {
    pub owner: Color,
    pub index: usize,
}

/// A board cell.
#[derive(Clone, Debug)]
pub struct Spot {
    position: Point,
    piece: Option<PieceRef>,
}

impl Spot {
    pub fn new(position: Point) -> Self {
        Self {
            position,
            piece: None,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn piece(&self) -> Option<PieceRef> {
        self.piece
    }

    pub fn is_empty(&self) -> bool {
        self.piece.is_none()
    }

    /// Color of the occupying piece.
    pub fn occupant(&self) -> Option<Color> {
        self.piece.map(|r| r.owner)
    }

    pub(crate) fn put(&mut self, piece: PieceRef) {
        self.piece = Some(piece);
    }

    pub(crate) fn take(&mut self) -> Option<PieceRef> {
        self.piece.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_index_roundtrip() {
        for c in Color::ALL {
            assert_eq!(Color::from_index(c.index()), Some(c));
            assert_eq!(c.opponent().opponent(), c);
        }
        assert_eq!(Color::from_index(2), None);
    }

    #[test]
    fn test_piece_lifecycle() {
        let mut piece = Piece::new(Color::Dark);
        assert_eq!(piece.state(), PieceState::Unplaced);
        assert!(!piece.is_placed());

        piece.place(4);
        piece.set_mill_status(true);
        assert_eq!(piece.position(), Some(4));
        assert!(piece.is_in_mill());

        // Moving clears the mill flag
        piece.place(7);
        assert_eq!(piece.position(), Some(7));
        assert!(!piece.is_in_mill());

        piece.capture();
        assert!(piece.is_captured());
        assert_eq!(piece.position(), None);
        assert_eq!(piece.owner(), Color::Dark);
    }

    #[test]
    fn test_spot_occupancy() {
        let mut spot = Spot::new(5);
        assert!(spot.is_empty());
        spot.put(PieceRef {
            owner: Color::Light,
            index: 2,
        });
        assert_eq!(spot.occupant(), Some(Color::Light));
        assert_eq!(spot.take().map(|r| r.index), Some(2));
        assert!(spot.is_empty());
        assert_eq!(spot.position(), 5);
    }
}
