//! Board occupancy, piece movement and legality checks.
//!
//! The spots are the single source of truth for occupancy: the 24-entry
//! occupancy view returned by [`Board::positions`] is derived from them on
//! demand. Every mutation goes through one entry point that updates the spot
//! and the owning player's piece together, after all checks have passed.

use std::fmt;

use tracing::debug;

use crate::constants::{FLYING_THRESHOLD, NUM_MILLS, NUM_POSITIONS, PIECES_PER_PLAYER};
use crate::error::{GameError, InvariantError, RuleViolation};
use crate::piece::{Color, PieceRef, Spot};
use crate::player::Player;
use crate::topology::{Mill, Point, Registry, registry, validate};

/// The playing surface.
#[derive(Clone, Debug)]
pub struct Board {
    spots: Vec<Spot>,
    topology: &'static Registry,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// An empty board over the standard topology.
    pub fn new() -> Self {
        Self {
            spots: (0..NUM_POSITIONS).map(Spot::new).collect(),
            topology: registry(),
        }
    }

    pub fn topology(&self) -> &'static Registry {
        self.topology
    }

    pub fn spot(&self, pos: Point) -> Result<&Spot, InvariantError> {
        Ok(&self.spots[validate(pos)?])
    }

    /// Mutable access to a spot, for use with [`Player::place_piece`] and
    /// [`Player::capture_piece`].
    pub fn spot_mut(&mut self, pos: Point) -> Result<&mut Spot, InvariantError> {
        Ok(&mut self.spots[validate(pos)?])
    }

    pub fn occupant(&self, pos: Point) -> Result<Option<Color>, InvariantError> {
        Ok(self.spot(pos)?.occupant())
    }

    pub fn is_empty(&self, pos: Point) -> Result<bool, InvariantError> {
        Ok(self.spot(pos)?.is_empty())
    }

    pub fn is_owned_by(&self, pos: Point, color: Color) -> Result<bool, InvariantError> {
        Ok(self.occupant(pos)? == Some(color))
    }

    pub fn is_adjacent(&self, a: Point, b: Point) -> Result<bool, InvariantError> {
        self.topology.is_adjacent(a, b)
    }

    pub fn adjacent_positions(&self, pos: Point) -> Result<&'static [Point], InvariantError> {
        self.topology.neighbors(pos)
    }

    pub fn all_mills(&self) -> &[Mill; NUM_MILLS] {
        self.topology.all_mills()
    }

    /// Occupancy snapshot, indexed by position.
    pub fn positions(&self) -> [Option<Color>; NUM_POSITIONS] {
        std::array::from_fn(|i| self.spots[i].occupant())
    }

    /// Number of pieces of `color` on the board.
    pub fn count(&self, color: Color) -> usize {
        self.spots
            .iter()
            .filter(|s| s.occupant() == Some(color))
            .count()
    }

    /// Positions with no piece on them, in order.
    pub fn empty_positions(&self) -> impl Iterator<Item = Point> + '_ {
        self.spots.iter().filter(|s| s.is_empty()).map(Spot::position)
    }

    /// Positions held by `color`, in order.
    pub fn positions_of(&self, color: Color) -> impl Iterator<Item = Point> + '_ {
        self.spots
            .iter()
            .filter(move |s| s.occupant() == Some(color))
            .map(Spot::position)
    }

    /// Board-level flying reading: exactly three pieces of `color` on the board.
    ///
    /// [`Player::can_fly`] uses `<= 3` instead. The two only disagree below
    /// three pieces, where the match is already decided.
    pub fn can_fly(&self, color: Color) -> bool {
        self.count(color) == FLYING_THRESHOLD
    }

    /// Would moving `from -> to` be legal for `color`?
    ///
    /// Adjacency is waived when `flying` is set or [`Board::can_fly`] holds.
    pub fn is_valid_move(
        &self,
        from: Point,
        to: Point,
        color: Color,
        flying: bool,
    ) -> Result<bool, InvariantError> {
        validate(from)?;
        validate(to)?;
        if !self.is_owned_by(from, color)? || !self.is_empty(to)? {
            return Ok(false);
        }
        if flying || self.can_fly(color) {
            return Ok(true);
        }
        self.is_adjacent(from, to)
    }

    /// Place the next piece of `player` on `pos`.
    pub fn place(&mut self, player: &mut Player, pos: Point) -> Result<(), GameError> {
        validate(pos)?;
        if !self.is_empty(pos)? {
            return Err(RuleViolation::PositionOccupied(pos).into());
        }
        if player.available_to_place() == 0 {
            return Err(RuleViolation::NoPiecesLeft(player.color()).into());
        }
        if !player.place_piece(&mut self.spots[pos]) {
            return Err(InvariantError::Inconsistent(format!(
                "{} has budget but no piece in hand",
                player.color()
            ))
            .into());
        }
        debug!(color = %player.color(), pos, "placed piece");
        Ok(())
    }

    /// Move the piece on `from` to `to`.
    ///
    /// Adjacency is only enforced when `flying` is false; the caller decides
    /// whether the mover may fly.
    pub fn move_piece(
        &mut self,
        player: &mut Player,
        from: Point,
        to: Point,
        flying: bool,
    ) -> Result<(), GameError> {
        validate(from)?;
        validate(to)?;
        let Some(piece) = self.spots[from].piece() else {
            return Err(RuleViolation::EmptySource(from).into());
        };
        if piece.owner != player.color() {
            return Err(RuleViolation::NotOwned {
                pos: from,
                color: player.color(),
            }
            .into());
        }
        if !self.is_empty(to)? {
            return Err(RuleViolation::PositionOccupied(to).into());
        }
        if !flying && !self.is_adjacent(from, to)? {
            return Err(RuleViolation::NotAdjacent { from, to }.into());
        }
        self.check_link(player, piece, from)?;

        self.spots[from].take();
        self.spots[to].put(piece);
        player.move_piece(piece.index, to);
        debug!(color = %player.color(), from, to, flying, "moved piece");
        Ok(())
    }

    /// Take the piece on `pos` off the board for good, mill or not.
    pub fn remove(&mut self, owner: &mut Player, pos: Point) -> Result<(), GameError> {
        validate(pos)?;
        let Some(piece) = self.spots[pos].piece() else {
            return Err(RuleViolation::EmptyPosition(pos).into());
        };
        if piece.owner != owner.color() {
            return Err(RuleViolation::NotOwned {
                pos,
                color: owner.color(),
            }
            .into());
        }
        self.check_link(owner, piece, pos)?;

        self.spots[pos].take();
        owner.detach(piece.index);
        debug!(color = %owner.color(), pos, "removed piece");
        Ok(())
    }

    /// Capture the piece of `victim` on `pos`, honoring mill protection.
    ///
    /// Pieces in a mill may only be taken when every piece of the victim is in
    /// one (see [`Board::removable_opponent_pieces`]).
    pub fn capture(&mut self, victim: &mut Player, pos: Point) -> Result<(), GameError> {
        validate(pos)?;
        let Some(piece) = self.spots[pos].piece() else {
            return Err(RuleViolation::EmptyPosition(pos).into());
        };
        if piece.owner != victim.color() {
            return Err(RuleViolation::NotOpponentPiece(pos).into());
        }
        if !self.removable_opponent_pieces(victim).contains(&pos) {
            return Err(RuleViolation::ProtectedPiece(pos).into());
        }
        self.check_link(victim, piece, pos)?;

        let protected = victim.piece(piece.index).is_some_and(|p| p.is_in_mill());
        if protected {
            // Every piece of the victim is in a mill.
            return self.remove(victim, pos);
        }
        if !victim.capture_piece(&mut self.spots[pos]) {
            return Err(InvariantError::Inconsistent(format!(
                "capture at {pos} refused after validation"
            ))
            .into());
        }
        debug!(color = %victim.color(), pos, "captured piece");
        Ok(())
    }

    /// Mill lines through `last` that are fully held by `color`.
    pub fn complete_mills(&self, last: Point, color: Color) -> Result<Vec<Mill>, InvariantError> {
        let mut found = Vec::new();
        for mill in self.topology.mills_containing(last)? {
            if mill.iter().all(|&p| self.spots[p].occupant() == Some(color)) {
                found.push(mill);
            }
        }
        Ok(found)
    }

    /// Did the piece that just arrived on `last` complete a mill for `player`?
    ///
    /// Every piece on a completed line gets its mill flag set. Flags on lines
    /// that have since been broken are left alone; a piece only loses its flag
    /// when it moves.
    pub fn is_mill_formed(&self, last: Point, player: &mut Player) -> Result<bool, InvariantError> {
        let mills = self.complete_mills(last, player.color())?;
        for mill in &mills {
            for &p in mill {
                if let Some(piece) = self.spots[p].piece() {
                    player.set_mill_status(piece.index, true);
                }
            }
        }
        if !mills.is_empty() {
            debug!(color = %player.color(), last, count = mills.len(), "mill formed");
        }
        Ok(!mills.is_empty())
    }

    /// Positions of `opponent` that may be captured.
    ///
    /// Pieces in a mill are protected, unless all of the opponent's pieces are,
    /// in which case any of them may be taken.
    pub fn removable_opponent_pieces(&self, opponent: &Player) -> Vec<Point> {
        let color = opponent.color();
        let owned: Vec<Point> = self.positions_of(color).collect();
        let unprotected: Vec<Point> = owned
            .iter()
            .copied()
            .filter(|&p| {
                self.spots[p]
                    .piece()
                    .and_then(|r| opponent.piece(r.index))
                    .is_some_and(|piece| !piece.is_in_mill())
            })
            .collect();
        if unprotected.is_empty() {
            owned
        } else {
            unprotected
        }
    }

    /// Bulk restore of the occupancy, rebuilding the spot/piece links.
    ///
    /// The players keep their captured counts; all their other pieces go back
    /// in hand before the board is refilled. Nothing changes on error.
    pub fn set_positions(
        &mut self,
        positions: &[Option<Color>],
        players: &mut [Player; 2],
    ) -> Result<(), InvariantError> {
        if positions.len() != NUM_POSITIONS {
            return Err(InvariantError::BadLength(positions.len()));
        }
        for player in players.iter() {
            let color = player.color();
            let on_board = positions.iter().filter(|&&c| c == Some(color)).count();
            if on_board + player.captured() > PIECES_PER_PLAYER {
                return Err(InvariantError::TooManyPieces {
                    color,
                    on_board,
                    captured: player.captured(),
                });
            }
        }

        for spot in &mut self.spots {
            spot.take();
        }
        for player in players.iter_mut() {
            let captured = player.captured();
            player.reset_pieces(captured);
        }
        for (pos, cell) in positions.iter().enumerate() {
            if let Some(color) = cell {
                let player = &mut players[color.index()];
                if !player.place_piece(&mut self.spots[pos]) {
                    return Err(InvariantError::Inconsistent(format!(
                        "could not restore {color} piece at {pos}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Verify that spots and pieces point at each other.
    pub fn check_consistency(&self, players: &[Player; 2]) -> Result<(), InvariantError> {
        for spot in &self.spots {
            if let Some(r) = spot.piece() {
                let player = &players[r.owner.index()];
                self.check_link(player, r, spot.position())?;
            }
        }
        for player in players {
            for (index, piece) in player.pieces().iter().enumerate() {
                if let Some(pos) = piece.position() {
                    let expected = PieceRef {
                        owner: player.color(),
                        index,
                    };
                    if self.spots[pos].piece() != Some(expected) {
                        return Err(InvariantError::Inconsistent(format!(
                            "{} piece {index} claims position {pos}",
                            player.color()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_link(
        &self,
        player: &Player,
        piece: PieceRef,
        pos: Point,
    ) -> Result<(), InvariantError> {
        match player.piece(piece.index) {
            Some(p) if p.owner() == piece.owner && p.position() == Some(pos) => Ok(()),
            _ => Err(InvariantError::Inconsistent(format!(
                "spot {pos} and {} piece {} disagree",
                piece.owner, piece.index
            ))),
        }
    }

    /// Renderer symbol per position: the owner's symbol or `.` when empty.
    fn cell_labels(&self) -> impl Iterator<Item = String> + '_ {
        self.spots.iter().map(|s| match s.occupant() {
            Some(c) => c.symbol().to_string(),
            None => ".".to_string(),
        })
    }

    /// The board next to a 1-based position reference, for console drivers.
    pub fn render_with_reference(&self) -> String {
        let board = fill_template(self.cell_labels());
        let reference = fill_template((1..=NUM_POSITIONS).map(|i| i.to_string()));

        let mut out = String::new();
        out.push_str("          Game Board                  Position Reference\n");
        for (b, r) in board.iter().zip(&reference) {
            out.push_str(&format!("   {b}      {r}\n"));
        }
        out.push_str("\nO = Light, X = Dark, . = empty\n");
        out
    }
}

/// Board outline. Each `@` stands for one position, in order; labels are
/// right-aligned in two columns.
const TEMPLATE: &str = "\
@------------@------------@
 |             |             |
 |  @--------@--------@   |
 |   |         |         |   |
 |   |  @----@----@   |   |
 |   |   |           |   |   |
@--@--@          @--@--@
 |   |   |           |   |   |
 |   |  @----@----@   |   |
 |   |         |         |   |
 |  @--------@--------@   |
 |             |             |
@------------@------------@";

fn fill_template(mut labels: impl Iterator<Item = String>) -> Vec<String> {
    TEMPLATE
        .lines()
        .map(|line| {
            let mut out = String::with_capacity(line.len() + 8);
            let mut prev = ' ';
            for ch in line.chars() {
                if ch == '@' {
                    let label = labels.next().unwrap_or_default();
                    let pad = if prev == '-' { '-' } else { ' ' };
                    for _ in label.chars().count()..2 {
                        out.push(pad);
                    }
                    out.push_str(&label);
                } else {
                    out.push(ch);
                }
                prev = ch;
            }
            out
        })
        .collect()
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = fill_template(self.cell_labels());
        for line in lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players() -> [Player; 2] {
        [
            Player::new("Light", Color::Light),
            Player::new("Dark", Color::Dark),
        ]
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = Board::new();
        for p in 0..NUM_POSITIONS {
            assert!(board.is_empty(p).unwrap(), "position {p} should start empty");
        }
        assert!(!board.can_fly(Color::Light));
        assert!(!board.can_fly(Color::Dark));
    }

    #[test]
    fn test_invalid_position_is_structural() {
        let board = Board::new();
        assert_eq!(board.is_empty(24), Err(InvariantError::InvalidPosition(24)));
        assert!(board.is_owned_by(99, Color::Light).is_err());
        assert!(board.is_valid_move(0, 24, Color::Light, false).is_err());
    }

    #[test]
    fn test_place_and_occupied() {
        let mut board = Board::new();
        let [mut light, mut dark] = players();

        board.place(&mut light, 0).unwrap();
        assert!(board.is_owned_by(0, Color::Light).unwrap());

        let err = board.place(&mut dark, 0).unwrap_err();
        assert_eq!(err, GameError::Rule(RuleViolation::PositionOccupied(0)));
        assert_eq!(dark.active_pieces(), 0, "failed placement must not consume a piece");
        assert!(board.is_owned_by(0, Color::Light).unwrap());
    }

    #[test]
    fn test_move_validation() {
        let mut board = Board::new();
        let [mut light, mut dark] = players();
        board.place(&mut light, 0).unwrap();
        board.place(&mut dark, 1).unwrap();

        let err = board.move_piece(&mut light, 0, 1, false).unwrap_err();
        assert_eq!(err, GameError::Rule(RuleViolation::PositionOccupied(1)));

        let err = board.move_piece(&mut light, 0, 2, false).unwrap_err();
        assert_eq!(err, GameError::Rule(RuleViolation::NotAdjacent { from: 0, to: 2 }));

        let err = board.move_piece(&mut light, 5, 4, false).unwrap_err();
        assert_eq!(err, GameError::Rule(RuleViolation::EmptySource(5)));

        let err = board.move_piece(&mut light, 1, 2, false).unwrap_err();
        assert!(matches!(err, GameError::Rule(RuleViolation::NotOwned { pos: 1, .. })));

        board.move_piece(&mut light, 0, 9, false).unwrap();
        assert!(board.is_empty(0).unwrap());
        assert!(board.is_owned_by(9, Color::Light).unwrap());
        assert_eq!(light.pieces()[0].position(), Some(9));
        board.check_consistency(&[light, dark]).unwrap();
    }

    #[test]
    fn test_flying_bypasses_adjacency() {
        let mut board = Board::new();
        let [mut light, _] = players();
        board.place(&mut light, 0).unwrap();
        board.move_piece(&mut light, 0, 23, true).unwrap();
        assert!(board.is_owned_by(23, Color::Light).unwrap());
    }

    #[test]
    fn test_is_valid_move_flying() {
        let mut board = Board::new();
        let [mut light, _] = players();
        for pos in [0, 3, 6] {
            board.place(&mut light, pos).unwrap();
        }
        board.remove(&mut light, 3).unwrap();
        board.place(&mut light, 9).unwrap();

        // Exactly three on the board: adjacency waived even without the flag
        assert!(board.can_fly(Color::Light));
        assert!(board.is_valid_move(0, 2, Color::Light, false).unwrap());
        assert!(board.is_valid_move(0, 2, Color::Light, true).unwrap());
        // Not the owner
        assert!(!board.is_valid_move(0, 2, Color::Dark, true).unwrap());
        // Destination occupied
        assert!(!board.is_valid_move(0, 9, Color::Light, true).unwrap());

        board.place(&mut light, 12).unwrap();
        assert!(!board.can_fly(Color::Light));
        assert!(!board.is_valid_move(0, 2, Color::Light, false).unwrap());
        assert!(board.is_valid_move(0, 1, Color::Light, false).unwrap());
    }

    #[test]
    fn test_flying_readings_differ_below_three() {
        let mut board = Board::new();
        let [mut light, _] = players();
        board.place(&mut light, 0).unwrap();
        board.place(&mut light, 5).unwrap();

        // Player reading is `<= 3`, board reading is `== 3`.
        assert!(light.can_fly());
        assert!(!board.can_fly(Color::Light));
    }

    #[test]
    fn test_mill_detection_flags_pieces() {
        let mut board = Board::new();
        let [mut light, _] = players();
        for pos in [0, 1] {
            board.place(&mut light, pos).unwrap();
            assert!(!board.is_mill_formed(pos, &mut light).unwrap());
        }
        board.place(&mut light, 2).unwrap();
        assert!(board.is_mill_formed(2, &mut light).unwrap());
        assert!(light.pieces()[..3].iter().all(|p| p.is_in_mill()));
    }

    #[test]
    fn test_double_mill() {
        let mut board = Board::new();
        let [mut light, _] = players();
        for pos in [1, 2, 9, 21] {
            board.place(&mut light, pos).unwrap();
        }
        board.place(&mut light, 0).unwrap();
        assert_eq!(board.complete_mills(0, Color::Light).unwrap().len(), 2);
        assert!(board.is_mill_formed(0, &mut light).unwrap());
        assert_eq!(light.pieces().iter().filter(|p| p.is_in_mill()).count(), 5);
    }

    #[test]
    fn test_mill_flag_survives_broken_line() {
        let mut board = Board::new();
        let [mut light, _] = players();
        for pos in [0, 1, 2] {
            board.place(&mut light, pos).unwrap();
        }
        board.is_mill_formed(2, &mut light).unwrap();
        board.move_piece(&mut light, 2, 14, false).unwrap();

        let flag_at = |board: &Board, light: &Player, pos| {
            let r = board.spot(pos).unwrap().piece().unwrap();
            light.pieces()[r.index].is_in_mill()
        };
        assert!(flag_at(&board, &light, 0));
        assert!(flag_at(&board, &light, 1));
        assert!(!flag_at(&board, &light, 14), "the moved piece loses its flag");
    }

    #[test]
    fn test_removable_skips_mill_pieces() {
        let mut board = Board::new();
        let [_, mut dark] = players();
        for pos in [0, 1, 2, 5] {
            board.place(&mut dark, pos).unwrap();
        }
        board.is_mill_formed(2, &mut dark).unwrap();
        assert_eq!(board.removable_opponent_pieces(&dark), vec![5]);

        let err = board.capture(&mut dark, 1).unwrap_err();
        assert_eq!(err, GameError::Rule(RuleViolation::ProtectedPiece(1)));
        board.capture(&mut dark, 5).unwrap();
        assert_eq!(dark.active_pieces(), 3);
    }

    #[test]
    fn test_removable_fallback_when_all_in_mills() {
        let mut board = Board::new();
        let [_, mut dark] = players();
        for pos in [0, 1, 2] {
            board.place(&mut dark, pos).unwrap();
        }
        board.is_mill_formed(2, &mut dark).unwrap();
        assert_eq!(board.removable_opponent_pieces(&dark), vec![0, 1, 2]);

        board.capture(&mut dark, 1).unwrap();
        assert!(board.is_empty(1).unwrap());
        assert!(dark.pieces().iter().any(|p| p.is_captured()));
    }

    #[test]
    fn test_capture_wrong_target() {
        let mut board = Board::new();
        let [mut light, mut dark] = players();
        board.place(&mut light, 4).unwrap();
        assert_eq!(
            board.capture(&mut dark, 4).unwrap_err(),
            GameError::Rule(RuleViolation::NotOpponentPiece(4))
        );
        assert_eq!(
            board.capture(&mut dark, 7).unwrap_err(),
            GameError::Rule(RuleViolation::EmptyPosition(7))
        );
        assert_eq!(
            board.capture(&mut dark, 30).unwrap_err(),
            GameError::Invariant(InvariantError::InvalidPosition(30))
        );
    }

    #[test]
    fn test_remove_empty() {
        let mut board = Board::new();
        let [mut light, _] = players();
        assert_eq!(
            board.remove(&mut light, 3).unwrap_err(),
            GameError::Rule(RuleViolation::EmptyPosition(3))
        );
    }

    #[test]
    fn test_set_positions() {
        let mut board = Board::new();
        let mut ps = players();
        let mut cells = [None; NUM_POSITIONS];
        cells[0] = Some(Color::Light);
        cells[23] = Some(Color::Dark);
        board.set_positions(&cells, &mut ps).unwrap();

        assert_eq!(board.positions(), cells);
        assert_eq!(ps[0].active_pieces(), 1);
        assert_eq!(ps[1].active_pieces(), 1);
        board.check_consistency(&ps).unwrap();

        assert_eq!(
            board.set_positions(&cells[..10], &mut ps),
            Err(InvariantError::BadLength(10))
        );
        let full = [Some(Color::Dark); NUM_POSITIONS];
        assert!(matches!(
            board.set_positions(&full, &mut ps),
            Err(InvariantError::TooManyPieces { .. })
        ));
        // Unchanged after the failed restores
        assert_eq!(board.positions(), cells);
    }

    #[test]
    fn test_display() {
        let mut board = Board::new();
        let [mut light, mut dark] = players();
        board.place(&mut light, 0).unwrap();
        board.place(&mut dark, 23).unwrap();

        let text = board.to_string();
        assert_eq!(text.matches('O').count(), 1);
        assert_eq!(text.matches('X').count(), 1);
        assert_eq!(text.matches('.').count(), 22);
        assert_eq!(text.lines().count(), 13);

        let reference = board.render_with_reference();
        assert!(reference.contains("24"));
        assert!(reference.contains("10"));
    }

    #[test]
    fn test_reference_view_shows_same_board() {
        let mut board = Board::new();
        let [mut light, mut dark] = players();
        board.place(&mut light, 4).unwrap();
        board.place(&mut dark, 19).unwrap();

        let plain = board.to_string();
        let reference = board.render_with_reference();
        let rows: Vec<&str> = reference.lines().skip(1).collect();
        for (line, row) in plain.lines().zip(&rows) {
            assert!(row.starts_with(&format!("   {line}")), "{row:?} vs {line:?}");
        }
    }
}
