//! Constants for the board topology and piece accounting.
//!
//! The classic Nine Men's Morris board has three concentric squares joined by
//! four cross lines at their midpoints. Positions are numbered 0..24 row by row,
//! top to bottom and left to right:
//!
//! ```text
//!  0-----------1-----------2
//!  |           |           |
//!  |   3-------4-------5   |
//!  |   |       |       |   |
//!  |   |   6---7---8   |   |
//!  |   |   |       |   |   |
//!  9--10--11      12--13--14
//!  |   |   |       |   |   |
//!  |   |  15--16--17   |   |
//!  |   |       |       |   |
//!  |  18------19------20   |
//!  |           |           |
//! 21----------22----------23
//! ```
//!
//! User-facing I/O is 1-indexed; everything in this crate is 0-indexed.

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of positions on the board.
pub const NUM_POSITIONS: usize = 24;

/// Number of mill lines (three-in-a-row triples).
pub const NUM_MILLS: usize = 16;

/// Number of mill lines every position belongs to.
pub const MILLS_PER_POSITION: usize = 2;

/// Neighbors of each position, indexed by position.
pub const ADJACENCY: [&[usize]; NUM_POSITIONS] = [
    &[1, 9],            // 0
    &[0, 2, 4],         // 1
    &[1, 14],           // 2
    &[4, 10],           // 3
    &[1, 3, 5, 7],      // 4
    &[4, 13],           // 5
    &[7, 11],           // 6
    &[4, 6, 8],         // 7
    &[7, 12],           // 8
    &[0, 10, 21],       // 9
    &[3, 9, 11, 18],    // 10
    &[6, 10, 15],       // 11
    &[8, 13, 17],       // 12
    &[5, 12, 14, 20],   // 13
    &[2, 13, 23],       // 14
    &[11, 16],          // 15
    &[15, 17, 19],      // 16
    &[12, 16],          // 17
    &[10, 19],          // 18
    &[16, 18, 20, 22],  // 19
    &[13, 19],          // 20
    &[9, 22],           // 21
    &[19, 21, 23],      // 22
    &[14, 22],          // 23
];

/// The sixteen mill lines: eight horizontal, then eight vertical.
pub const MILLS: [[usize; 3]; NUM_MILLS] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [9, 10, 11],
    [12, 13, 14],
    [15, 16, 17],
    [18, 19, 20],
    [21, 22, 23],
    [0, 9, 21],
    [3, 10, 18],
    [6, 11, 15],
    [1, 4, 7],
    [16, 19, 22],
    [8, 12, 17],
    [5, 13, 20],
    [2, 14, 23],
];

// =============================================================================
// Piece Accounting
// =============================================================================

/// Pieces each player owns for the whole match.
pub const PIECES_PER_PLAYER: usize = 9;

/// Active piece count at or below which a player may fly.
pub const FLYING_THRESHOLD: usize = 3;

/// A player with fewer pieces in play than this has lost.
pub const MIN_PIECES_IN_PLAY: usize = 3;

/// Number of seats at the table.
pub const NUM_PLAYERS: usize = 2;
