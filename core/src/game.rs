//! Lattice geometry, the board, and square detection.

mod square;

#[cfg(test)]
mod tests;

use bytes_varint::{VarIntSupport, VarIntSupportMut};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    ops::{Add, Index, IndexMut, Sub},
};
use strum::Display;

pub use square::{Square, canonicalize, find_new_squares};

/// The default side length of the board.
pub const DEFAULT_GRID_SIZE: u16 = 10;
/// The default score that triggers the last chance.
pub const DEFAULT_TARGET_SCORE: u32 = 100;
/// The smallest supported side length of the board.
pub const MIN_GRID_SIZE: u16 = 2;
/// The largest supported side length of the board.
///
/// Vertices derived from two points on the board then stay within `i16`.
pub const MAX_GRID_SIZE: u16 = 256;

fn szudzik_pair(x: u16, y: u16) -> u32 {
    let (x, y) = (x as u32, y as u32);
    if x < y { y * y + x } else { x * x + x + y }
}

fn szudzik_unpair(z: u32) -> (u16, u16) {
    let s = z.isqrt();
    let t = z - s * s;
    if t < s {
        (t as u16, s as u16)
    } else {
        (s as u16, (t - s) as u16)
    }
}

/// A lattice point with integer coordinates.
///
/// Points order lexicographically by `(x, y)`, which is the order used to
/// canonicalize the vertices of a square.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
pub struct Point {
    /// The horizontal coordinate.
    pub x: i16,
    /// The vertical coordinate.
    pub y: i16,
}

impl Point {
    /// Creates a point with the given coordinates.
    #[must_use]
    pub fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// Rotates the point by 90 degrees counterclockwise around the origin,
    /// mapping `(x, y)` to `(-y, x)`.
    #[must_use]
    pub fn rotate_ccw(self) -> Self {
        Self::new(-self.y, self.x)
    }

    /// Returns the squared Euclidean length of the vector to this point.
    #[must_use]
    pub fn norm_squared(self) -> u32 {
        let (x, y) = (self.x as i32, self.y as i32);
        (x * x + y * y) as u32
    }

    /// Maps the point to a natural number.
    ///
    /// Bijective over all points; points near the origin get small numbers.
    #[must_use]
    pub fn index(self) -> u32 {
        szudzik_pair(self.x as u16, self.y as u16)
    }

    /// Maps a natural number to a point (undoes `index`).
    #[must_use]
    pub fn from_index(i: u32) -> Self {
        let (x, y) = szudzik_unpair(i);
        Self::new(x as i16, y as i16)
    }

    /// Encodes the point to a buffer.
    pub fn encode(self, buf: &mut Vec<u8>) {
        buf.put_u32_varint(self.index());
    }

    /// Decodes a point from a buffer.
    #[must_use]
    pub fn decode(buf: &mut &[u8]) -> Option<Self> {
        buf.try_get_u32_varint().ok().map(Self::from_index)
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// One of the two players.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Player {
    /// The player who moves first.
    Red = 0,
    /// The player who moves second.
    Blue = 1,
}

impl Player {
    /// Both players, in turn order.
    pub const VALUES: [Self; 2] = [Self::Red, Self::Blue];

    /// Returns the opposite player.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Red => Self::Blue,
            Self::Blue => Self::Red,
        }
    }
}

/// A pair of values, one for each player.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerSlots<T>([T; 2]);

impl<T> PlayerSlots<T> {
    /// Creates slots with the given values for red and blue.
    #[must_use]
    pub fn new(red: T, blue: T) -> Self {
        Self([red, blue])
    }
}

impl<T: Ord> PlayerSlots<T> {
    /// Returns the player with the strictly greater value, or `None` on a tie.
    #[must_use]
    pub fn leader(&self) -> Option<Player> {
        match self[Player::Red].cmp(&self[Player::Blue]) {
            Ordering::Greater => Some(Player::Red),
            Ordering::Less => Some(Player::Blue),
            Ordering::Equal => None,
        }
    }
}

impl<T> Index<Player> for PlayerSlots<T> {
    type Output = T;

    fn index(&self, player: Player) -> &T {
        &self.0[player as usize]
    }
}

impl<T> IndexMut<Player> for PlayerSlots<T> {
    fn index_mut(&mut self, player: Player) -> &mut T {
        &mut self.0[player as usize]
    }
}

/// Error returned when constructing an invalid [`Config`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[remain::sorted]
pub enum ConfigError {
    /// The grid size is outside the supported range.
    #[error("grid size {0} is outside {min}..={max}", min = MIN_GRID_SIZE, max = MAX_GRID_SIZE)]
    GridSize(u16),
    /// The target score is zero.
    #[error("target score must be positive")]
    TargetScore,
}

/// Match configuration.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Config {
    grid_size: u16,
    target_score: u32,
}

impl Config {
    /// Creates a configuration.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the grid size is unsupported or the target is zero.
    pub fn new(grid_size: u16, target_score: u32) -> Result<Self, ConfigError> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&grid_size) {
            return Err(ConfigError::GridSize(grid_size));
        }
        if target_score == 0 {
            return Err(ConfigError::TargetScore);
        }
        Ok(Self {
            grid_size,
            target_score,
        })
    }

    /// Re-checks a configuration that bypassed [`Config::new`],
    /// e.g. one that was deserialized.
    ///
    /// # Errors
    ///
    /// Returns `Err` under the same conditions as [`Config::new`].
    pub fn validate(self) -> Result<Self, ConfigError> {
        Self::new(self.grid_size, self.target_score)
    }

    /// Returns the side length of the board.
    #[must_use]
    pub fn grid_size(self) -> u16 {
        self.grid_size
    }

    /// Returns the score that triggers the last chance.
    #[must_use]
    pub fn target_score(self) -> u32 {
        self.target_score
    }

    /// Encodes the configuration to a buffer.
    pub fn encode(self, buf: &mut Vec<u8>) {
        buf.put_u32_varint(self.grid_size.into());
        buf.put_u32_varint(self.target_score);
    }

    /// Decodes a configuration from a buffer.
    #[must_use]
    pub fn decode(buf: &mut &[u8]) -> Option<Self> {
        let grid_size = u16::try_from(buf.try_get_u32_varint().ok()?).ok()?;
        let target_score = buf.try_get_u32_varint().ok()?;
        Self::new(grid_size, target_score).ok()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            target_score: DEFAULT_TARGET_SCORE,
        }
    }
}

/// A square board of cells, each empty or occupied by a player.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Board {
    size: u16,
    cells: Vec<Option<Player>>,
}

impl Board {
    /// Creates an empty board with the given side length.
    #[must_use]
    pub fn new(size: u16) -> Self {
        let n = size as usize;
        Self {
            size,
            cells: vec![None; n * n],
        }
    }

    /// Returns the side length of the board.
    #[must_use]
    pub fn size(&self) -> u16 {
        self.size
    }

    /// Tests if the cell storage matches the side length.
    ///
    /// Always true for boards built by this crate.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let n = self.size as usize;
        self.cells.len() == n * n
    }

    /// Tests if the point lies on the board.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        let n = self.size as i32;
        (0..n).contains(&(p.x as i32)) && (0..n).contains(&(p.y as i32))
    }

    fn offset(&self, p: Point) -> Option<usize> {
        self.contains(p)
            .then(|| p.x as usize * self.size as usize + p.y as usize)
    }

    /// Returns the player occupying the point, or `None` if the point
    /// is empty or off the board.
    #[must_use]
    pub fn get(&self, p: Point) -> Option<Player> {
        self.offset(p).and_then(|i| self.cells.get(i).copied().flatten())
    }

    /// Tests if the point is on the board and empty.
    #[must_use]
    pub fn is_vacant(&self, p: Point) -> bool {
        self.offset(p)
            .is_some_and(|i| self.cells.get(i).is_some_and(Option::is_none))
    }

    /// Marks the point as occupied by `player`. Does nothing off the board.
    pub(crate) fn set(&mut self, p: Point, player: Player) {
        if let Some(cell) = self.offset(p).and_then(|i| self.cells.get_mut(i)) {
            *cell = Some(player);
        }
    }

    /// Returns an iterator of occupied points and their owners,
    /// in lexicographic order.
    pub fn occupied(&self) -> impl Iterator<Item = (Point, Player)> + '_ {
        let n = self.size as usize;
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            let p = Point::new((i / n) as i16, (i % n) as i16);
            cell.map(|player| (p, player))
        })
    }

    /// Returns the number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Tests if no cell is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }
}
