//! Match state, turn order, scoring, undo, and snapshots.

use crate::game::{Board, Config, ConfigError, Player, PlayerSlots, Point, Square, find_new_squares};
use bytes::Buf;
use serde::{Deserialize, Serialize};
use std::iter;
use tracing::debug;

/// The phase of a match.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Status {
    /// No player has reached the target score yet.
    #[default]
    InProgress,
    /// A player reached the target score; the other player has one ply left.
    LastChance,
    /// The match is over, won by the given player or drawn on `None`.
    Over(Option<Player>),
}

impl Status {
    /// Tests if the match is over.
    #[must_use]
    pub fn is_over(self) -> bool {
        matches!(self, Self::Over(_))
    }
}

/// Reason why a snapshot cannot be imported.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[remain::sorted]
pub enum Incompatibility {
    /// The board differs from the one the history builds.
    #[error("board does not match the history")]
    BoardMismatch,
    /// The snapshot was taken with an invalid configuration.
    #[error("{0}")]
    Config(#[from] ConfigError),
    /// The snapshot was taken on a board of a different size.
    #[error("grid size {found} does not match {expected}")]
    GridSize {
        /// The configured grid size.
        expected: u16,
        /// The grid size found in the snapshot.
        found: u16,
    },
    /// The history does not account for the stones on the board.
    #[error("history of {plies} plies does not match {stones} stones on the board")]
    History {
        /// The number of plies in the history.
        plies: usize,
        /// The number of occupied cells.
        stones: usize,
    },
    /// A ply in the history differs from its replay: off the board, on an
    /// occupied cell, out of turn, or with a wrong board or scores.
    #[error("ply {0} does not replay")]
    InvalidPly(usize),
    /// A board in the snapshot does not have the declared dimensions.
    #[error("malformed board")]
    MalformedBoard,
    /// The scores or squares differ from the ones the history earns.
    #[error("scores do not match the history")]
    ScoreMismatch,
    /// The player to move or the status differs from the history.
    #[error("turn does not match the history")]
    TurnMismatch,
}

/// Error returned when an operation is rejected.
///
/// The state is left unchanged whenever one of these is returned.
#[derive(Clone, Copy, Debug, Eq, PartialEq, thiserror::Error)]
#[remain::sorted]
pub enum MatchError {
    /// The cell is already occupied.
    #[error("cell ({}, {}) is occupied", .0.x, .0.y)]
    CellOccupied(Point),
    /// The match is over.
    #[error("the game is already over")]
    GameAlreadyOver,
    /// The point is off the board.
    #[error("({}, {}) is off the board", .0.x, .0.y)]
    InvalidCoordinate(Point),
    /// There is no ply to undo.
    #[error("nothing to undo")]
    NothingToUndo,
    /// The snapshot does not fit the current configuration.
    #[error("incompatible snapshot: {0}")]
    SnapshotIncompatible(#[from] Incompatibility),
}

/// A single placement, with what is needed to take it back.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Ply {
    /// The placed point.
    pub point: Point,
    /// The player who placed it.
    pub player: Player,
    /// The board before the placement.
    pub board: Board,
    /// The scores before the placement.
    pub scores: PlayerSlots<u32>,
}

/// The outcome of an accepted placement.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Placement {
    /// The placed point.
    pub point: Point,
    /// The player who placed it.
    pub player: Player,
    /// The squares completed by the placement.
    pub squares: Vec<Square>,
    /// The sum of the scores of `squares`.
    pub score_delta: u32,
    /// The status after the placement.
    pub status: Status,
}

/// A copy of a match with presentation metadata, for saving and restoring.
///
/// The label and thumbnail are carried verbatim.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Snapshot {
    /// A human-readable label.
    pub label: String,
    /// An opaque preview image.
    pub thumbnail: Vec<u8>,
    /// The match itself.
    pub state: MatchState,
}

/// The authoritative state of a match.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MatchState {
    config: Config,
    board: Board,
    turn: Player,
    scores: PlayerSlots<u32>,
    history: Vec<Ply>,
    found_squares: Vec<Square>,
    last_squares: Vec<Square>,
    status: Status,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl MatchState {
    /// Creates an empty match, with red to move.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            board: Board::new(config.grid_size()),
            turn: Player::Red,
            scores: PlayerSlots::default(),
            history: vec![],
            found_squares: vec![],
            last_squares: vec![],
            status: Status::InProgress,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        self.config
    }

    /// Returns the board.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Returns the player to move.
    #[must_use]
    pub fn turn(&self) -> Player {
        self.turn
    }

    /// Returns the cumulative scores.
    #[must_use]
    pub fn scores(&self) -> PlayerSlots<u32> {
        self.scores
    }

    /// Returns the plies since the last reset, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Ply] {
        &self.history
    }

    /// Returns all squares found so far, in the order they were found.
    #[must_use]
    pub fn found_squares(&self) -> &[Square] {
        &self.found_squares
    }

    /// Returns the squares completed by the latest placement.
    #[must_use]
    pub fn last_squares(&self) -> &[Square] {
        &self.last_squares
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Places a marker at `p` for the player to move.
    ///
    /// Reaching the target score moves the match into the last chance;
    /// the ply after that ends it.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the match is over, or `p` is off the board or occupied.
    pub fn place(&mut self, p: Point) -> Result<Placement, MatchError> {
        if self.status.is_over() {
            return Err(MatchError::GameAlreadyOver);
        }
        if !self.board.contains(p) {
            return Err(MatchError::InvalidCoordinate(p));
        }
        if !self.board.is_vacant(p) {
            return Err(MatchError::CellOccupied(p));
        }

        let player = self.turn;
        self.history.push(Ply {
            point: p,
            player,
            board: self.board.clone(),
            scores: self.scores,
        });

        self.board.set(p, player);
        let squares = find_new_squares(&self.board, p, player);
        let score_delta = squares.iter().map(Square::score).sum();
        self.scores[player] = self.scores[player].saturating_add(score_delta);

        self.found_squares.extend_from_slice(&squares);
        self.last_squares.clone_from(&squares);
        self.turn = player.opposite();

        self.status = match self.status {
            Status::InProgress if self.scores[player] >= self.config.target_score() => {
                debug!(%player, score = self.scores[player], "target reached, last chance");
                Status::LastChance
            }
            Status::LastChance => {
                let winner = self.scores.leader();
                debug!(?winner, "game over");
                Status::Over(winner)
            }
            status => status,
        };

        debug!(?p, %player, score_delta, "placed");
        Ok(Placement {
            point: p,
            player,
            squares,
            score_delta,
            status: self.status,
        })
    }

    /// Takes back the latest ply and returns it.
    ///
    /// Squares containing the undone point are dropped from the found
    /// squares, and the match always returns to [`Status::InProgress`].
    ///
    /// # Errors
    ///
    /// Returns `Err` if the match is over or there is nothing to undo.
    pub fn undo(&mut self) -> Result<Ply, MatchError> {
        if self.status.is_over() {
            return Err(MatchError::GameAlreadyOver);
        }
        let ply = self.history.pop().ok_or(MatchError::NothingToUndo)?;

        self.board.clone_from(&ply.board);
        self.turn = ply.player;
        self.scores = ply.scores;
        self.found_squares.retain(|square| !square.contains(ply.point));
        self.last_squares.clear();
        self.status = Status::InProgress;

        debug!(p = ?ply.point, player = %ply.player, "undone");
        Ok(ply)
    }

    /// Returns to an empty match with the same configuration.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
        debug!("reset");
    }

    /// Copies the match into a snapshot.
    #[must_use]
    pub fn export_snapshot(&self, label: String, thumbnail: Vec<u8>) -> Snapshot {
        Snapshot {
            label,
            thumbnail,
            state: self.clone(),
        }
    }

    /// Replaces the match with the one in `snapshot`, after checking that it
    /// fits the configured grid and that replaying its history reproduces it.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the snapshot is incompatible.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> Result<(), MatchError> {
        self.check_compatible(&snapshot.state)?;
        debug!(label = %snapshot.label, plies = snapshot.state.history.len(), "imported");
        *self = snapshot.state;
        Ok(())
    }

    fn check_compatible(&self, other: &Self) -> Result<(), Incompatibility> {
        let config = other.config.validate()?;

        let expected = self.config.grid_size();
        for found in [config.grid_size(), other.board.size()] {
            if found != expected {
                return Err(Incompatibility::GridSize { expected, found });
            }
        }

        let boards = iter::once(&other.board).chain(other.history.iter().map(|ply| &ply.board));
        for board in boards {
            if board.size() != expected || !board.is_well_formed() {
                return Err(Incompatibility::MalformedBoard);
            }
        }

        let plies = other.history.len();
        let stones = other.board.occupied_count();
        if plies != stones {
            return Err(Incompatibility::History { plies, stones });
        }

        // Each recorded ply must be exactly the one its replay produces.
        let mut replay = Self::new(config);
        for (i, ply) in other.history.iter().enumerate() {
            if replay.place(ply.point).is_err() || replay.history.last() != Some(ply) {
                return Err(Incompatibility::InvalidPly(i));
            }
        }

        if replay.board != other.board {
            return Err(Incompatibility::BoardMismatch);
        }
        // An undo clears the last squares, so an empty list is also valid.
        if replay.scores != other.scores
            || replay.found_squares != other.found_squares
            || !(other.last_squares.is_empty() || other.last_squares == replay.last_squares)
        {
            return Err(Incompatibility::ScoreMismatch);
        }
        if replay.turn != other.turn || replay.status != other.status {
            return Err(Incompatibility::TurnMismatch);
        }
        Ok(())
    }

    /// Encodes the match as a record: the configuration followed by
    /// every placed point.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        self.config.encode(buf);
        for ply in &self.history {
            ply.point.encode(buf);
        }
    }

    /// Encodes the match as a record to a new buffer.
    #[must_use]
    pub fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = vec![];
        self.encode(&mut buf);
        buf
    }

    /// Decodes a record by replaying its placements.
    ///
    /// Returns `None` if the record is malformed or any placement is rejected.
    #[must_use]
    pub fn decode(buf: &mut &[u8]) -> Option<Self> {
        let config = Config::decode(buf)?;
        let mut state = Self::new(config);
        while buf.has_remaining() {
            let p = Point::decode(buf)?;
            state.place(p).ok()?;
        }
        Some(state)
    }
}
