//! Core logic of SquareWars, a two-player territory game played by
//! completing squares of any orientation on a lattice.
//!
//! The crate is split into the board geometry and square detection
//! ([`game`]), the turn and scoring state machine ([`state`]), and the
//! commands and effects exchanged with a front end ([`protocol`]).

pub mod game;
pub mod protocol;
pub mod state;
