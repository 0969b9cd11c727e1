//! A terminal front end for SquareWars, a two-player game of claiming
//! squares on a grid.
//!
//! The match is owned by a [`session`] actor and persisted through a
//! [`db`] worker; [`app::run`] ties them to standard input and output.

pub mod app;
pub mod db;
pub mod input;
mod macros;
pub mod render;
pub mod session;

pub use app::run;
