//! Line commands typed at the prompt.

use crate::db::SlotId;
use squarewars_core::game::Point;
use std::str::FromStr;

/// Usage text listing every command.
pub const HELP: &str = "\
commands:
  place X Y | X Y    place a marker at column X, row Y
  undo               take back the latest ply
  reset              clear the board
  save [LABEL]       save a snapshot, labeled with the time by default
  slots              list saved snapshots, newest first
  load ID            load a saved snapshot
  delete ID          delete a saved snapshot
  show               print the board
  help               print this help
  quit               leave";

/// A parsed line of input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Input {
    /// Deletes a slot.
    Delete(SlotId),
    /// Prints the help.
    Help,
    /// Loads a slot.
    Load(SlotId),
    /// Places a marker.
    Place(Point),
    /// Quits the program.
    Quit,
    /// Clears the board.
    Reset,
    /// Saves a snapshot with an optional label.
    Save(Option<String>),
    /// Prints the board.
    Show,
    /// Lists the slots.
    Slots,
    /// Takes back the latest ply.
    Undo,
}

/// Error returned when a line cannot be parsed.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[remain::sorted]
pub enum ParseError {
    /// The line is blank.
    #[error("empty input")]
    Empty,
    /// A coordinate is not an integer.
    #[error("invalid coordinate `{0}`")]
    InvalidCoordinate(String),
    /// A required argument is missing.
    #[error("`{0}` needs an argument, see `help`")]
    MissingArgument(&'static str),
    /// There are more arguments than the command takes.
    #[error("too many arguments for `{0}`")]
    TooManyArguments(&'static str),
    /// The command is not known.
    #[error("unknown command `{0}`, see `help`")]
    UnknownCommand(String),
}

fn coordinate(s: &str) -> Result<i16, ParseError> {
    s.parse().map_err(|_| ParseError::InvalidCoordinate(s.into()))
}

fn point<'a>(
    name: &'static str,
    mut args: impl Iterator<Item = &'a str>,
) -> Result<Point, ParseError> {
    let (Some(x), Some(y)) = (args.next(), args.next()) else {
        return Err(ParseError::MissingArgument(name));
    };
    if args.next().is_some() {
        return Err(ParseError::TooManyArguments(name));
    }
    Ok(Point::new(coordinate(x)?, coordinate(y)?))
}

fn slot_id<'a>(
    name: &'static str,
    mut args: impl Iterator<Item = &'a str>,
) -> Result<SlotId, ParseError> {
    let id = args.next().ok_or(ParseError::MissingArgument(name))?;
    if args.next().is_some() {
        return Err(ParseError::TooManyArguments(name));
    }
    Ok(id.into())
}

fn no_args<'a>(
    name: &'static str,
    input: Input,
    mut args: impl Iterator<Item = &'a str>,
) -> Result<Input, ParseError> {
    match args.next() {
        Some(_) => Err(ParseError::TooManyArguments(name)),
        None => Ok(input),
    }
}

impl FromStr for Input {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut args = s.split_whitespace();
        let Some(cmd) = args.next() else {
            return Err(ParseError::Empty);
        };

        match cmd.to_ascii_lowercase().as_str() {
            "place" | "p" => point("place", args).map(Self::Place),
            "undo" | "u" => no_args("undo", Self::Undo, args),
            "reset" => no_args("reset", Self::Reset, args),
            "save" => {
                let label = s[cmd.len()..].trim();
                Ok(Self::Save((!label.is_empty()).then(|| label.into())))
            }
            "slots" => no_args("slots", Self::Slots, args),
            "load" => slot_id("load", args).map(Self::Load),
            "delete" => slot_id("delete", args).map(Self::Delete),
            "show" => no_args("show", Self::Show, args),
            "help" | "?" => no_args("help", Self::Help, args),
            "quit" | "exit" | "q" => no_args("quit", Self::Quit, args),
            _ if cmd.starts_with(|c: char| c == '-' || c.is_ascii_digit()) => {
                point("place", s.split_whitespace()).map(Self::Place)
            }
            _ => Err(ParseError::UnknownCommand(cmd.into())),
        }
    }
}
