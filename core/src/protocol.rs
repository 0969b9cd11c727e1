//! Commands accepted by a match and the effects they produce.
//!
//! [`MatchState::apply`] is the single entry point for front ends: it runs
//! one command to completion and describes what happened, leaving
//! persistence and presentation to the caller.

use crate::{
    game::{Player, Point},
    state::{MatchError, MatchState, Placement, Ply, Snapshot, Status},
};
use strum::EnumDiscriminants;

/// A command for a match.
#[derive(Clone, Debug, EnumDiscriminants, Eq, PartialEq)]
#[strum_discriminants(name(CommandKind))]
pub enum Command {
    /// Places a marker for the player to move.
    Place(Point),
    /// Takes back the latest ply.
    Undo,
    /// Starts over with an empty board.
    Reset,
    /// Replaces the match with a snapshot.
    Import(Box<Snapshot>),
}

/// Something that happened while applying a command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Effect {
    /// A marker was placed.
    Placed(Placement),
    /// The given player reached the target score; the other one moves last.
    LastChance(Player),
    /// The match ended, won by the given player or drawn on `None`.
    GameOver(Option<Player>),
    /// A ply was taken back.
    Undone(Ply),
    /// The board was cleared.
    Reset,
    /// A snapshot with the given label was loaded.
    Imported {
        /// The label of the snapshot.
        label: String,
    },
    /// The command was rejected and nothing changed.
    Rejected(MatchError),
}

impl MatchState {
    /// Applies a command, returning its effects in order.
    ///
    /// A rejected command yields a single [`Effect::Rejected`].
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        let kind = CommandKind::from(&cmd);
        let res = match cmd {
            Command::Place(p) => self.place(p).map(|placement| {
                // `LastChance` never survives a placement, so seeing it here
                // means this placement entered it.
                let follow_up = match placement.status {
                    Status::InProgress => None,
                    Status::LastChance => Some(Effect::LastChance(placement.player)),
                    Status::Over(winner) => Some(Effect::GameOver(winner)),
                };
                let mut effects = vec![Effect::Placed(placement)];
                effects.extend(follow_up);
                effects
            }),
            Command::Undo => self.undo().map(|ply| vec![Effect::Undone(ply)]),
            Command::Reset => {
                self.reset();
                Ok(vec![Effect::Reset])
            }
            Command::Import(snapshot) => {
                let label = snapshot.label.clone();
                self.import_snapshot(*snapshot)
                    .map(|()| vec![Effect::Imported { label }])
            }
        };

        res.unwrap_or_else(|err| {
            tracing::debug!(?kind, %err, "command rejected");
            vec![Effect::Rejected(err)]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Config;

    fn place(x: i16, y: i16) -> Command {
        Command::Place(Point::new(x, y))
    }

    #[test]
    fn test_effects_through_game_over() {
        let mut state = MatchState::new(Config::new(10, 1).unwrap());
        for (x, y) in [(0, 0), (0, 9), (1, 0), (2, 9), (0, 1), (4, 9)] {
            let effects = state.apply(place(x, y));
            assert!(matches!(effects[..], [Effect::Placed(_)]));
        }

        let effects = state.apply(place(1, 1));
        assert!(matches!(
            &effects[..],
            [Effect::Placed(p), Effect::LastChance(Player::Red)] if p.score_delta == 1
        ));

        let effects = state.apply(place(6, 9));
        assert!(matches!(
            effects[..],
            [Effect::Placed(_), Effect::GameOver(Some(Player::Red))]
        ));

        assert_eq!(
            state.apply(Command::Undo),
            [Effect::Rejected(MatchError::GameAlreadyOver)]
        );
        assert_eq!(state.apply(Command::Reset), [Effect::Reset]);
        assert_eq!(
            state.apply(Command::Undo),
            [Effect::Rejected(MatchError::NothingToUndo)]
        );
    }

    #[test]
    fn test_import_effect() {
        let mut source = MatchState::default();
        source.apply(place(5, 5));
        let snapshot = source.export_snapshot("saved".into(), vec![]);

        let mut state = MatchState::default();
        assert_eq!(
            state.apply(Command::Import(Box::new(snapshot))),
            [Effect::Imported {
                label: "saved".into()
            }]
        );
        assert_eq!(state, source);
    }
}
