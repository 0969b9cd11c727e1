//! Session actor owning the match.

use crate::macros::exec;
use squarewars_core::{
    game::{Config, Point},
    protocol::{Command, Effect},
    state::{MatchState, Snapshot},
};
use tokio::sync::{mpsc, oneshot};

const CHANNEL_CAPACITY: usize = 16;

enum SessionCommand {
    Apply(oneshot::Sender<Vec<Effect>>, Command),
    State(oneshot::Sender<Box<MatchState>>),
}

/// Creates a session for an empty match with the given configuration.
///
/// Returns a command handle to it and a future to run it. The future
/// completes once every handle is dropped.
pub fn create(config: Config) -> (Session, impl Future<Output = ()>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);
    (Session { cmd_tx }, run_session(MatchState::new(config), cmd_rx))
}

/// A command handle to a session.
#[derive(Clone)]
pub struct Session {
    cmd_tx: mpsc::Sender<SessionCommand>,
}

impl Session {
    /// Applies a command to the match, returning its effects.
    pub async fn apply(&self, cmd: Command) -> Vec<Effect> {
        exec!(self.cmd_tx, SessionCommand::Apply, cmd)
    }

    /// Places a marker for the player to move.
    pub async fn place(&self, p: Point) -> Vec<Effect> {
        self.apply(Command::Place(p)).await
    }

    /// Takes back the latest ply.
    pub async fn undo(&self) -> Vec<Effect> {
        self.apply(Command::Undo).await
    }

    /// Clears the board.
    pub async fn reset(&self) -> Vec<Effect> {
        self.apply(Command::Reset).await
    }

    /// Replaces the match with a snapshot, if it is compatible.
    pub async fn import(&self, snapshot: Snapshot) -> Vec<Effect> {
        self.apply(Command::Import(Box::new(snapshot))).await
    }

    /// Returns a copy of the current match.
    pub async fn state(&self) -> Box<MatchState> {
        exec!(self.cmd_tx, SessionCommand::State,)
    }
}

async fn run_session(mut state: MatchState, mut cmd_rx: mpsc::Receiver<SessionCommand>) {
    tracing::debug!(
        grid_size = state.config().grid_size(),
        target_score = state.config().target_score(),
        "session started"
    );

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            SessionCommand::Apply(resp_tx, cmd) => {
                _ = resp_tx.send(state.apply(cmd));
            }
            SessionCommand::State(resp_tx) => {
                _ = resp_tx.send(Box::new(state.clone()));
            }
        }
    }

    // All command senders are dropped.
    tracing::debug!(plies = state.history().len(), "session ended");
}
