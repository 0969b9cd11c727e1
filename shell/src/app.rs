//! The interactive loop: input dispatch, notices, and persistence.

use crate::{
    db::{self, DbManager},
    input::{HELP, Input, ParseError},
    render::{self, Palette},
    session::{self, Session},
};
use anyhow::Context;
use chrono::Local;
use squarewars_core::{
    game::Config,
    protocol::Effect,
    state::{MatchError, MatchState},
};
use std::{fmt::Write as _, io, path::PathBuf, thread};
use tokio::{
    io::AsyncWriteExt,
    sync::mpsc,
};

const AUTOSAVE_LABEL: &str = "auto-save";

/// Whether to keep reading input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Flow {
    /// Read the next line.
    Continue,
    /// Leave the loop.
    Quit,
}

/// Front end state shared by every line of input.
pub struct App {
    session: Session,
    db: DbManager,
    palette: Palette,
}

impl App {
    /// Creates a front end over a session and a database.
    #[must_use]
    pub fn new(session: Session, db: DbManager, palette: Palette) -> Self {
        Self {
            session,
            db,
            palette,
        }
    }

    fn toast(&self, out: &mut String, text: &str) {
        _ = writeln!(out, "{}", render::toast(text, self.palette));
    }

    /// Restores the match from the auto-save, if there is a compatible one
    /// with at least one ply.
    pub async fn restore(&self, out: &mut String) {
        let record = match self.db.load_autosave().await {
            Ok(Some(record)) => record,
            Ok(None) => return,
            Err(err) => {
                tracing::error!("failed to load auto-save: {err:#}");
                return;
            }
        };

        let Some(state) = MatchState::decode(&mut &record[..]) else {
            tracing::warn!("discarding unreadable auto-save");
            self.db.clear_autosave().await;
            return;
        };
        if state.history().is_empty() {
            return;
        }

        let before = self.session.state().await.config();
        let snapshot = state.export_snapshot(AUTOSAVE_LABEL.into(), vec![]);
        match &self.session.import(snapshot).await[..] {
            [Effect::Imported { .. }] => {
                tracing::info!(plies = state.history().len(), "restored auto-save");
                self.toast(out, "progress restored");
                self.note_target_change(before, out).await;
            }
            effects => tracing::warn!(?effects, "auto-save not restored"),
        }
    }

    /// Tells the user when an imported match brought its own target score.
    async fn note_target_change(&self, before: Config, out: &mut String) {
        let requested = before.target_score();
        let target = self.session.state().await.config().target_score();
        if target != requested {
            tracing::info!(target, requested, "imported match keeps its target score");
            self.toast(
                out,
                &format!("keeping the saved goal of {target} instead of {requested}"),
            );
        }
    }

    /// Handles one line of input, appending what to print to `out`.
    pub async fn handle(&self, input: Input, out: &mut String) -> Flow {
        match input {
            Input::Place(p) => {
                let effects = self.session.place(p).await;
                self.react(effects, out).await;
            }
            Input::Undo => {
                let effects = self.session.undo().await;
                self.react(effects, out).await;
            }
            Input::Reset => {
                let effects = self.session.reset().await;
                self.react(effects, out).await;
            }
            Input::Save(label) => self.save(label, out).await,
            Input::Slots => self.list_slots(out).await,
            Input::Load(id) => match self.db.load_slot(id.clone()).await {
                Ok(Some(snapshot)) => {
                    let before = self.session.state().await.config();
                    let effects = self.session.import(snapshot).await;
                    self.react(effects, out).await;
                    self.note_target_change(before, out).await;
                }
                Ok(None) => self.toast(out, &format!("no slot `{id}`")),
                Err(err) => {
                    tracing::error!("failed to load slot {id}: {err:#}");
                    self.toast(out, &format!("cannot load `{id}`: {err}"));
                }
            },
            Input::Delete(id) => match self.db.delete_slot(id.clone()).await {
                Ok(true) => self.toast(out, &format!("slot `{id}` deleted")),
                Ok(false) => self.toast(out, &format!("no slot `{id}`")),
                Err(err) => {
                    tracing::error!("failed to delete slot {id}: {err:#}");
                    self.toast(out, &format!("cannot delete `{id}`: {err}"));
                }
            },
            Input::Show => {
                let state = self.session.state().await;
                out.push_str(&render::render(&state, self.palette));
            }
            Input::Help => {
                _ = writeln!(out, "{HELP}");
            }
            Input::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    async fn react(&self, effects: Vec<Effect>, out: &mut String) {
        let mut changed = false;
        let mut cleared = false;

        for effect in effects {
            match effect {
                Effect::Placed(placement) => {
                    changed = true;
                    if placement.score_delta > 0 {
                        self.toast(out, &format!("+{} points", placement.score_delta));
                    }
                }
                Effect::LastChance(player) => {
                    let target = self.session.state().await.config().target_score();
                    self.toast(
                        out,
                        &format!(
                            "{player} reached {target}! {} has one last chance",
                            player.opposite()
                        ),
                    );
                }
                Effect::GameOver(_) => {}
                Effect::Undone(ply) => {
                    changed = true;
                    self.toast(
                        out,
                        &format!("took back {} at ({}, {})", ply.player, ply.point.x, ply.point.y),
                    );
                }
                Effect::Reset => {
                    changed = true;
                    cleared = true;
                    self.toast(out, "board cleared");
                }
                Effect::Imported { label } => {
                    changed = true;
                    self.toast(out, &format!("snapshot loaded: {label}"));
                }
                Effect::Rejected(MatchError::SnapshotIncompatible(err)) => {
                    self.toast(out, &format!("cannot load: {err}"));
                }
                Effect::Rejected(err) => self.toast(out, &err.to_string()),
            }
        }

        if !changed {
            return;
        }

        let state = self.session.state().await;
        out.push_str(&render::render(&state, self.palette));

        if cleared || state.history().is_empty() {
            self.db.clear_autosave().await;
        } else if !state.status().is_over() {
            self.db.save_autosave(state.encode_to_vec()).await;
        }
    }

    async fn save(&self, label: Option<String>, out: &mut String) {
        let label =
            label.unwrap_or_else(|| Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
        let state = self.session.state().await;
        let thumbnail = render::thumbnail(state.board());

        match self.db.save_slot(state.export_snapshot(label, thumbnail)).await {
            Ok(id) => self.toast(out, &format!("snapshot saved as `{id}`")),
            Err(err) => {
                tracing::error!("failed to save snapshot: {err:#}");
                self.toast(out, &format!("cannot save: {err}"));
            }
        }
    }

    async fn list_slots(&self, out: &mut String) {
        let slots = match self.db.list_slots().await {
            Ok(slots) => slots,
            Err(err) => {
                tracing::error!("failed to list slots: {err:#}");
                self.toast(out, &format!("cannot list slots: {err}"));
                return;
            }
        };

        if slots.is_empty() {
            self.toast(out, "no saved snapshots");
            return;
        }
        for slot in slots {
            let time = slot.created_at.with_timezone(&Local);
            _ = writeln!(out, "{}  {}  {}", slot.id, time.format("%Y-%m-%d %H:%M:%S"), slot.label);
            for row in String::from_utf8_lossy(&slot.thumbnail).lines() {
                _ = writeln!(out, "    {row}");
            }
        }
    }
}

/// Spawns a thread reading lines from the standard input.
///
/// A blocking read cannot be cancelled, so the thread is left detached.
fn read_lines() -> mpsc::Receiver<io::Result<String>> {
    let (line_tx, line_rx) = mpsc::channel(1);
    thread::spawn(move || {
        for line in io::stdin().lines() {
            if line_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    line_rx
}

async fn print(out: &mut String) -> io::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(out.as_bytes()).await?;
    stdout.flush().await?;
    out.clear();
    Ok(())
}

/// Runs the shell until input ends, `quit` is entered, or the shutdown
/// signal fires.
///
/// # Errors
///
/// Returns `Err` if the database could not be opened, or reading input or
/// writing output failed.
pub async fn run(
    config: Config,
    db_file: Option<PathBuf>,
    palette: Palette,
    shutdown_signal: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let (db, db_handle) = db::manager(db_file.as_deref())?;
    let (session, session_fut) = session::create(config);
    let session_handle = tokio::spawn(session_fut);

    let app = App::new(session, db, palette);
    let mut out = String::new();
    app.restore(&mut out).await;
    app.handle(Input::Show, &mut out).await;
    _ = writeln!(out, "type `help` for commands");

    let mut line_rx = read_lines();
    tokio::pin!(shutdown_signal);

    loop {
        out.push_str("> ");
        print(&mut out).await.context("failed to write output")?;

        let line = tokio::select! {
            line = line_rx.recv() => line,
            () = &mut shutdown_signal => {
                tracing::info!("received shutdown signal");
                break;
            }
        };
        let Some(line) = line.transpose().context("failed to read input")? else {
            // End of input.
            out.push('\n');
            break;
        };

        let flow = match line.parse::<Input>() {
            Ok(input) => app.handle(input, &mut out).await,
            Err(ParseError::Empty) => Flow::Continue,
            Err(err) => {
                _ = writeln!(out, "{err}");
                Flow::Continue
            }
        };
        if flow == Flow::Quit {
            break;
        }
    }
    print(&mut out).await.context("failed to write output")?;

    // Dropping the last handles lets both managers finish.
    drop(app);
    session_handle.await.context("session task failed")?;
    db_handle.await.context("database task failed")?;
    Ok(())
}
