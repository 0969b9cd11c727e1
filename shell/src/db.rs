//! Persistent storage for the auto-save and the snapshot slots.
//!
//! The connection is owned by a blocking task that serves commands in
//! order, so a load always observes every save issued before it.

use crate::macros::exec;
use anyhow::Context;
use chrono::{DateTime, Utc};
use rand::{distr::Alphanumeric, prelude::*};
use rusqlite::{Connection, Row};
use squarewars_core::state::{MatchState, Snapshot};
use std::path::Path;
use tokio::{
    sync::{mpsc, oneshot},
    task,
};

const CHANNEL_CAPACITY: usize = 16;

/// The number of snapshot slots kept; older ones are pruned on save.
pub const MAX_SLOTS: usize = 10;

const SLOT_ID_LEN: usize = 6;

/// An identifier of a snapshot slot.
pub type SlotId = String;

/// A summary of a snapshot slot.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SlotInfo {
    /// The slot ID.
    pub id: SlotId,
    /// The label of the snapshot.
    pub label: String,
    /// The thumbnail of the snapshot.
    pub thumbnail: Vec<u8>,
    /// When the snapshot was saved.
    pub created_at: DateTime<Utc>,
}

enum Command {
    ClearAutosave,
    DeleteSlot(oneshot::Sender<anyhow::Result<bool>>, SlotId),
    ListSlots(oneshot::Sender<anyhow::Result<Vec<SlotInfo>>>),
    LoadAutosave(oneshot::Sender<anyhow::Result<Option<Vec<u8>>>>),
    LoadSlot(oneshot::Sender<anyhow::Result<Option<Snapshot>>>, SlotId),
    SaveAutosave(Vec<u8>),
    SaveSlot(oneshot::Sender<anyhow::Result<SlotId>>, Box<Snapshot>),
}

/// A command handle to the database manager.
#[derive(Clone)]
pub struct DbManager {
    cmd_tx: mpsc::Sender<Command>,
}

impl DbManager {
    /// Stores the record of the match in progress, replacing any previous one.
    ///
    /// Failures are logged, not reported.
    pub async fn save_autosave(&self, record: Vec<u8>) {
        exec!(self.cmd_tx, Command::SaveAutosave(record));
    }

    /// Returns the stored auto-save record, if any.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the query failed.
    pub async fn load_autosave(&self) -> anyhow::Result<Option<Vec<u8>>> {
        exec!(self.cmd_tx, Command::LoadAutosave,)
    }

    /// Removes the auto-save.
    ///
    /// Failures are logged, not reported.
    pub async fn clear_autosave(&self) {
        exec!(self.cmd_tx, Command::ClearAutosave);
    }

    /// Stores a snapshot in a new slot, pruning all but the newest
    /// [`MAX_SLOTS`] slots.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the snapshot could not be serialized or stored.
    pub async fn save_slot(&self, snapshot: Snapshot) -> anyhow::Result<SlotId> {
        exec!(self.cmd_tx, Command::SaveSlot, Box::new(snapshot))
    }

    /// Lists the slots, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the query failed.
    pub async fn list_slots(&self) -> anyhow::Result<Vec<SlotInfo>> {
        exec!(self.cmd_tx, Command::ListSlots,)
    }

    /// Loads the snapshot in a slot, or `None` if there is no such slot.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the query failed or the stored snapshot is corrupt.
    pub async fn load_slot(&self, id: SlotId) -> anyhow::Result<Option<Snapshot>> {
        exec!(self.cmd_tx, Command::LoadSlot, id)
    }

    /// Deletes a slot, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the statement failed.
    pub async fn delete_slot(&self, id: SlotId) -> anyhow::Result<bool> {
        exec!(self.cmd_tx, Command::DeleteSlot, id)
    }
}

/// Opens the database at the given path, or an in-memory one on `None`,
/// and spawns a task to manage it.
///
/// # Errors
///
/// Returns `Err` if the database could not be opened or initialized.
pub fn manager(path: Option<&Path>) -> anyhow::Result<(DbManager, task::JoinHandle<()>)> {
    let conn = match path {
        Some(path) => Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?,
        None => Connection::open_in_memory().context("failed to open in-memory database")?,
    };
    init(&conn).context("failed to initialize database")?;

    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let handle = task::spawn_blocking(move || {
        tracing::info!("database manager started");
        manage_db(&conn, cmd_rx);
        tracing::info!("database manager stopped");
    });
    Ok((DbManager { cmd_tx }, handle))
}

fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS autosave (
            id INT NOT NULL PRIMARY KEY CHECK (id = 0),
            record BLOB NOT NULL,
            updated_at INT NOT NULL
        ) STRICT",
        (),
    )?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS slot (
            id TEXT NOT NULL PRIMARY KEY,
            label TEXT NOT NULL,
            thumbnail BLOB NOT NULL,
            state TEXT NOT NULL,
            created_at INT NOT NULL
        ) STRICT",
        (),
    )?;
    Ok(())
}

/// Generates a random alphanumeric slot ID.
fn rand_slot_id() -> SlotId {
    let mut rng = rand::rng();
    (0..SLOT_ID_LEN)
        .map(|_| char::from(rng.sample(Alphanumeric)))
        .collect()
}

fn manage_db(conn: &Connection, mut cmd_rx: mpsc::Receiver<Command>) {
    while let Some(cmd) = cmd_rx.blocking_recv() {
        match cmd {
            Command::SaveAutosave(record) => {
                if let Err(err) = save_autosave(conn, &record) {
                    tracing::error!("failed to save auto-save: {err}");
                }
            }
            Command::ClearAutosave => {
                if let Err(err) = conn.execute("DELETE FROM autosave", ()) {
                    tracing::error!("failed to clear auto-save: {err}");
                }
            }
            Command::LoadAutosave(resp_tx) => {
                _ = resp_tx.send(load_autosave(conn));
            }
            Command::SaveSlot(resp_tx, snapshot) => {
                _ = resp_tx.send(save_slot(conn, &snapshot));
            }
            Command::ListSlots(resp_tx) => {
                _ = resp_tx.send(list_slots(conn));
            }
            Command::LoadSlot(resp_tx, id) => {
                _ = resp_tx.send(load_slot(conn, &id));
            }
            Command::DeleteSlot(resp_tx, id) => {
                let res = conn.execute("DELETE FROM slot WHERE id = ?1", [&id]);
                _ = resp_tx.send(res.map(|rows| rows > 0).map_err(Into::into));
            }
        }
    }
}

fn save_autosave(conn: &Connection, record: &[u8]) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO autosave (id, record, updated_at) VALUES (0, ?1, ?2)",
        (record, Utc::now().timestamp_millis()),
    )?;
    Ok(())
}

fn load_autosave(conn: &Connection) -> anyhow::Result<Option<Vec<u8>>> {
    let mut stmt = conn.prepare("SELECT record FROM autosave WHERE id = 0")?;
    let record = stmt.query(())?.next()?.map(|row| row.get(0)).transpose()?;
    Ok(record)
}

fn save_slot(conn: &Connection, snapshot: &Snapshot) -> anyhow::Result<SlotId> {
    let state = ron::to_string(&snapshot.state).context("failed to serialize snapshot")?;
    let timestamp = Utc::now().timestamp_millis();

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO slot
            (id, label, thumbnail, state, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    let id = loop {
        let id = rand_slot_id();
        let rows = stmt.execute((
            &id,
            &snapshot.label,
            &snapshot.thumbnail,
            &state,
            timestamp,
        ))?;
        if rows > 0 {
            break id;
        }
    };

    let pruned = conn.execute(
        "DELETE FROM slot WHERE id NOT IN
            (SELECT id FROM slot ORDER BY created_at DESC, rowid DESC LIMIT ?1)",
        [MAX_SLOTS as i64],
    )?;
    if pruned > 0 {
        tracing::debug!(pruned, "pruned old slots");
    }
    Ok(id)
}

fn list_slots(conn: &Connection) -> anyhow::Result<Vec<SlotInfo>> {
    let mut stmt = conn.prepare(
        "SELECT id, label, thumbnail, created_at FROM slot
            ORDER BY created_at DESC, rowid DESC",
    )?;
    let mut rows = stmt.query(())?;

    let mut slots = vec![];
    while let Some(row) = rows.next()? {
        slots.push(parse_slot_info(row)?);
    }
    Ok(slots)
}

fn parse_slot_info(row: &Row<'_>) -> anyhow::Result<SlotInfo> {
    let created_at = row.get("created_at")?;
    Ok(SlotInfo {
        id: row.get("id")?,
        label: row.get("label")?,
        thumbnail: row.get("thumbnail")?,
        created_at: DateTime::from_timestamp_millis(created_at)
            .context("timestamp out of range")?,
    })
}

fn load_slot(conn: &Connection, id: &str) -> anyhow::Result<Option<Snapshot>> {
    let mut stmt = conn.prepare("SELECT label, thumbnail, state FROM slot WHERE id = ?1")?;
    stmt.query([id])?.next()?.map(parse_snapshot).transpose()
}

fn parse_snapshot(row: &Row<'_>) -> anyhow::Result<Snapshot> {
    let state: String = row.get("state")?;
    let state: MatchState = ron::from_str(&state).context("failed to decode snapshot")?;
    Ok(Snapshot {
        label: row.get("label")?,
        thumbnail: row.get("thumbnail")?,
        state,
    })
}
