//! Session history in sqlite, written from a dedicated thread.

use std::path::{Path, PathBuf};

use anyhow::Context;
use croupier_types::roulette::SessionRecord;
use rusqlite::{params, Connection};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};
use uuid::Uuid;

enum StoreRequest {
    Save(SessionRecord),
    Remove(Uuid),
    History {
        player: String,
        limit: usize,
        response: oneshot::Sender<Vec<SessionRecord>>,
    },
}

/// Handle to the session store worker.
#[derive(Clone)]
pub struct SessionStore {
    sender: mpsc::Sender<StoreRequest>,
}

impl SessionStore {
    /// Open (and migrate) the database, then start the worker thread.
    pub fn open(path: &Path, buffer_size: usize) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("open session store db")?;
        init_schema(&conn)?;
        drop(conn);

        let (sender, receiver) = mpsc::channel(buffer_size.max(1));
        let path = path.to_path_buf();
        std::thread::spawn(move || {
            store_worker(path, receiver);
        });
        Ok(Self { sender })
    }

    pub fn save(&self, record: SessionRecord) {
        let id = record.id;
        if let Err(mpsc::error::TrySendError::Full(_)) =
            self.sender.try_send(StoreRequest::Save(record))
        {
            warn!(%id, "session store channel full; dropping record");
        }
    }

    pub fn remove(&self, id: Uuid) {
        if let Err(mpsc::error::TrySendError::Full(_)) =
            self.sender.try_send(StoreRequest::Remove(id))
        {
            warn!(%id, "session store channel full; dropping removal");
        }
    }

    /// Queue a history lookup. The receiver resolves once the worker has answered.
    pub fn history(&self, player: &str, limit: usize) -> oneshot::Receiver<Vec<SessionRecord>> {
        let (response, receiver) = oneshot::channel();
        let request = StoreRequest::History {
            player: player.to_string(),
            limit,
            response,
        };
        if self.sender.try_send(request).is_err() {
            warn!(player, "session store unavailable; history dropped");
        }
        receiver
    }
}

pub(crate) fn init_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA synchronous=NORMAL;
         CREATE TABLE IF NOT EXISTS sessions (
             id TEXT PRIMARY KEY,
             table_name TEXT NOT NULL,
             timestamp_ms INTEGER NOT NULL,
             record TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS session_players (
             session_id TEXT NOT NULL,
             player TEXT NOT NULL,
             PRIMARY KEY (session_id, player)
         );
         CREATE INDEX IF NOT EXISTS session_players_player ON session_players (player);",
    )
    .context("init session store schema")?;
    Ok(())
}

pub(crate) fn insert_record(conn: &mut Connection, record: &SessionRecord) -> anyhow::Result<()> {
    let encoded = serde_json::to_string(record).context("encode session record")?;
    let id = record.id.to_string();
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT OR REPLACE INTO sessions (id, table_name, timestamp_ms, record) VALUES (?1, ?2, ?3, ?4)",
        params![id, record.table, record.timestamp_ms as i64, encoded],
    )?;
    for bet in &record.bets {
        tx.execute(
            "INSERT OR IGNORE INTO session_players (session_id, player) VALUES (?1, ?2)",
            params![id, bet.player],
        )?;
    }
    tx.commit()?;
    Ok(())
}

pub(crate) fn delete_record(conn: &mut Connection, id: Uuid) -> anyhow::Result<bool> {
    let id = id.to_string();
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM session_players WHERE session_id = ?1", params![id])?;
    let removed = tx.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
    tx.commit()?;
    Ok(removed > 0)
}

/// Most recent sessions `player` took part in, newest first.
pub(crate) fn query_history(
    conn: &Connection,
    player: &str,
    limit: usize,
) -> anyhow::Result<Vec<SessionRecord>> {
    let mut stmt = conn.prepare(
        "SELECT s.record FROM sessions s
         JOIN session_players p ON p.session_id = s.id
         WHERE p.player = ?1
         ORDER BY s.timestamp_ms DESC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![player, limit as i64], |row| row.get::<_, String>(0))?;

    let mut records = Vec::new();
    for row in rows {
        let encoded = row?;
        match serde_json::from_str::<SessionRecord>(&encoded) {
            Ok(record) => records.push(record),
            Err(err) => warn!(player, %err, "skipping unreadable session record"),
        }
    }
    Ok(records)
}

fn store_worker(path: PathBuf, mut receiver: mpsc::Receiver<StoreRequest>) {
    let mut conn = match Connection::open(&path) {
        Ok(conn) => conn,
        Err(err) => {
            error!("Session store open failed: {err}");
            return;
        }
    };

    if let Err(err) = init_schema(&conn) {
        error!("Session store init failed: {err}");
        return;
    }

    while let Some(request) = receiver.blocking_recv() {
        match request {
            StoreRequest::Save(record) => {
                if let Err(err) = insert_record(&mut conn, &record) {
                    error!(id = %record.id, "Session store write failed: {err}");
                }
            }
            StoreRequest::Remove(id) => match delete_record(&mut conn, id) {
                Ok(true) => {}
                Ok(false) => warn!(%id, "session to remove not found"),
                Err(err) => error!(%id, "Session store delete failed: {err}"),
            },
            StoreRequest::History {
                player,
                limit,
                response,
            } => {
                let records = query_history(&conn, &player, limit).unwrap_or_else(|err| {
                    error!(player = %player, "Session store query failed: {err}");
                    Vec::new()
                });
                let _ = response.send(records);
            }
        }
    }
}
