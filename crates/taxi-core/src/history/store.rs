//! History persistence using SQLite

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use super::{ConversationSummary, HistoryEntry, HistoryStore, Role};
use crate::language::Language;
use crate::{Error, Result};

/// SQLite-based history store
pub struct SqliteHistory {
    conn: Mutex<Connection>,
}

impl SqliteHistory {
    /// Open (or create) the history database at `db_path`
    pub fn new(db_path: &str) -> Result<Self> {
        debug!("Opening history database at: {}", db_path);

        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_tables()?;
        info!("History store ready at {}", db_path);
        Ok(store)
    }

    /// Create an in-memory history store (tests, or when the file can't be opened)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_tables()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::HistoryUnavailable("connection lock poisoned".to_string()))
    }

    /// Initialize database tables
    fn init_tables(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                user_id TEXT NOT NULL,
                content TEXT NOT NULL,
                message_type TEXT NOT NULL,
                language TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_messages_user_id ON messages(user_id);
            CREATE TABLE IF NOT EXISTS conversations (
                user_id TEXT PRIMARY KEY,
                last_interaction TEXT NOT NULL,
                language TEXT NOT NULL,
                message_count INTEGER NOT NULL DEFAULT 0
            );",
        )?;
        Ok(())
    }
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl HistoryStore for SqliteHistory {
    fn recent(&self, user_id: &str, limit: usize) -> Result<Vec<HistoryEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT content, message_type, language, timestamp FROM messages
             WHERE user_id = ?1 ORDER BY seq DESC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            let message_type: String = row.get(1)?;
            let language: String = row.get(2)?;
            let timestamp: String = row.get(3)?;
            Ok(HistoryEntry {
                role: Role::from_db_str(&message_type),
                content: row.get(0)?,
                language: language.parse().unwrap_or_default(),
                timestamp: parse_timestamp(&timestamp),
            })
        })?;

        let mut entries = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        entries.reverse();
        Ok(entries)
    }

    fn record(&self, user_id: &str, query: &str, answer: &str, language: Language) -> Result<()> {
        let timestamp = Utc::now().to_rfc3339();
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        for (role, content) in [(Role::User, query), (Role::Assistant, answer)] {
            tx.execute(
                "INSERT INTO messages (id, user_id, content, message_type, language, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    uuid::Uuid::now_v7().to_string(),
                    user_id,
                    content,
                    role.as_db_str(),
                    language.code(),
                    timestamp,
                ],
            )?;
        }

        tx.execute(
            "INSERT INTO conversations (user_id, last_interaction, language, message_count)
             VALUES (?1, ?2, ?3, 2)
             ON CONFLICT(user_id) DO UPDATE SET
                last_interaction = excluded.last_interaction,
                language = excluded.language,
                message_count = message_count + 2",
            params![user_id, timestamp, language.code()],
        )?;

        tx.commit()?;
        debug!("Saved exchange for {}", user_id);
        Ok(())
    }

    fn clear(&self, user_id: &str) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM messages WHERE user_id = ?1", params![user_id])?;
        conn.execute("DELETE FROM conversations WHERE user_id = ?1", params![user_id])?;
        Ok(deleted)
    }

    fn conversation(&self, user_id: &str) -> Result<Option<ConversationSummary>> {
        let conn = self.lock()?;
        let summary = conn
            .query_row(
                "SELECT user_id, last_interaction, language, message_count
                 FROM conversations WHERE user_id = ?1",
                params![user_id],
                |row| {
                    let last_interaction: String = row.get(1)?;
                    let language: String = row.get(2)?;
                    let message_count: i64 = row.get(3)?;
                    Ok(ConversationSummary {
                        user_id: row.get(0)?,
                        last_interaction: parse_timestamp(&last_interaction),
                        language: language.parse().unwrap_or_default(),
                        message_count: message_count.max(0) as u64,
                    })
                },
            )
            .optional()?;
        Ok(summary)
    }
}
