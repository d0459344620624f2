//! SQLite session store.

use crate::filter::{sliding_window, summary};
use crate::types::{SessionInfo, StoredMessage};
use agentic_core::{AppError, AppResult, SessionSettings};
use agentic_llm::{ChatMessage, ChatRole};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Default page size for [`SessionStore::list_sessions`].
pub const DEFAULT_LIST_LIMIT: usize = 100;

const SESSION_COLUMNS: &str = "s.thread_id, s.user_id, s.created_at, s.updated_at,
     (SELECT COUNT(*) FROM messages m WHERE m.thread_id = s.thread_id)";

/// Conversation threads and their messages.
///
/// `ttl_hours == 0` disables expiry and `max_session_messages == 0` disables
/// pruning.
pub struct SessionStore {
    conn: Mutex<Connection>,
    settings: SessionSettings,
}

impl SessionStore {
    /// Open (or create) the session database at `db_path`.
    pub fn open(db_path: &Path, settings: SessionSettings) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Database(format!("Failed to create session directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Database(format!("Failed to open session database: {}", e)))?;

        tracing::debug!("Opened session store at {:?}", db_path);
        Self::init(conn, settings)
    }

    pub fn open_in_memory(settings: SessionSettings) -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Database(format!("Failed to open session database: {}", e)))?;
        Self::init(conn, settings)
    }

    fn init(conn: Connection, settings: SessionSettings) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                thread_id TEXT PRIMARY KEY,
                user_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                thread_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (thread_id) REFERENCES sessions(thread_id)
            );

            CREATE INDEX IF NOT EXISTS idx_messages_thread ON messages(thread_id, id);
            CREATE INDEX IF NOT EXISTS idx_sessions_updated ON sessions(updated_at);
            "#,
        )
        .map_err(|e| AppError::Database(format!("Failed to create session tables: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
            settings,
        })
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Database("Session store lock poisoned".to_string()))
    }

    /// Start a new thread with a random id.
    pub fn create_session(&self, user_id: Option<&str>) -> AppResult<SessionInfo> {
        let thread_id = uuid::Uuid::new_v4().to_string();
        self.ensure_session(&thread_id, user_id)?;

        tracing::info!("Created session {}", thread_id);

        self.get_session(&thread_id)?.ok_or_else(|| {
            AppError::Database(format!("Session {} vanished after creation", thread_id))
        })
    }

    /// Create the thread if it does not exist yet.
    pub fn ensure_session(&self, thread_id: &str, user_id: Option<&str>) -> AppResult<()> {
        let conn = self.conn()?;
        insert_session(&conn, thread_id, user_id)
    }

    pub fn get_session(&self, thread_id: &str) -> AppResult<Option<SessionInfo>> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "SELECT {} FROM sessions s WHERE s.thread_id = ?1",
                SESSION_COLUMNS
            ),
            params![thread_id],
            session_from_row,
        )
        .optional()
        .map_err(|e| AppError::Database(format!("Failed to load session: {}", e)))
    }

    /// Append a message, creating the thread if needed, then prune the
    /// thread to its newest `max_session_messages` messages.
    pub fn append_message(&self, thread_id: &str, role: ChatRole, content: &str) -> AppResult<()> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        insert_session(&tx, thread_id, None)?;

        let now = timestamp(Utc::now());
        tx.execute(
            "INSERT INTO messages (thread_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![thread_id, role.as_str(), content, now],
        )
        .map_err(|e| AppError::Database(format!("Failed to insert message: {}", e)))?;

        tx.execute(
            "UPDATE sessions SET updated_at = ?2 WHERE thread_id = ?1",
            params![thread_id, now],
        )
        .map_err(|e| AppError::Database(format!("Failed to touch session: {}", e)))?;

        if self.settings.max_session_messages > 0 {
            let pruned = tx
                .execute(
                    "DELETE FROM messages WHERE thread_id = ?1 AND id NOT IN (
                         SELECT id FROM messages WHERE thread_id = ?1 ORDER BY id DESC LIMIT ?2
                     )",
                    params![thread_id, self.settings.max_session_messages as i64],
                )
                .map_err(|e| AppError::Database(format!("Failed to prune messages: {}", e)))?;

            if pruned > 0 {
                tracing::debug!("Pruned {} old messages from {}", pruned, thread_id);
            }
        }

        tx.commit()
            .map_err(|e| AppError::Database(format!("Failed to commit message: {}", e)))
    }

    /// The newest `limit` messages of a thread, oldest first.
    pub fn history(&self, thread_id: &str, limit: usize) -> AppResult<Vec<StoredMessage>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT role, content, created_at FROM messages
                 WHERE thread_id = ?1 ORDER BY id DESC LIMIT ?2",
            )
            .map_err(|e| AppError::Database(format!("Failed to prepare history query: {}", e)))?;

        let mut messages = stmt
            .query_map(params![thread_id, sql_limit(limit)], |row| {
                Ok(StoredMessage {
                    role: row.get(0)?,
                    content: row.get(1)?,
                    created_at: parse_timestamp(&row.get::<_, String>(2)?),
                })
            })
            .map_err(|e| AppError::Database(format!("Failed to load history: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Database(format!("Failed to read message: {}", e)))?;

        messages.reverse();
        Ok(messages)
    }

    /// Recent turns to send to the LLM, limited to `max_context_messages`.
    pub fn context_messages(&self, thread_id: &str) -> AppResult<Vec<ChatMessage>> {
        let limit = if self.settings.max_session_messages > 0 {
            self.settings.max_session_messages
        } else {
            i64::MAX as usize
        };
        let stored = self.history(thread_id, limit)?;
        tracing::debug!("Thread {}: {}", thread_id, summary(&stored));

        let window = sliding_window(&stored, self.settings.max_context_messages);
        Ok(window
            .iter()
            .filter_map(StoredMessage::to_chat_message)
            .collect())
    }

    pub fn message_count(&self, thread_id: &str) -> AppResult<usize> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE thread_id = ?1",
            params![thread_id],
            |row| row.get::<_, i64>(0),
        )
        .map(|n| n as usize)
        .map_err(|e| AppError::Database(format!("Failed to count messages: {}", e)))
    }

    /// Delete a thread and its messages. Returns false if it did not exist.
    pub fn delete_session(&self, thread_id: &str) -> AppResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        tx.execute("DELETE FROM messages WHERE thread_id = ?1", params![thread_id])
            .map_err(|e| AppError::Database(format!("Failed to delete messages: {}", e)))?;
        let deleted = tx
            .execute("DELETE FROM sessions WHERE thread_id = ?1", params![thread_id])
            .map_err(|e| AppError::Database(format!("Failed to delete session: {}", e)))?;

        tx.commit()
            .map_err(|e| AppError::Database(format!("Failed to commit delete: {}", e)))?;

        if deleted > 0 {
            tracing::info!("Deleted session {}", thread_id);
        }
        Ok(deleted > 0)
    }

    /// Live sessions, most recently active first.
    pub fn list_sessions(&self, limit: usize) -> AppResult<Vec<SessionInfo>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM sessions s WHERE s.updated_at >= ?1
                 ORDER BY s.updated_at DESC, s.rowid DESC LIMIT ?2",
                SESSION_COLUMNS
            ))
            .map_err(|e| AppError::Database(format!("Failed to prepare session query: {}", e)))?;

        let sessions = stmt
            .query_map(params![self.expiry_cutoff(), sql_limit(limit)], session_from_row)
            .map_err(|e| AppError::Database(format!("Failed to list sessions: {}", e)))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AppError::Database(format!("Failed to read session: {}", e)))?;

        Ok(sessions)
    }

    /// Delete sessions idle for longer than `ttl_hours`.
    pub fn purge_expired(&self) -> AppResult<usize> {
        if self.settings.ttl_hours == 0 {
            return Ok(0);
        }

        let cutoff = self.expiry_cutoff();
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            "DELETE FROM messages WHERE thread_id IN (
                 SELECT thread_id FROM sessions WHERE updated_at < ?1
             )",
            params![cutoff],
        )
        .map_err(|e| AppError::Database(format!("Failed to purge messages: {}", e)))?;
        let purged = tx
            .execute("DELETE FROM sessions WHERE updated_at < ?1", params![cutoff])
            .map_err(|e| AppError::Database(format!("Failed to purge sessions: {}", e)))?;

        tx.commit()
            .map_err(|e| AppError::Database(format!("Failed to commit purge: {}", e)))?;

        if purged > 0 {
            tracing::info!("Purged {} expired sessions", purged);
        }
        Ok(purged)
    }

    pub fn health_check(&self) -> bool {
        match self.conn() {
            Ok(conn) => conn
                .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .is_ok(),
            Err(_) => false,
        }
    }

    fn expiry_cutoff(&self) -> String {
        if self.settings.ttl_hours == 0 {
            return String::new();
        }
        timestamp(Utc::now() - Duration::hours(self.settings.ttl_hours as i64))
    }

    #[cfg(test)]
    fn set_updated_at(&self, thread_id: &str, at: DateTime<Utc>) {
        let conn = self.conn().unwrap();
        conn.execute(
            "UPDATE sessions SET updated_at = ?2 WHERE thread_id = ?1",
            params![thread_id, timestamp(at)],
        )
        .unwrap();
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn insert_session(conn: &Connection, thread_id: &str, user_id: Option<&str>) -> AppResult<()> {
    let now = timestamp(Utc::now());
    conn.execute(
        "INSERT OR IGNORE INTO sessions (thread_id, user_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)",
        params![thread_id, user_id, now],
    )
    .map_err(|e| AppError::Database(format!("Failed to create session: {}", e)))?;
    Ok(())
}

fn session_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionInfo> {
    Ok(SessionInfo {
        thread_id: row.get(0)?,
        user_id: row.get(1)?,
        created_at: parse_timestamp(&row.get::<_, String>(2)?),
        updated_at: parse_timestamp(&row.get::<_, String>(3)?),
        message_count: row.get::<_, i64>(4)? as usize,
    })
}

/// Fixed-width UTC timestamps so text comparison orders them correctly.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(max_session: usize, max_context: usize) -> SessionStore {
        SessionStore::open_in_memory(SessionSettings {
            ttl_hours: 24,
            max_session_messages: max_session,
            max_context_messages: max_context,
        })
        .unwrap()
    }

    fn store() -> SessionStore {
        store_with(50, 10)
    }

    #[test]
    fn test_create_and_get_session() {
        let store = store();
        let info = store.create_session(Some("alice")).unwrap();

        assert!(uuid::Uuid::parse_str(&info.thread_id).is_ok());
        assert_eq!(info.user_id.as_deref(), Some("alice"));
        assert_eq!(info.message_count, 0);

        let loaded = store.get_session(&info.thread_id).unwrap().unwrap();
        assert_eq!(loaded, info);
        assert!(store.get_session("missing").unwrap().is_none());
    }

    #[test]
    fn test_ensure_session_is_idempotent() {
        let store = store();
        store.ensure_session("t1", Some("bob")).unwrap();
        store.ensure_session("t1", Some("carol")).unwrap();

        let info = store.get_session("t1").unwrap().unwrap();
        assert_eq!(info.user_id.as_deref(), Some("bob"));
        assert_eq!(store.list_sessions(DEFAULT_LIST_LIMIT).unwrap().len(), 1);
    }

    #[test]
    fn test_append_and_history_order() {
        let store = store();
        store.append_message("t1", ChatRole::User, "first").unwrap();
        store.append_message("t1", ChatRole::Assistant, "second").unwrap();
        store.append_message("t1", ChatRole::User, "third").unwrap();

        let history = store.history("t1", 50).unwrap();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
        assert_eq!(history[1].role, "assistant");

        let tail = store.history("t1", 2).unwrap();
        assert_eq!(tail[0].content, "second");
        assert_eq!(tail[1].content, "third");

        assert_eq!(store.message_count("t1").unwrap(), 3);
        assert_eq!(store.get_session("t1").unwrap().unwrap().message_count, 3);
    }

    #[test]
    fn test_append_prunes_to_session_limit() {
        let store = store_with(4, 10);
        for i in 0..7 {
            store
                .append_message("t1", ChatRole::User, &format!("m{}", i))
                .unwrap();
        }

        let history = store.history("t1", 50).unwrap();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m3", "m4", "m5", "m6"]);
    }

    #[test]
    fn test_context_messages_sliding_window() {
        let store = store_with(50, 3);
        for i in 0..6 {
            let role = if i % 2 == 0 {
                ChatRole::User
            } else {
                ChatRole::Assistant
            };
            store
                .append_message("t1", role, &format!("m{}", i))
                .unwrap();
        }

        let context = store.context_messages("t1").unwrap();
        assert_eq!(
            context,
            vec![
                ChatMessage::assistant("m3"),
                ChatMessage::user("m4"),
                ChatMessage::assistant("m5"),
            ]
        );
        assert!(store.context_messages("unknown").unwrap().is_empty());
    }

    #[test]
    fn test_delete_session() {
        let store = store();
        store.append_message("t1", ChatRole::User, "hello").unwrap();

        assert!(store.delete_session("t1").unwrap());
        assert!(!store.delete_session("t1").unwrap());
        assert!(store.get_session("t1").unwrap().is_none());
        assert_eq!(store.message_count("t1").unwrap(), 0);
    }

    #[test]
    fn test_list_sessions_newest_first_and_excludes_expired() {
        let store = store();
        store.ensure_session("old", None).unwrap();
        store.ensure_session("recent", None).unwrap();
        store.ensure_session("expired", None).unwrap();

        let now = Utc::now();
        store.set_updated_at("old", now - Duration::hours(2));
        store.set_updated_at("recent", now - Duration::minutes(5));
        store.set_updated_at("expired", now - Duration::hours(48));

        let ids: Vec<String> = store
            .list_sessions(DEFAULT_LIST_LIMIT)
            .unwrap()
            .into_iter()
            .map(|s| s.thread_id)
            .collect();
        assert_eq!(ids, vec!["recent", "old"]);

        assert_eq!(store.list_sessions(1).unwrap().len(), 1);
    }

    #[test]
    fn test_purge_expired() {
        let store = store();
        store.append_message("stale", ChatRole::User, "old").unwrap();
        store.append_message("fresh", ChatRole::User, "new").unwrap();
        store.set_updated_at("stale", Utc::now() - Duration::hours(30));

        assert_eq!(store.purge_expired().unwrap(), 1);
        assert!(store.get_session("stale").unwrap().is_none());
        assert_eq!(store.message_count("stale").unwrap(), 0);
        assert!(store.get_session("fresh").unwrap().is_some());
    }

    #[test]
    fn test_zero_ttl_never_expires() {
        let store = SessionStore::open_in_memory(SessionSettings {
            ttl_hours: 0,
            ..Default::default()
        })
        .unwrap();
        store.ensure_session("ancient", None).unwrap();
        store.set_updated_at("ancient", Utc::now() - Duration::days(365));

        assert_eq!(store.purge_expired().unwrap(), 0);
        assert_eq!(store.list_sessions(DEFAULT_LIST_LIMIT).unwrap().len(), 1);
    }

    #[test]
    fn test_persists_to_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data").join("sessions.sqlite");

        {
            let store = SessionStore::open(&path, SessionSettings::default()).unwrap();
            store.append_message("t1", ChatRole::User, "kept").unwrap();
            assert!(store.health_check());
        }

        let store = SessionStore::open(&path, SessionSettings::default()).unwrap();
        assert_eq!(store.history("t1", 10).unwrap()[0].content, "kept");
    }
}
