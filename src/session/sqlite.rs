use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::{Error, Result};
use crate::session::{Session, SessionStore};

/// Contains the SQL queries used to interact with the database
pub mod sql_queries {
    pub const CREATE_TABLE: &str =
        "CREATE TABLE IF NOT EXISTS sessions (id TEXT PRIMARY KEY, data TEXT NOT NULL)";

    pub const SELECT_SESSION: &str = "SELECT data FROM sessions WHERE id = ?1";
    pub const UPSERT_SESSION: &str = "INSERT INTO sessions (id, data) VALUES (?1, ?2) \
         ON CONFLICT(id) DO UPDATE SET data = excluded.data";
}

/// Session store backed by SQLite, the values of a session are kept as a JSON object
pub struct SQLiteSessionStore {
    /// rusqlite connections can move between threads but not be shared
    conn: Mutex<Connection>,
}

impl SQLiteSessionStore {
    /// Open (or create) the session database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Sessions that only live as long as the process
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(sql_queries::CREATE_TABLE, [])?;
        Ok(SQLiteSessionStore {
            conn: Mutex::new(conn),
        })
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|err| Error::SessionUnavailable(err.to_string()).into())
    }
}

impl SessionStore for SQLiteSessionStore {
    fn load(&self, id: &str) -> Result<Option<Session>> {
        let data: Option<String> = self
            .connection()?
            .query_row(sql_queries::SELECT_SESSION, params![id], |row| row.get(0))
            .optional()?;

        match data {
            Some(data) => {
                let values: HashMap<String, serde_json::Value> = serde_json::from_str(&data)?;
                Ok(Some(Session {
                    id: id.to_string(),
                    values,
                }))
            }
            None => Ok(None),
        }
    }

    fn save(&self, session: &Session) -> Result<()> {
        let data = serde_json::to_string(&session.values)?;
        self.connection()?
            .execute(sql_queries::UPSERT_SESSION, params![session.id, data])?;
        Ok(())
    }
}
