use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::core::serialization::{
    is_compatible_version, load_state_from_json, save_state_to_json, SaveState,
};
use crate::world::repository::SaveRepository;

const SAVE_SCHEMA_VERSION: i64 = 1;

const SAVE_DB_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS save_meta (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  schema_version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS save_slot (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  format_version INTEGER NOT NULL,
  saved_at INTEGER NOT NULL,
  payload TEXT NOT NULL
);
"#;

#[derive(Debug)]
pub enum SaveDbError {
    Sqlite(rusqlite::Error),
    Json(serde_json::Error),
    Incompatible { found: i64, expected: i64 },
}

impl std::fmt::Display for SaveDbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveDbError::Sqlite(err) => write!(f, "sqlite error: {}", err),
            SaveDbError::Json(err) => write!(f, "corrupt save payload: {}", err),
            SaveDbError::Incompatible { found, expected } => write!(
                f,
                "save schema version mismatch (found {}, expected {})",
                found, expected
            ),
        }
    }
}

impl std::error::Error for SaveDbError {}

impl From<rusqlite::Error> for SaveDbError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}

impl From<serde_json::Error> for SaveDbError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Single-slot snapshot store. One row holds the whole journey; every write
/// replaces it inside a transaction, so a reader never sees a torn save.
pub struct SaveDb {
    conn: Connection,
}

impl SaveDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SaveDbError> {
        let conn = Connection::open(path)?;
        Self::prepare(conn)
    }

    pub fn open_in_memory() -> Result<Self, SaveDbError> {
        let conn = Connection::open_in_memory()?;
        Self::prepare(conn)
    }

    fn prepare(conn: Connection) -> Result<Self, SaveDbError> {
        let mut db = Self { conn };
        db.conn.execute_batch(SAVE_DB_SCHEMA)?;
        db.ensure_meta()?;
        Ok(db)
    }

    fn ensure_meta(&mut self) -> Result<(), SaveDbError> {
        let meta = self
            .conn
            .query_row(
                "SELECT schema_version FROM save_meta WHERE id = 1",
                [],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        match meta {
            Some(schema_version) => {
                if schema_version != SAVE_SCHEMA_VERSION {
                    return Err(SaveDbError::Incompatible {
                        found: schema_version,
                        expected: SAVE_SCHEMA_VERSION,
                    });
                }
            }
            None => {
                self.conn.execute(
                    "INSERT INTO save_meta (id, schema_version) VALUES (1, ?1)",
                    params![SAVE_SCHEMA_VERSION],
                )?;
            }
        }
        Ok(())
    }

    pub fn write_snapshot(&mut self, state: &SaveState) -> Result<(), SaveDbError> {
        let payload = save_state_to_json(state)?;
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM save_slot", [])?;
        tx.execute(
            "INSERT INTO save_slot (id, format_version, saved_at, payload) VALUES (1, ?1, ?2, ?3)",
            params![state.version as i64, state.saved_at as i64, payload],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn read_snapshot(&self) -> Result<Option<SaveState>, SaveDbError> {
        let row = self
            .conn
            .query_row(
                "SELECT format_version, payload FROM save_slot WHERE id = 1",
                [],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        let Some((format_version, payload)) = row else {
            return Ok(None);
        };
        if format_version < 0 || !is_compatible_version(format_version as u32) {
            return Err(SaveDbError::Incompatible {
                found: format_version,
                expected: SAVE_SCHEMA_VERSION,
            });
        }
        let state = load_state_from_json(&payload)?;
        Ok(Some(state))
    }
}

impl SaveRepository for SaveDb {
    fn load(&mut self) -> Result<Option<SaveState>, Box<dyn std::error::Error>> {
        Ok(SaveDb::read_snapshot(self)?)
    }

    fn store(&mut self, state: &SaveState) -> Result<(), Box<dyn std::error::Error>> {
        Ok(SaveDb::write_snapshot(self, state)?)
    }
}
