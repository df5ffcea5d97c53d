use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};

use crate::core::serialization::{from_json, to_json, SaveState};

const SAVE_SCHEMA_VERSION: i64 = 1;

const SAVE_DB_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS save_meta (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  schema_version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS save_slots (
  slot_name TEXT PRIMARY KEY,
  game_day INTEGER NOT NULL,
  game_tick INTEGER NOT NULL,
  payload TEXT NOT NULL
);
"#;

#[derive(Debug)]
pub enum SaveDbError {
    Sqlite(rusqlite::Error),
    InvalidData(String),
}

impl std::fmt::Display for SaveDbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveDbError::Sqlite(err) => write!(f, "sqlite error: {}", err),
            SaveDbError::InvalidData(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for SaveDbError {}

impl From<rusqlite::Error> for SaveDbError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}

/// Listing row for the load menu.
#[derive(Debug, Clone)]
pub struct SlotInfo {
    pub name: String,
    pub game_day: u32,
    pub game_tick: u64,
}

/// Named save-slot store backed by sqlite. Payloads are the same JSON
/// save states the flat-file path uses, so both formats stay loadable.
pub struct SaveDb {
    conn: Connection,
}

impl SaveDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SaveDbError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, SaveDbError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, SaveDbError> {
        let mut db = Self { conn };
        db.conn.execute_batch(SAVE_DB_SCHEMA)?;
        db.ensure_meta()?;
        Ok(db)
    }

    fn ensure_meta(&mut self) -> Result<(), SaveDbError> {
        let version = self
            .conn
            .query_row(
                "SELECT schema_version FROM save_meta WHERE id = 1",
                [],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        match version {
            Some(version) if version == SAVE_SCHEMA_VERSION => Ok(()),
            Some(version) => Err(SaveDbError::InvalidData(format!(
                "save_meta version mismatch (schema {}, expected {})",
                version, SAVE_SCHEMA_VERSION
            ))),
            None => {
                self.conn.execute(
                    "INSERT INTO save_meta (id, schema_version) VALUES (1, ?1)",
                    params![SAVE_SCHEMA_VERSION],
                )?;
                Ok(())
            }
        }
    }

    /// Insert or overwrite a named slot.
    pub fn store_slot(&mut self, name: &str, state: &SaveState) -> Result<(), SaveDbError> {
        let payload =
            to_json(state).map_err(|err| SaveDbError::InvalidData(err.to_string()))?;
        self.conn.execute(
            "INSERT OR REPLACE INTO save_slots (slot_name, game_day, game_tick, payload) VALUES (?1, ?2, ?3, ?4)",
            params![
                name,
                state.time.day as i64,
                state.time.tick as i64,
                payload
            ],
        )?;
        Ok(())
    }

    pub fn load_slot(&self, name: &str) -> Result<Option<SaveState>, SaveDbError> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM save_slots WHERE slot_name = ?1",
                params![name],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        let Some(payload) = payload else {
            return Ok(None);
        };
        let state =
            from_json(&payload).map_err(|err| SaveDbError::InvalidData(err.to_string()))?;
        Ok(Some(state))
    }

    pub fn list_slots(&self) -> Result<Vec<SlotInfo>, SaveDbError> {
        let mut out = Vec::new();
        let mut stmt = self
            .conn
            .prepare("SELECT slot_name, game_day, game_tick FROM save_slots ORDER BY slot_name")?;
        let rows = stmt.query_map([], |row| {
            Ok(SlotInfo {
                name: row.get(0)?,
                game_day: row.get::<_, i64>(1)? as u32,
                game_tick: row.get::<_, i64>(2)? as u64,
            })
        })?;
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Remove a slot; returns whether anything was deleted.
    pub fn delete_slot(&mut self, name: &str) -> Result<bool, SaveDbError> {
        let deleted = self.conn.execute(
            "DELETE FROM save_slots WHERE slot_name = ?1",
            params![name],
        )?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::world::Game;

    #[test]
    fn store_and_load_a_slot() {
        let mut db = SaveDb::open_in_memory().unwrap();
        let mut game = Game::new(13);
        game.tick(Vec::new(), 60.0);
        let state = game.save_state();

        db.store_slot("alpha", &state).unwrap();
        let loaded = db.load_slot("alpha").unwrap().unwrap();
        assert_eq!(loaded.time.tick, state.time.tick);
        assert_eq!(loaded.rng_state, state.rng_state);
    }

    #[test]
    fn missing_slot_is_none() {
        let db = SaveDb::open_in_memory().unwrap();
        assert!(db.load_slot("nope").unwrap().is_none());
    }

    #[test]
    fn overwrite_replaces_the_payload() {
        let mut db = SaveDb::open_in_memory().unwrap();
        let mut game = Game::new(1);
        game.tick(Vec::new(), 60.0);
        db.store_slot("run", &game.save_state()).unwrap();
        game.tick(Vec::new(), 60.0);
        db.store_slot("run", &game.save_state()).unwrap();

        let slots = db.list_slots().unwrap();
        assert_eq!(slots.len(), 1);
        let loaded = db.load_slot("run").unwrap().unwrap();
        assert_eq!(loaded.time.tick, 2);
    }

    #[test]
    fn delete_reports_whether_a_slot_existed() {
        let mut db = SaveDb::open_in_memory().unwrap();
        let game = Game::new(2);
        db.store_slot("gone", &game.save_state()).unwrap();
        assert!(db.delete_slot("gone").unwrap());
        assert!(!db.delete_slot("gone").unwrap());
    }
}
