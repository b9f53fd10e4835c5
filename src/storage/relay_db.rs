use std::fs;
use std::path::Path;

use rusqlite::{Connection, Result as SqlResult, params};

use crate::common::{ChatMessage, MessageKind, Participant};

/// SQLite mirror of the live room: two independent tables, participants and
/// messages, with no foreign keys between them. The in-memory room is
/// authoritative; this database seeds it at startup and records mutations
/// best-effort afterwards.
pub struct RelayDatabase {
    conn: Connection,
}

impl RelayDatabase {
    /// Open (or create) the database at `path`, creating parent directories
    /// as needed.
    pub fn with_path<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                let _ = fs::create_dir_all(parent);
            }
        }
        let db = Self {
            conn: Connection::open(path)?,
        };
        db.init_schema()?;
        Ok(db)
    }

    /// In-memory database, used by tests.
    pub fn in_memory() -> SqlResult<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> SqlResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS participants (
                name TEXT PRIMARY KEY,
                last_seen INTEGER NOT NULL
            )",
            [],
        )?;

        // `seq` carries insertion order; `id` is the message's own identity.
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                sender TEXT NOT NULL,
                recipient TEXT NOT NULL,
                body TEXT NOT NULL,
                kind TEXT NOT NULL,
                sent_at TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_participants_last_seen ON participants(last_seen)",
            [],
        )?;

        Ok(())
    }

    // ========== Participants ==========

    pub fn insert_participant(&self, participant: &Participant) -> SqlResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO participants (name, last_seen) VALUES (?1, ?2)",
            params![participant.name, participant.last_seen],
        )?;
        Ok(())
    }

    /// Refresh `last_seen` after a heartbeat.
    pub fn touch_participant(&self, participant: &Participant) -> SqlResult<()> {
        self.conn.execute(
            "UPDATE participants SET last_seen = ?2 WHERE name = ?1",
            params![participant.name, participant.last_seen],
        )?;
        Ok(())
    }

    pub fn remove_participant(&self, name: &str) -> SqlResult<()> {
        self.conn
            .execute("DELETE FROM participants WHERE name = ?1", params![name])?;
        Ok(())
    }

    /// All persisted participants, oldest heartbeat first.
    pub fn load_participants(&self) -> SqlResult<Vec<Participant>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, last_seen FROM participants ORDER BY last_seen ASC")?;

        let participants = stmt
            .query_map([], |row| {
                Ok(Participant {
                    name: row.get(0)?,
                    last_seen: row.get(1)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(participants)
    }

    // ========== Messages ==========

    pub fn insert_message(&self, message: &ChatMessage) -> SqlResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO messages (id, sender, recipient, body, kind, sent_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                message.id,
                message.from,
                message.to,
                message.text,
                message.kind.as_str(),
                message.time
            ],
        )?;
        Ok(())
    }

    /// Full message history in insertion order.
    pub fn load_messages(&self) -> SqlResult<Vec<ChatMessage>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sender, recipient, body, kind, sent_at
             FROM messages
             ORDER BY seq ASC",
        )?;

        let messages = stmt
            .query_map([], |row| {
                let kind_raw: String = row.get(4)?;
                let kind = MessageKind::parse(&kind_raw).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        4,
                        rusqlite::types::Type::Text,
                        format!("unknown message kind `{kind_raw}`").into(),
                    )
                })?;
                Ok(ChatMessage {
                    id: row.get(0)?,
                    from: row.get(1)?,
                    to: row.get(2)?,
                    text: row.get(3)?,
                    kind,
                    time: row.get(5)?,
                })
            })?
            .collect::<SqlResult<Vec<_>>>()?;

        Ok(messages)
    }

    #[cfg(test)]
    pub(crate) fn execute_batch(&self, sql: &str) -> SqlResult<()> {
        self.conn.execute_batch(sql)
    }
}

#[cfg(test)]
mod tests {
    use crate::common::BROADCAST_TARGET;

    use super::*;

    fn sample_message(id: &str, kind: MessageKind) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            from: "Alice".to_string(),
            to: BROADCAST_TARGET.to_string(),
            text: "hello".to_string(),
            kind,
            time: "12:00:00".to_string(),
        }
    }

    #[test]
    fn participants_roundtrip() {
        let db = RelayDatabase::in_memory().unwrap();
        db.insert_participant(&Participant {
            name: "Alice".to_string(),
            last_seen: 1_000,
        })
        .unwrap();
        db.insert_participant(&Participant {
            name: "Bob".to_string(),
            last_seen: 2_000,
        })
        .unwrap();

        let loaded = db.load_participants().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].name, "Alice");
        assert_eq!(loaded[1].name, "Bob");

        db.remove_participant("Alice").unwrap();
        // Removing again is harmless.
        db.remove_participant("Alice").unwrap();
        assert_eq!(db.load_participants().unwrap().len(), 1);
    }

    #[test]
    fn touch_updates_last_seen_in_place() {
        let db = RelayDatabase::in_memory().unwrap();
        let mut alice = Participant {
            name: "Alice".to_string(),
            last_seen: 1_000,
        };
        db.insert_participant(&alice).unwrap();

        alice.last_seen = 9_000;
        db.touch_participant(&alice).unwrap();

        let loaded = db.load_participants().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].last_seen, 9_000);
    }

    #[test]
    fn messages_roundtrip_in_insertion_order() {
        let db = RelayDatabase::in_memory().unwrap();
        db.insert_message(&sample_message("m1", MessageKind::Broadcast))
            .unwrap();
        db.insert_message(&sample_message("m2", MessageKind::Direct))
            .unwrap();
        db.insert_message(&sample_message("m3", MessageKind::Status))
            .unwrap();

        let loaded = db.load_messages().unwrap();
        let ids: Vec<&str> = loaded.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2", "m3"]);
        assert_eq!(loaded[1].kind, MessageKind::Direct);
    }

    #[test]
    fn duplicate_message_ids_are_ignored() {
        let db = RelayDatabase::in_memory().unwrap();
        db.insert_message(&sample_message("m1", MessageKind::Broadcast))
            .unwrap();
        db.insert_message(&sample_message("m1", MessageKind::Broadcast))
            .unwrap();
        assert_eq!(db.load_messages().unwrap().len(), 1);
    }

    #[test]
    fn corrupted_kind_fails_the_load_instead_of_guessing() {
        let db = RelayDatabase::in_memory().unwrap();
        db.execute_batch(
            "INSERT INTO messages (id, sender, recipient, body, kind, sent_at)
             VALUES ('m1', 'Alice', 'Todos', 'hi', 'statu', '12:00:00')",
        )
        .unwrap();

        assert!(db.load_messages().is_err());
    }
}
