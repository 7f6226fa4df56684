// 👤 Credential Store - users table
// Append-only: accounts are created on registration and never updated or deleted.

use crate::db;
use crate::error::{DashboardError, Result};
use crate::sectors::{decode_sectors, encode_sectors, Sector};
use chrono::{DateTime, Utc};
use rusqlite::{params, types::Value, Connection, OptionalExtension};
use serde::Serialize;

/// One stored account
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub username: String,

    /// PHC-formatted hash, never the plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Sectors of interest, in the order they were chosen
    pub sectors: Vec<Sector>,

    /// Missing for rows written before the column existed
    pub created_at: Option<DateTime<Utc>>,
}

/// Text of the stored hash column.
///
/// Older rows may hold raw bytes or NULL; anything that is not UTF-8 text
/// becomes an empty string, which no verifier accepts.
fn stored_hash(username: &str, value: Value) -> String {
    let text = match value {
        Value::Text(text) => Some(text),
        Value::Blob(bytes) => String::from_utf8(bytes).ok(),
        _ => None,
    };

    text.unwrap_or_else(|| {
        tracing::warn!(username, "stored password hash is not text");
        String::new()
    })
}

pub struct CredentialStore<'a> {
    conn: &'a Connection,
}

impl<'a> CredentialStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        CredentialStore { conn }
    }

    /// Ensure the users table exists. Safe on every startup.
    pub fn initialize(&self) -> Result<()> {
        db::setup_database(self.conn)
    }

    pub fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT username, password_hash, sectors, created_at
                 FROM users
                 WHERE username = ?1",
                [username],
                |row| {
                    let sectors: Option<String> = row.get(2)?;
                    let created_at: Option<String> = row.get(3)?;
                    Ok((row.get::<_, String>(0)?, row.get::<_, Value>(1)?, sectors, created_at))
                },
            )
            .optional()?;

        Ok(row.map(|(username, stored, sectors, created_at)| UserRecord {
            password_hash: stored_hash(&username, stored),
            username,
            sectors: decode_sectors(sectors.as_deref().unwrap_or("")),
            created_at: created_at
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        }))
    }

    /// Insert a new account.
    ///
    /// A single INSERT against the primary key: a collision fails with
    /// `DuplicateUsername` and leaves the table untouched. There is no
    /// separate existence check.
    pub fn insert(&self, username: &str, password_hash: &str, sectors: &[Sector]) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO users (username, password_hash, sectors, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                username,
                password_hash,
                encode_sectors(sectors),
                Utc::now().to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(DashboardError::DuplicateUsername)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Number of stored accounts
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_conn() -> Connection {
        let conn = db::open_in_memory().unwrap();
        CredentialStore::new(&conn).initialize().unwrap();
        conn
    }

    #[test]
    fn test_insert_then_find() {
        let conn = store_conn();
        let store = CredentialStore::new(&conn);

        store
            .insert("alice", "$argon2id$fake", &[Sector::C, Sector::J])
            .unwrap();

        let user = store.find_by_username("alice").unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.password_hash, "$argon2id$fake");
        assert_eq!(user.sectors, vec![Sector::C, Sector::J]);
        assert!(user.created_at.is_some());
    }

    #[test]
    fn test_unknown_user_is_none() {
        let conn = store_conn();
        let store = CredentialStore::new(&conn);

        assert!(store.find_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_insert_is_atomic() {
        let conn = store_conn();
        let store = CredentialStore::new(&conn);

        store.insert("bob", "first", &[Sector::A]).unwrap();
        let second = store.insert("bob", "second", &[Sector::B]);

        assert!(matches!(second, Err(DashboardError::DuplicateUsername)));
        assert_eq!(store.count().unwrap(), 1);

        let user = store.find_by_username("bob").unwrap().unwrap();
        assert_eq!(user.password_hash, "first", "original row must be untouched");
        assert_eq!(user.sectors, vec![Sector::A]);
    }

    #[test]
    fn test_legacy_rows_with_display_names() {
        let conn = store_conn();
        conn.execute(
            "INSERT INTO users (username, password_hash, sectors) VALUES (?1, ?2, ?3)",
            params!["legacy", "hash", "Manufacturing;Construction"],
        )
        .unwrap();

        let user = CredentialStore::new(&conn)
            .find_by_username("legacy")
            .unwrap()
            .unwrap();
        assert_eq!(user.sectors, vec![Sector::C, Sector::F]);
        assert!(user.created_at.is_none());
    }

    #[test]
    fn test_non_text_hash_is_read_as_empty() {
        let conn = store_conn();
        conn.execute(
            "INSERT INTO users (username, password_hash, sectors) VALUES ('blob', X'009F9296', '')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO users (username, password_hash, sectors) VALUES ('bytes', CAST('$2b$12$abc' AS BLOB), '')",
            [],
        )
        .unwrap();

        let store = CredentialStore::new(&conn);
        assert_eq!(store.find_by_username("blob").unwrap().unwrap().password_hash, "");
        assert_eq!(
            store.find_by_username("bytes").unwrap().unwrap().password_hash,
            "$2b$12$abc"
        );
    }

    #[test]
    fn test_older_users_table_is_readable_after_initialize() {
        let conn = db::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE users (username TEXT PRIMARY KEY, password TEXT NOT NULL, sectors TEXT)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO users (username, password, sectors) VALUES ('old', 'stored', 'Manufacturing;Real estate')",
            [],
        )
        .unwrap();

        let store = CredentialStore::new(&conn);
        store.initialize().unwrap();

        let user = store.find_by_username("old").unwrap().unwrap();
        assert_eq!(user.password_hash, "stored");
        assert_eq!(user.sectors, vec![Sector::C, Sector::L]);
        assert!(user.created_at.is_none());

        store.insert("new", "$argon2id$fake", &[Sector::J]).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_missing_table_is_store_unavailable() {
        let conn = db::open_in_memory().unwrap();
        let store = CredentialStore::new(&conn);

        let result = store.find_by_username("alice");
        assert!(matches!(result, Err(DashboardError::StoreUnavailable(_))));
    }
}
