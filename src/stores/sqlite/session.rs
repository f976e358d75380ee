//! Implements a SQLite backed session store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{Session, UserId},
    stores::SessionStore,
};

/// Handles the persistence of identity-provider sessions.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    /// Create a new session store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl SessionStore for SqliteSessionStore {
    /// Persist a session issued by the identity provider.
    ///
    /// Inserting the same token again replaces the earlier record, which
    /// keeps repeated sign-ins with a provider-reissued token idempotent.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    fn insert(&self, session: Session) -> Result<(), Error> {
        self.connection.lock().unwrap().execute(
            "INSERT OR REPLACE INTO session (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
            (
                &session.token,
                session.user_id.as_str(),
                &session.expires_at,
            ),
        )?;

        Ok(())
    }

    /// Resolve a session token, treating expired and unknown tokens as
    /// absent.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    fn find_by_token(&self, token: &str) -> Result<Option<Session>, Error> {
        let session = match self
            .connection
            .lock()
            .unwrap()
            .prepare("SELECT token, user_id, expires_at FROM session WHERE token = :token")?
            .query_row(&[(":token", &token)], SqliteSessionStore::map_row)
        {
            Ok(session) => session,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        if session.expires_at <= OffsetDateTime::now_utc() {
            return Ok(None);
        }

        Ok(Some(session))
    }

    /// Remove a session. Removing a session that is already gone is not an
    /// error.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    fn delete_by_token(&self, token: &str) -> Result<(), Error> {
        self.connection
            .lock()
            .unwrap()
            .execute("DELETE FROM session WHERE token = ?1", (token,))?;

        Ok(())
    }
}

impl CreateTable for SqliteSessionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS session (
                    id INTEGER PRIMARY KEY,
                    token TEXT UNIQUE NOT NULL,
                    user_id TEXT NOT NULL,
                    expires_at TEXT NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SqliteSessionStore {
    type ReturnType = Session;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_user_id: String = row.get(offset + 1)?;

        Ok(Session {
            token: row.get(offset)?,
            user_id: UserId::new(raw_user_id),
            expires_at: row.get(offset + 2)?,
        })
    }
}

#[cfg(test)]
mod session_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime};

    use crate::{db::CreateTable, models::{Session, UserId}, stores::SessionStore};

    use super::SqliteSessionStore;

    fn get_store() -> SqliteSessionStore {
        let conn = Connection::open_in_memory().unwrap();
        SqliteSessionStore::create_table(&conn).unwrap();

        SqliteSessionStore::new(Arc::new(Mutex::new(conn)))
    }

    fn test_session(token: &str, expires_in: Duration) -> Session {
        Session {
            token: token.to_owned(),
            user_id: UserId::new("user-1"),
            expires_at: OffsetDateTime::now_utc() + expires_in,
        }
    }

    #[test]
    fn find_by_token_returns_inserted_session() {
        let store = get_store();
        let session = test_session("token-1", Duration::days(7));

        store.insert(session.clone()).unwrap();
        let found = store.find_by_token("token-1").unwrap().unwrap();

        assert_eq!(found.token, session.token);
        assert_eq!(found.user_id, session.user_id);
    }

    #[test]
    fn find_by_token_returns_none_for_unknown_token() {
        let store = get_store();

        assert_eq!(store.find_by_token("token-404").unwrap(), None);
    }

    #[test]
    fn find_by_token_treats_expired_session_as_absent() {
        let store = get_store();
        store
            .insert(test_session("token-1", Duration::seconds(-1)))
            .unwrap();

        assert_eq!(store.find_by_token("token-1").unwrap(), None);
    }

    #[test]
    fn delete_by_token_removes_session() {
        let store = get_store();
        store
            .insert(test_session("token-1", Duration::days(7)))
            .unwrap();

        store.delete_by_token("token-1").unwrap();

        assert_eq!(store.find_by_token("token-1").unwrap(), None);
    }

    #[test]
    fn delete_by_token_tolerates_missing_session() {
        let store = get_store();

        store.delete_by_token("token-404").unwrap();
    }
}
