//! Implements a SQLite backed transfer store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{NewTransfer, TRANSFER_CATEGORY, TRANSFER_CHANNEL, Transfer, UserId},
    stores::TransferStore,
};

/// Handles the creation and retrieval of fund transfers.
#[derive(Debug, Clone)]
pub struct SqliteTransferStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteTransferStore {
    /// Create a new transfer store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl TransferStore for SqliteTransferStore {
    /// Insert an immutable transfer record.
    ///
    /// The channel and category are fixed at insert time, and the creation
    /// timestamp is assigned here.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [Error::SqlError] if an SQL related error occurred.
    fn create(&self, new_transfer: NewTransfer) -> Result<Transfer, Error> {
        let connection = self.connection.lock().unwrap();
        let created_at = OffsetDateTime::now_utc();

        connection.execute(
            "INSERT INTO transfer \
            (name, amount, channel, category, sender_id, sender_bank_id, \
            receiver_id, receiver_bank_id, email, created_at) \
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            (
                &new_transfer.name,
                new_transfer.amount,
                TRANSFER_CHANNEL,
                TRANSFER_CATEGORY,
                new_transfer.sender_id.as_str(),
                &new_transfer.sender_bank_id,
                new_transfer.receiver_id.as_str(),
                &new_transfer.receiver_bank_id,
                &new_transfer.email,
                &created_at,
            ),
        )?;

        let transfer_id = connection.last_insert_rowid();

        Ok(Transfer {
            id: transfer_id,
            name: new_transfer.name,
            amount: new_transfer.amount,
            channel: TRANSFER_CHANNEL.to_owned(),
            category: TRANSFER_CATEGORY.to_owned(),
            sender_id: new_transfer.sender_id,
            sender_bank_id: new_transfer.sender_bank_id,
            receiver_id: new_transfer.receiver_id,
            receiver_bank_id: new_transfer.receiver_bank_id,
            email: new_transfer.email,
            created_at,
        })
    }

    /// Get every transfer where the bank is the sender or the receiver.
    ///
    /// A transfer matching on both sides is returned once. No ordering is
    /// guaranteed.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    fn list_by_bank_id(&self, bank_id: &str) -> Result<Vec<Transfer>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, name, amount, channel, category, sender_id, sender_bank_id, \
                receiver_id, receiver_bank_id, email, created_at FROM transfer \
                WHERE sender_bank_id = :bank_id OR receiver_bank_id = :bank_id",
            )?
            .query_map(&[(":bank_id", &bank_id)], SqliteTransferStore::map_row)?
            .map(|maybe_transfer| maybe_transfer.map_err(Error::SqlError))
            .collect()
    }
}

impl CreateTable for SqliteTransferStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS transfer (
                    id INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    amount REAL NOT NULL,
                    channel TEXT NOT NULL,
                    category TEXT NOT NULL,
                    sender_id TEXT NOT NULL,
                    sender_bank_id TEXT NOT NULL,
                    receiver_id TEXT NOT NULL,
                    receiver_bank_id TEXT NOT NULL,
                    email TEXT NOT NULL,
                    created_at TEXT NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SqliteTransferStore {
    type ReturnType = Transfer;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_sender_id: String = row.get(offset + 5)?;
        let raw_receiver_id: String = row.get(offset + 7)?;

        Ok(Transfer {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            amount: row.get(offset + 2)?,
            channel: row.get(offset + 3)?,
            category: row.get(offset + 4)?,
            sender_id: UserId::new(raw_sender_id),
            sender_bank_id: row.get(offset + 6)?,
            receiver_id: UserId::new(raw_receiver_id),
            receiver_bank_id: row.get(offset + 8)?,
            email: row.get(offset + 9)?,
            created_at: row.get(offset + 10)?,
        })
    }
}
