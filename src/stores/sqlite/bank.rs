//! Implements a SQLite backed bank account store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{BankAccount, NewBankAccount, UserId},
    stores::BankStore,
};

/// Handles the creation and retrieval of linked bank accounts.
#[derive(Debug, Clone)]
pub struct SqliteBankStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteBankStore {
    /// Create a new bank account store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl BankStore for SqliteBankStore {
    /// Insert a bank account, or return the existing record for the same
    /// external account id.
    ///
    /// The `UNIQUE` constraint on `account_id` makes this safe against
    /// concurrent first-links of the same account: at most one insert wins
    /// and every caller reads back the same row.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [Error::SqlError] if an SQL related error occurred.
    fn upsert(&self, new_bank: NewBankAccount) -> Result<BankAccount, Error> {
        let connection = self.connection.lock().unwrap();

        connection.execute(
            "INSERT INTO bank_account \
            (account_id, bank_id, access_token, funding_source_url, shareable_id, user_id) \
            VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
            ON CONFLICT(account_id) DO NOTHING",
            (
                &new_bank.account_id,
                &new_bank.bank_id,
                &new_bank.access_token,
                &new_bank.funding_source_url,
                &new_bank.shareable_id,
                new_bank.user_id.as_str(),
            ),
        )?;

        // Read back through the natural key: the row is either the one just
        // inserted or the earlier record that won the conflict.
        connection
            .prepare(
                "SELECT id, account_id, bank_id, access_token, funding_source_url, \
                shareable_id, user_id FROM bank_account WHERE account_id = :account_id",
            )?
            .query_row(
                &[(":account_id", &new_bank.account_id)],
                SqliteBankStore::map_row,
            )
            .map_err(|e| e.into())
    }

    /// Get all bank accounts linked by `user_id`.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    fn list_by_user(&self, user_id: &UserId) -> Result<Vec<BankAccount>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, account_id, bank_id, access_token, funding_source_url, \
                shareable_id, user_id FROM bank_account WHERE user_id = :user_id",
            )?
            .query_map(&[(":user_id", &user_id.as_str())], SqliteBankStore::map_row)?
            .map(|maybe_bank| maybe_bank.map_err(Error::SqlError))
            .collect()
    }

    /// Get the bank account with the given external account id, or `None` if
    /// no such account has been linked.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    fn find_by_account_id(&self, account_id: &str) -> Result<Option<BankAccount>, Error> {
        match self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, account_id, bank_id, access_token, funding_source_url, \
                shareable_id, user_id FROM bank_account WHERE account_id = :account_id",
            )?
            .query_row(&[(":account_id", &account_id)], SqliteBankStore::map_row)
        {
            Ok(bank) => Ok(Some(bank)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    /// Get a bank account by the aggregation provider's item id, or `None`.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    fn find_by_bank_id(&self, bank_id: &str) -> Result<Option<BankAccount>, Error> {
        match self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT id, account_id, bank_id, access_token, funding_source_url, \
                shareable_id, user_id FROM bank_account WHERE bank_id = :bank_id LIMIT 1",
            )?
            .query_row(&[(":bank_id", &bank_id)], SqliteBankStore::map_row)
        {
            Ok(bank) => Ok(Some(bank)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}

impl CreateTable for SqliteBankStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS bank_account (
                    id INTEGER PRIMARY KEY,
                    account_id TEXT UNIQUE NOT NULL,
                    bank_id TEXT NOT NULL,
                    access_token TEXT NOT NULL,
                    funding_source_url TEXT NOT NULL,
                    shareable_id TEXT NOT NULL,
                    user_id TEXT NOT NULL
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SqliteBankStore {
    type ReturnType = BankAccount;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_user_id: String = row.get(offset + 6)?;

        Ok(BankAccount {
            id: row.get(offset)?,
            account_id: row.get(offset + 1)?,
            bank_id: row.get(offset + 2)?,
            access_token: row.get(offset + 3)?,
            funding_source_url: row.get(offset + 4)?,
            shareable_id: row.get(offset + 5)?,
            user_id: UserId::new(raw_user_id),
        })
    }
}

#[cfg(test)]
mod bank_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        db::CreateTable,
        models::{NewBankAccount, UserId, shareable_id},
        stores::BankStore,
    };

    use super::SqliteBankStore;

    fn get_store() -> SqliteBankStore {
        let conn = Connection::open_in_memory().unwrap();
        SqliteBankStore::create_table(&conn).unwrap();

        SqliteBankStore::new(Arc::new(Mutex::new(conn)))
    }

    fn new_bank(account_id: &str, access_token: &str) -> NewBankAccount {
        NewBankAccount {
            account_id: account_id.to_owned(),
            bank_id: "item-1".to_owned(),
            access_token: access_token.to_owned(),
            funding_source_url: "https://api.payments.test/funding-sources/fs-1".to_owned(),
            shareable_id: shareable_id(account_id),
            user_id: UserId::new("user-1"),
        }
    }

    #[test]
    fn upsert_inserts_new_bank() {
        let store = get_store();

        let bank = store.upsert(new_bank("acct-1", "access-token-1")).unwrap();

        assert!(bank.id > 0);
        assert_eq!(bank.account_id, "acct-1");
        assert_eq!(bank.access_token, "access-token-1");
        assert_eq!(bank.user_id, UserId::new("user-1"));
    }

    #[test]
    fn upsert_twice_keeps_first_record() {
        let store = get_store();

        let first = store.upsert(new_bank("acct-1", "access-token-1")).unwrap();
        let second = store.upsert(new_bank("acct-1", "access-token-2")).unwrap();

        assert_eq!(first.id, second.id);
        // The first insert is authoritative; the conflicting fields are not
        // merged.
        assert_eq!(second.access_token, "access-token-1");

        let banks = store.list_by_user(&UserId::new("user-1")).unwrap();
        assert_eq!(banks.len(), 1);
    }

    #[test]
    fn concurrent_upserts_create_one_record() {
        let store = get_store();

        let handles: Vec<_> = (0..4)
            .map(|n| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.upsert(new_bank("acct-1", &format!("access-token-{n}")))
                })
            })
            .collect();

        let ids: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap().id)
            .collect();

        assert!(ids.windows(2).all(|pair| pair[0] == pair[1]));
        let banks = store.list_by_user(&UserId::new("user-1")).unwrap();
        assert_eq!(banks.len(), 1);
    }

    #[test]
    fn list_by_user_returns_only_that_users_banks() {
        let store = get_store();

        let mut mine = new_bank("acct-1", "access-token-1");
        mine.user_id = UserId::new("user-1");
        let mut theirs = new_bank("acct-2", "access-token-2");
        theirs.user_id = UserId::new("user-2");

        store.upsert(mine).unwrap();
        store.upsert(theirs).unwrap();

        let banks = store.list_by_user(&UserId::new("user-1")).unwrap();

        assert_eq!(banks.len(), 1);
        assert_eq!(banks[0].account_id, "acct-1");
    }

    #[test]
    fn find_by_account_id_returns_none_when_absent() {
        let store = get_store();

        assert_eq!(store.find_by_account_id("acct-404").unwrap(), None);
    }

    #[test]
    fn find_by_account_id_returns_linked_bank() {
        let store = get_store();
        let inserted = store.upsert(new_bank("acct-1", "access-token-1")).unwrap();

        let found = store.find_by_account_id("acct-1").unwrap();

        assert_eq!(found, Some(inserted));
    }

    #[test]
    fn find_by_bank_id_returns_none_when_absent() {
        let store = get_store();

        assert_eq!(store.find_by_bank_id("item-404").unwrap(), None);
    }

    #[test]
    fn find_by_bank_id_returns_linked_bank() {
        let store = get_store();
        let inserted = store.upsert(new_bank("acct-1", "access-token-1")).unwrap();

        let found = store.find_by_bank_id("item-1").unwrap();

        assert_eq!(found, Some(inserted));
    }
}
