//! Implements a SQLite backed user profile store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{ProcessorCustomer, UserId, UserProfile},
    stores::ProfileStore,
};

/// Handles the creation and retrieval of user profiles.
#[derive(Debug, Clone)]
pub struct SqliteProfileStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteProfileStore {
    /// Create a new profile store.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl ProfileStore for SqliteProfileStore {
    /// Insert a profile, or update the attribute fields of the existing
    /// profile with the same identity-provider user id.
    ///
    /// The processor-customer reference on an existing record is preserved
    /// across updates; it only changes through
    /// [ProfileStore::set_processor_customer].
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [Error::SqlError] if an SQL related error occurred.
    fn upsert(&self, profile: UserProfile) -> Result<UserProfile, Error> {
        let connection = self.connection.lock().unwrap();

        let (customer_url, customer_id) = match &profile.processor_customer {
            Some(customer) => (Some(customer.url.clone()), Some(customer.id.clone())),
            None => (None, None),
        };

        connection.execute(
            "INSERT INTO user_profile \
            (user_id, email, first_name, last_name, address1, city, state, postal_code, \
            date_of_birth, national_id_last4, customer_url, customer_id) \
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12) \
            ON CONFLICT(user_id) DO UPDATE SET \
            email = excluded.email, \
            first_name = excluded.first_name, \
            last_name = excluded.last_name, \
            address1 = excluded.address1, \
            city = excluded.city, \
            state = excluded.state, \
            postal_code = excluded.postal_code, \
            date_of_birth = excluded.date_of_birth, \
            national_id_last4 = excluded.national_id_last4",
            (
                profile.user_id.as_str(),
                &profile.email,
                &profile.first_name,
                &profile.last_name,
                &profile.address1,
                &profile.city,
                &profile.state,
                &profile.postal_code,
                &profile.date_of_birth,
                &profile.national_id_last4,
                &customer_url,
                &customer_id,
            ),
        )?;

        connection
            .prepare(
                "SELECT user_id, email, first_name, last_name, address1, city, state, \
                postal_code, date_of_birth, national_id_last4, customer_url, customer_id \
                FROM user_profile WHERE user_id = :user_id",
            )?
            .query_row(
                &[(":user_id", &profile.user_id.as_str())],
                SqliteProfileStore::map_row,
            )
            .map_err(|e| e.into())
    }

    /// Get the profile with the given identity-provider user id, or `None`
    /// if no profile has been created for that identity.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<UserProfile>, Error> {
        match self
            .connection
            .lock()
            .unwrap()
            .prepare(
                "SELECT user_id, email, first_name, last_name, address1, city, state, \
                postal_code, date_of_birth, national_id_last4, customer_url, customer_id \
                FROM user_profile WHERE user_id = :user_id",
            )?
            .query_row(&[(":user_id", &user_id.as_str())], SqliteProfileStore::map_row)
        {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    /// Record the payment-processor customer linked to a profile.
    ///
    /// # Panics
    ///
    /// Panics if the database lock is already acquired by the same thread or
    /// is poisoned.
    ///
    /// # Errors
    ///
    /// Returns [Error::NotFound] if no profile exists for `user_id`.
    fn set_processor_customer(
        &self,
        user_id: &UserId,
        customer: &ProcessorCustomer,
    ) -> Result<(), Error> {
        let rows_changed = self.connection.lock().unwrap().execute(
            "UPDATE user_profile SET customer_url = ?1, customer_id = ?2 WHERE user_id = ?3",
            (&customer.url, &customer.id, user_id.as_str()),
        )?;

        if rows_changed == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

impl CreateTable for SqliteProfileStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS user_profile (
                    id INTEGER PRIMARY KEY,
                    user_id TEXT UNIQUE NOT NULL,
                    email TEXT NOT NULL,
                    first_name TEXT NOT NULL,
                    last_name TEXT NOT NULL,
                    address1 TEXT NOT NULL,
                    city TEXT NOT NULL,
                    state TEXT NOT NULL,
                    postal_code TEXT NOT NULL,
                    date_of_birth TEXT NOT NULL,
                    national_id_last4 TEXT NOT NULL,
                    customer_url TEXT,
                    customer_id TEXT
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SqliteProfileStore {
    type ReturnType = UserProfile;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let raw_user_id: String = row.get(offset)?;
        let customer_url: Option<String> = row.get(offset + 10)?;
        let customer_id: Option<String> = row.get(offset + 11)?;

        let processor_customer = match (customer_url, customer_id) {
            (Some(url), Some(id)) => Some(ProcessorCustomer { url, id }),
            _ => None,
        };

        Ok(UserProfile {
            user_id: UserId::new(raw_user_id),
            email: row.get(offset + 1)?,
            first_name: row.get(offset + 2)?,
            last_name: row.get(offset + 3)?,
            address1: row.get(offset + 4)?,
            city: row.get(offset + 5)?,
            state: row.get(offset + 6)?,
            postal_code: row.get(offset + 7)?,
            date_of_birth: row.get(offset + 8)?,
            national_id_last4: row.get(offset + 9)?,
            processor_customer,
        })
    }
}

#[cfg(test)]
mod profile_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        Error,
        db::CreateTable,
        models::{ProcessorCustomer, UserId, UserProfile},
        stores::ProfileStore,
    };

    use super::SqliteProfileStore;

    fn get_store() -> SqliteProfileStore {
        let conn = Connection::open_in_memory().unwrap();
        SqliteProfileStore::create_table(&conn).unwrap();

        SqliteProfileStore::new(Arc::new(Mutex::new(conn)))
    }

    fn test_profile() -> UserProfile {
        UserProfile {
            user_id: UserId::new("user-1"),
            email: "a@x.com".to_owned(),
            first_name: "A".to_owned(),
            last_name: "B".to_owned(),
            address1: "1 First Street".to_owned(),
            city: "Springfield".to_owned(),
            state: "IL".to_owned(),
            postal_code: "62704".to_owned(),
            date_of_birth: "1990-01-01".to_owned(),
            national_id_last4: "6789".to_owned(),
            processor_customer: None,
        }
    }

    #[test]
    fn upsert_inserts_new_profile() {
        let store = get_store();

        let profile = store.upsert(test_profile()).unwrap();

        assert_eq!(profile, test_profile());
    }

    #[test]
    fn upsert_updates_attributes_on_conflict() {
        let store = get_store();
        store.upsert(test_profile()).unwrap();

        let mut updated = test_profile();
        updated.address1 = "2 Second Avenue".to_owned();
        let profile = store.upsert(updated).unwrap();

        assert_eq!(profile.address1, "2 Second Avenue");
        assert_eq!(profile.first_name, "A");

        let found = store.find_by_user_id(&UserId::new("user-1")).unwrap();
        assert_eq!(found, Some(profile));
    }

    #[test]
    fn upsert_preserves_processor_customer_on_conflict() {
        let store = get_store();
        store.upsert(test_profile()).unwrap();

        let customer =
            ProcessorCustomer::from_url("https://api.payments.test/customers/cus-1").unwrap();
        store
            .set_processor_customer(&UserId::new("user-1"), &customer)
            .unwrap();

        let profile = store.upsert(test_profile()).unwrap();

        assert_eq!(profile.processor_customer, Some(customer));
    }

    #[test]
    fn find_by_user_id_returns_none_when_absent() {
        let store = get_store();

        assert_eq!(store.find_by_user_id(&UserId::new("user-404")).unwrap(), None);
    }

    #[test]
    fn set_processor_customer_fails_for_unknown_user() {
        let store = get_store();
        let customer =
            ProcessorCustomer::from_url("https://api.payments.test/customers/cus-1").unwrap();

        let result = store.set_processor_customer(&UserId::new("user-404"), &customer);

        assert!(matches!(result, Err(Error::NotFound)));
    }
}
