//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error,
    auth::{DEFAULT_SESSION_DURATION, IdentityAdapter},
    db::initialize,
    linking::AccountLinker,
    providers::{AggregationClient, IdentityProvider, PaymentsClient},
    stores::{
        BankStore, TransferStore,
        sqlite::{SqliteBankStore, SqliteProfileStore, SqliteSessionStore, SqliteTransferStore},
    },
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which the session cookie is valid.
    pub cookie_duration: Duration,
    /// The identity provider adapter.
    pub adapter: IdentityAdapter,
    /// The linked-account provisioning service.
    pub linker: AccountLinker,
    /// The store for linked bank accounts.
    pub bank_store: Arc<dyn BankStore>,
    /// The store for fund transfers.
    pub transfer_store: Arc<dyn TransferStore>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection and clients
    /// for the external collaborators.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models. The connection is wrapped once and the same handle
    /// is injected into every store.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        identity: Arc<dyn IdentityProvider>,
        aggregation: Arc<dyn AggregationClient>,
        payments: Arc<dyn PaymentsClient>,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        let profile_store = Arc::new(SqliteProfileStore::new(connection.clone()));
        let session_store = Arc::new(SqliteSessionStore::new(connection.clone()));
        let bank_store = Arc::new(SqliteBankStore::new(connection.clone()));
        let transfer_store = Arc::new(SqliteTransferStore::new(connection));

        let adapter = IdentityAdapter::new(identity, session_store, profile_store.clone());
        let linker = AccountLinker::new(aggregation, payments, bank_store.clone(), profile_store);

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_SESSION_DURATION,
            adapter,
            linker,
            bank_store,
            transfer_store,
        })
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret` string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
