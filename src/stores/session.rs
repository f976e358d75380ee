//! Defines the session store trait.

use crate::{Error, models::Session};

/// Handles the persistence of identity-provider sessions.
///
/// Only the identity provider adapter creates or deletes sessions; everything
/// else reads them to resolve the caller.
pub trait SessionStore: Send + Sync {
    /// Persist a session issued by the identity provider.
    fn insert(&self, session: Session) -> Result<(), Error>;

    /// Resolve a session token to its session record.
    ///
    /// Expired or unknown tokens yield `Ok(None)`, distinguishing an
    /// anonymous caller from a store failure.
    fn find_by_token(&self, token: &str) -> Result<Option<Session>, Error>;

    /// Remove a session. Removing a session that is already gone is not an
    /// error.
    fn delete_by_token(&self, token: &str) -> Result<(), Error>;
}
