//! The session record model.

use time::OffsetDateTime;

use crate::models::UserId;

/// A session established with the identity provider.
///
/// Sessions are created and destroyed exclusively by the identity provider
/// adapter; the rest of the application only reads them to resolve who the
/// caller is.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// The opaque session token issued by the identity provider. Unique.
    pub token: String,
    /// The user the session belongs to.
    pub user_id: UserId,
    /// When the session stops being valid.
    pub expires_at: OffsetDateTime,
}
