//! Defines the user profile store trait.

use crate::{
    Error,
    models::{ProcessorCustomer, UserId, UserProfile},
};

/// Handles the creation and retrieval of user profiles.
///
/// Profiles are keyed by the external identity-provider user id and are kept
/// separate from the identity provider's own session records.
pub trait ProfileStore: Send + Sync {
    /// Insert a profile, or update the attribute fields of the existing
    /// profile for the same user id.
    ///
    /// An update overwrites the supplied attribute values but preserves the
    /// processor-customer reference already on the record.
    fn upsert(&self, profile: UserProfile) -> Result<UserProfile, Error>;

    /// Look up a profile by the identity-provider user id.
    ///
    /// Absence is a valid result, not an error.
    fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<UserProfile>, Error>;

    /// Record the payment-processor customer linked to a profile.
    ///
    /// # Errors
    /// Returns [Error::NotFound] if no profile exists for `user_id`.
    fn set_processor_customer(
        &self,
        user_id: &UserId,
        customer: &ProcessorCustomer,
    ) -> Result<(), Error>;
}
