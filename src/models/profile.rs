//! The user profile model and its identifiers.

use serde::{Deserialize, Serialize};

/// The id the identity provider assigns to a user.
///
/// This is the natural key for profiles: the profile store is decoupled from
/// the identity provider's own session store, and this id is the only thing
/// the two share.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create a user id from the raw string issued by the identity provider.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The underlying id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A payment-processor customer record linked to a profile.
///
/// The processor addresses customers by resource URL; the trailing path
/// segment doubles as the customer id used when creating funding sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorCustomer {
    /// The customer resource URL.
    pub url: String,
    /// The customer id extracted from the resource URL.
    pub id: String,
}

impl ProcessorCustomer {
    /// Build a customer reference from the resource URL returned by the
    /// payments processor.
    ///
    /// Returns `None` if the URL cannot be parsed or has no path segments.
    pub fn from_url(url: &str) -> Option<Self> {
        let parsed = url::Url::parse(url).ok()?;
        let id = parsed.path_segments()?.next_back()?.to_owned();

        if id.is_empty() {
            return None;
        }

        Some(Self {
            url: url.to_owned(),
            id,
        })
    }
}

/// A user's profile record.
///
/// Created on sign-up and updated when a later sign-up for the same identity
/// supplies new attribute values. There is no delete path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// The identity-provider user id. Unique across profiles.
    pub user_id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub date_of_birth: String,
    /// The last four digits of the user's national identifier. The full
    /// value is never persisted.
    pub national_id_last4: String,
    /// The payment-processor customer linked to this profile. Absent until
    /// the user first links a bank account.
    pub processor_customer: Option<ProcessorCustomer>,
}
