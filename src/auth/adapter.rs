//! The identity provider adapter.
//!
//! Wraps sign-in/sign-up/sign-out calls to the external identity provider
//! and keeps the local session and profile records in step with it. The
//! adapter is the only component that creates or destroys sessions; the rest
//! of the application resolves callers through [IdentityAdapter::current_user].

use std::sync::Arc;

use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    Error,
    auth::cookie::DEFAULT_SESSION_DURATION,
    models::{Session, UserProfile},
    providers::IdentityProvider,
    stores::{ProfileStore, SessionStore},
};

/// The fields a user submits to create an account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpFields {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub address1: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub date_of_birth: String,
    /// The full national identifier. Only its last four digits are ever
    /// persisted.
    pub ssn: String,
}

/// Keep only the last four digits of a national identifier.
fn national_id_last4(national_id: &str) -> String {
    let digits: Vec<char> = national_id
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    let start = digits.len().saturating_sub(4);

    digits[start..].iter().collect()
}

/// Wraps the external identity provider and the local session and profile
/// stores.
#[derive(Clone)]
pub struct IdentityAdapter {
    provider: Arc<dyn IdentityProvider>,
    sessions: Arc<dyn SessionStore>,
    profiles: Arc<dyn ProfileStore>,
}

impl IdentityAdapter {
    /// Create a new adapter.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        sessions: Arc<dyn SessionStore>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            provider,
            sessions,
            profiles,
        }
    }

    /// Authenticate a user and establish a session.
    ///
    /// Returns the user's profile and the new session. Callers are expected
    /// to place the session token into the credential cookie.
    ///
    /// # Errors
    /// Returns [Error::InvalidCredentials] if the provider rejects the email
    /// and password, [Error::NotFound] if the identity has no profile record,
    /// and propagates unexpected provider errors.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(UserProfile, Session), Error> {
        let provider_session = self.provider.sign_in(email, password).await?;

        let session = Session {
            token: provider_session.token,
            user_id: provider_session.user_id,
            expires_at: OffsetDateTime::now_utc() + DEFAULT_SESSION_DURATION,
        };
        self.sessions.insert(session.clone())?;

        let profile = self
            .profiles
            .find_by_user_id(&session.user_id)?
            .ok_or(Error::NotFound)?;

        Ok((profile, session))
    }

    /// Create an identity-provider account, a session, and a profile record.
    ///
    /// A profile that already exists for the same identity is updated with
    /// the supplied attribute values rather than duplicated, so repeated
    /// sign-up attempts for the same account converge on one record.
    ///
    /// # Errors
    /// Returns [Error::ProfileCreation] if the profile could not be
    /// persisted after the provider account was created; the account then
    /// exists without a profile, which a retry of sign-up repairs.
    pub async fn sign_up(&self, fields: SignUpFields) -> Result<(UserProfile, Session), Error> {
        let name = format!("{} {}", fields.first_name, fields.last_name);
        let provider_session = self
            .provider
            .sign_up(&name, &fields.email, &fields.password)
            .await?;

        let session = Session {
            token: provider_session.token,
            user_id: provider_session.user_id.clone(),
            expires_at: OffsetDateTime::now_utc() + DEFAULT_SESSION_DURATION,
        };
        self.sessions.insert(session.clone())?;

        let profile = UserProfile {
            user_id: provider_session.user_id,
            email: fields.email,
            first_name: fields.first_name,
            last_name: fields.last_name,
            address1: fields.address1,
            city: fields.city,
            state: fields.state,
            postal_code: fields.postal_code,
            date_of_birth: fields.date_of_birth,
            national_id_last4: national_id_last4(&fields.ssn),
            processor_customer: None,
        };

        let profile = self
            .profiles
            .upsert(profile)
            .map_err(|error| Error::ProfileCreation(error.to_string()))?;

        Ok((profile, session))
    }

    /// Resolve a session token to the caller's profile.
    ///
    /// An absent token, an expired or unknown session, and a missing profile
    /// all yield `Ok(None)`: an anonymous caller is a valid state, not a
    /// failure.
    pub fn current_user(&self, token: Option<&str>) -> Result<Option<UserProfile>, Error> {
        let token = match token {
            Some(token) => token,
            None => return Ok(None),
        };

        let session = match self.sessions.find_by_token(token)? {
            Some(session) => session,
            None => return Ok(None),
        };

        self.profiles.find_by_user_id(&session.user_id)
    }

    /// Invalidate a session with the provider and remove the local record.
    ///
    /// Tolerant of the session being already gone on either side; a provider
    /// failure is logged and does not prevent the local record from being
    /// removed.
    pub async fn sign_out(&self, token: &str) -> Result<(), Error> {
        if let Err(error) = self.provider.sign_out(token).await {
            tracing::warn!("identity provider sign-out failed: {error}");
        }

        self.sessions.delete_by_token(token)
    }
}
