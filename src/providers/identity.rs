//! Client for the external identity provider.
//!
//! The provider owns credentials and issues opaque session tokens; this
//! application never sees passwords beyond forwarding them here.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{Error, models::UserId};

/// A session established with the identity provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSession {
    /// The opaque session token.
    pub token: String,
    /// The provider's id for the authenticated user.
    pub user_id: UserId,
}

/// Operations offered by the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Authenticate with an email and password.
    ///
    /// # Errors
    /// Returns [Error::InvalidCredentials] if the provider rejects the
    /// combination, or [Error::Provider] for any other failure.
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, Error>;

    /// Create an account and an initial session.
    ///
    /// # Errors
    /// Returns [Error::Provider] if the account could not be created.
    async fn sign_up(&self, name: &str, email: &str, password: &str)
    -> Result<ProviderSession, Error>;

    /// Invalidate a session token with the provider.
    async fn sign_out(&self, token: &str) -> Result<(), Error>;
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    name: &'a str,
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct SessionResponse {
    token: String,
    user: SessionUser,
}

#[derive(Deserialize)]
struct SessionUser {
    id: String,
}

/// Identity provider client that talks JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityProvider {
    /// Create a client for the provider at `base_url`.
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn parse_session(response: reqwest::Response) -> Result<ProviderSession, Error> {
        let body: SessionResponse = response
            .json()
            .await
            .map_err(|error| Error::Provider(error.to_string()))?;

        Ok(ProviderSession {
            token: body.token,
            user_id: UserId::new(body.user.id),
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, Error> {
        let response = self
            .client
            .post(format!("{}/sign-in/email", self.base_url))
            .json(&SignInRequest { email, password })
            .send()
            .await
            .map_err(|error| Error::Provider(error.to_string()))?;

        match response.status() {
            status if status.is_success() => Self::parse_session(response).await,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::InvalidCredentials),
            status => Err(Error::Provider(format!(
                "sign-in failed with status {status}"
            ))),
        }
    }

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<ProviderSession, Error> {
        let response = self
            .client
            .post(format!("{}/sign-up/email", self.base_url))
            .json(&SignUpRequest {
                name,
                email,
                password,
            })
            .send()
            .await
            .map_err(|error| Error::Provider(error.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Provider(format!(
                "sign-up failed with status {}",
                response.status()
            )));
        }

        Self::parse_session(response).await
    }

    async fn sign_out(&self, token: &str) -> Result<(), Error> {
        let response = self
            .client
            .post(format!("{}/sign-out", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|error| Error::Provider(error.to_string()))?;

        // The provider treats signing out a dead session as a no-op; only
        // transport-level failures or server errors are surfaced.
        if response.status().is_server_error() {
            return Err(Error::Provider(format!(
                "sign-out failed with status {}",
                response.status()
            )));
        }

        Ok(())
    }
}
