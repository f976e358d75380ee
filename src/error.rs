//! Defines the app level error type and its conversion to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The user provided an invalid email and password combination.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An external provider failed in a way not covered by a more specific
    /// variant.
    ///
    /// The error string should only be logged for debugging on the server.
    /// Clients receive a generic failure signal.
    #[error("provider request failed: {0}")]
    Provider(String),

    /// The aggregation provider rejected the public link token exchange.
    ///
    /// No side effects have occurred at this point, however public link
    /// tokens are single use, so the client must restart the linking flow
    /// with a fresh token.
    #[error("could not exchange the public link token: {0}")]
    TokenExchange(String),

    /// Account metadata could not be fetched with a freshly issued access
    /// token.
    ///
    /// The access token from the exchange step is orphaned when this happens.
    /// It is not revoked, and the client must restart the linking flow.
    #[error("could not fetch account metadata: {0}")]
    AccountFetch(String),

    /// The aggregation provider refused to issue a processor token for the
    /// selected account.
    #[error("could not create a processor token: {0}")]
    ProcessorToken(String),

    /// A payment-processor customer record could not be created for the user.
    #[error("could not create a payment-processor customer: {0}")]
    CustomerCreation(String),

    /// The payments processor rejected the processor token or customer id
    /// while creating a funding source.
    #[error("could not create a funding source: {0}")]
    FundingSource(String),

    /// The user's profile could not be persisted after their account was
    /// created with the identity provider.
    ///
    /// The identity-provider account exists but has no profile record, which
    /// is an inconsistent but recoverable state: a later sign-up attempt with
    /// the same email will reuse the account and retry the profile write.
    #[error("could not persist the user profile: {0}")]
    ProfileCreation(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows. Store
    /// lookups that treat absence as a valid state return `Ok(None)` instead.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "invalid credentials".to_owned())
            }
            Error::TokenExchange(_)
            | Error::AccountFetch(_)
            | Error::ProcessorToken(_)
            | Error::CustomerCreation(_)
            | Error::FundingSource(_) => {
                tracing::error!("account linking failed: {}", self);
                (
                    StatusCode::BAD_GATEWAY,
                    // Public link tokens are single use, so the client must
                    // restart the linking flow rather than resubmit.
                    "linking failed, try again".to_owned(),
                )
            }
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                "the requested resource could not be found".to_owned(),
            ),
            // Any errors that are not handled above are not intended to be
            // shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "an internal error occurred".to_owned(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
