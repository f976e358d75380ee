//! This file defines the route for handling sign-in requests.

use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;

use crate::{AppState, Error, auth::cookie::set_session_cookie};

/// The credentials a user submits to sign in.
#[derive(Debug, Deserialize)]
pub struct SignInData {
    /// The user's email address.
    pub email: String,
    /// The user's plain-text password, forwarded to the identity provider.
    pub password: String,
}

/// Handler for sign-in requests via the POST method.
///
/// On success the session cookie is set and the sanitized profile returned;
/// session internals never appear in the response body.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the identity provider rejects the
/// email and password combination.
pub async fn sign_in_endpoint(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(credentials): Json<SignInData>,
) -> Result<impl IntoResponse, Error> {
    let (profile, session) = state
        .adapter
        .sign_in(&credentials.email, &credentials.password)
        .await?;

    let jar = set_session_cookie(jar, &session.token, state.cookie_duration);

    Ok((jar, Json(profile)))
}
