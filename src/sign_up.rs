//! This file defines the route for handling sign-up requests.
//! The auth module handles the lower level session and cookie logic.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    AppState, Error,
    auth::{SignUpFields, cookie::set_session_cookie},
};

/// Handler for sign-up requests via the POST method.
///
/// Creates an identity-provider account and a profile record, then signs the
/// new user in by setting the session cookie.
///
/// # Errors
///
/// This function will return an error if the identity provider refuses the
/// account, or if the profile could not be persisted after the account was
/// created ([Error::ProfileCreation]).
pub async fn sign_up_endpoint(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Json(fields): Json<SignUpFields>,
) -> Result<impl IntoResponse, Error> {
    let (profile, session) = state.adapter.sign_up(fields).await?;

    let jar = set_session_cookie(jar, &session.token, state.cookie_duration);

    Ok((jar, (StatusCode::CREATED, Json(profile))))
}
