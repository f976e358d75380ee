//! This file defines the route for resolving the current user.

use axum::{Json, extract::State};
use axum_extra::extract::PrivateCookieJar;

use crate::{AppState, Error, auth::cookie::session_token, models::UserProfile};

/// Handler that resolves the session cookie to the current user's profile.
///
/// An anonymous caller receives `null` rather than an error: a missing or
/// expired session is a valid state, distinct from a lookup failure.
pub async fn current_user_endpoint(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<Json<Option<UserProfile>>, Error> {
    let token = session_token(&jar);
    let profile = state.adapter.current_user(token.as_deref())?;

    Ok(Json(profile))
}
