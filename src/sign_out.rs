//! This file defines the route for signing out the current user.

use axum::{Json, extract::State, response::IntoResponse};
use axum_extra::extract::PrivateCookieJar;
use serde_json::json;

use crate::{
    AppState, Error,
    auth::cookie::{clear_session_cookie, session_token},
};

/// Handler for sign-out requests via the POST method.
///
/// Invalidates the session with the identity provider, removes the local
/// session record and clears the session cookie. Signing out without a live
/// session is not an error.
pub async fn sign_out_endpoint(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, Error> {
    if let Some(token) = session_token(&jar) {
        state.adapter.sign_out(&token).await?;
    }

    let jar = clear_session_cookie(jar);

    Ok((jar, Json(json!({ "signedOut": true }))))
}
