//! Authentication middleware that resolves the session cookie to a user.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use serde_json::json;

use crate::{
    AppState,
    auth::{IdentityAdapter, cookie::session_token},
};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// Resolves session tokens to user profiles.
    pub adapter: IdentityAdapter,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            adapter: state.adapter.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "authentication required" })),
    )
        .into_response()
}

/// Middleware function that resolves the session cookie to a user profile.
///
/// The profile is placed into the request and the request executed normally
/// when the cookie maps to a live session; anonymous callers receive a 401.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(profile): Extension<UserProfile>` to receive the profile.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}");
            return unauthorized();
        }
    };

    let token = session_token(&jar);
    let profile = match state.adapter.current_user(token.as_deref()) {
        Ok(Some(profile)) => profile,
        Ok(None) => return unauthorized(),
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(profile);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}
