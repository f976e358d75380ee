//! Defines functions for carrying the session token in a cookie.
//!
//! The cookie is the only wire format for credentials: it is set on
//! successful sign-in/sign-up and cleared on sign-out. The jar is private
//! (encrypted), so the opaque token is not readable by the client.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

/// The name of the cookie holding the session token.
pub const COOKIE_TOKEN: &str = "session_token";

/// How long sessions (and the cookie that carries them) are valid.
pub const DEFAULT_SESSION_DURATION: Duration = Duration::days(7);

/// Add the session cookie to the cookie jar, indicating that a user is
/// logged in and authenticated.
///
/// Returns the cookie jar with the cookie added.
pub(crate) fn set_session_cookie(
    jar: PrivateCookieJar,
    token: &str,
    duration: Duration,
) -> PrivateCookieJar {
    let expiry = OffsetDateTime::now_utc() + duration;

    jar.add(
        Cookie::build((COOKIE_TOKEN, token.to_owned()))
            .expires(expiry)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the session cookie to an invalid value and set its max age to zero,
/// which should delete the cookie on the client side.
pub(crate) fn clear_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Get the session token from the cookie jar, if any.
///
/// A cleared cookie reads as absent.
pub(crate) fn session_token(jar: &PrivateCookieJar) -> Option<String> {
    let token = jar.get(COOKIE_TOKEN)?.value_trimmed().to_owned();

    if token.is_empty() || token == "deleted" {
        return None;
    }

    Some(token)
}
