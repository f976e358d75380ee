//! The API endpoint URIs.

/// The route for creating an account and signing in.
pub const SIGN_UP: &str = "/api/sign_up";
/// The route for signing in an existing user.
pub const SIGN_IN: &str = "/api/sign_in";
/// The route for signing out the current user.
pub const SIGN_OUT: &str = "/api/sign_out";
/// The route for resolving the current user from the session cookie.
pub const ME: &str = "/api/me";
/// The route for requesting a short-lived bank-link token.
pub const LINK_TOKEN: &str = "/api/link_token";
/// The route for exchanging a public link token for a linked bank account.
pub const EXCHANGE_PUBLIC_TOKEN: &str = "/api/exchange_public_token";
/// The route for listing the current user's linked accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route for creating and listing fund transfers.
pub const TRANSFERS: &str = "/api/transfers";
