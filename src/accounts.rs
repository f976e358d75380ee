//! This file defines the route for listing the current user's linked
//! accounts.

use axum::{Extension, Json, extract::State};

use crate::{AppState, Error, linking::LinkedAccount, models::UserProfile};

/// Handler that lists the current user's linked accounts.
///
/// Live metadata for each account is fetched from the aggregation provider,
/// one concurrent fetch per linked bank, and served from the in-process
/// cache until the next link invalidates it.
pub async fn get_accounts_endpoint(
    State(state): State<AppState>,
    Extension(profile): Extension<UserProfile>,
) -> Result<Json<Vec<LinkedAccount>>, Error> {
    let accounts = state.linker.list_accounts(&profile.user_id).await?;

    Ok(Json(accounts))
}
