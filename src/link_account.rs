//! This file defines the routes for the bank-link flow: requesting a link
//! token and exchanging the public token the client-side flow produces.

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, Error, models::UserProfile};

/// Handler that requests a short-lived link token for the current user.
///
/// The token starts the client-side link flow with the aggregation provider;
/// it is not persisted anywhere.
pub async fn create_link_token_endpoint(
    State(state): State<AppState>,
    Extension(profile): Extension<UserProfile>,
) -> Result<impl IntoResponse, Error> {
    let link_token = state.linker.create_link_token(&profile).await?;

    Ok(Json(json!({ "linkToken": link_token })))
}

/// The body for exchanging a public link token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeData {
    /// The single-use public token produced by the client-side link flow.
    pub public_token: String,
}

/// Handler that runs the provisioning chain for a public link token.
///
/// On success the new (or, when re-linking, the existing) bank record is
/// returned without its access token.
///
/// # Errors
///
/// Provisioning failures surface as "linking failed, try again": the public
/// token is single use, so the client must restart the link flow from the
/// beginning rather than resubmit.
pub async fn exchange_public_token_endpoint(
    State(state): State<AppState>,
    Extension(profile): Extension<UserProfile>,
    Json(data): Json<ExchangeData>,
) -> Result<impl IntoResponse, Error> {
    let bank = state
        .linker
        .exchange_public_token(&data.public_token, &profile)
        .await?;

    Ok((StatusCode::CREATED, Json(bank)))
}
