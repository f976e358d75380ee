//! This file defines the routes for creating and listing fund transfers.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    AppState, Error,
    models::{NewTransfer, Transfer, UserProfile},
    stores::{BankStore, TransferStore},
};

/// The fields a user submits to create a transfer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferData {
    /// The display name for the transfer.
    pub name: String,
    /// The signed transfer amount.
    pub amount: f64,
    /// The aggregation item id of the sending bank.
    pub sender_bank_id: String,
    /// The aggregation item id of the receiving bank.
    pub receiver_bank_id: String,
    /// The email address to notify about the transfer.
    pub email: String,
}

/// Record a transfer between two linked banks.
///
/// Both bank references are checked against the store before the record is
/// written, and the sending bank must belong to the caller. The store itself
/// does not enforce this, so the check lives here at the write site.
///
/// # Errors
///
/// Returns [Error::NotFound] if either bank id matches no stored record, or
/// if the sending bank belongs to a different user. The response does not
/// reveal which of the two it was.
pub fn record_transfer(
    bank_store: &Arc<dyn BankStore>,
    transfer_store: &Arc<dyn TransferStore>,
    profile: &UserProfile,
    data: CreateTransferData,
) -> Result<Transfer, Error> {
    let sender_bank = bank_store
        .find_by_bank_id(&data.sender_bank_id)?
        .ok_or(Error::NotFound)?;

    if sender_bank.user_id != profile.user_id {
        return Err(Error::NotFound);
    }

    let receiver_bank = bank_store
        .find_by_bank_id(&data.receiver_bank_id)?
        .ok_or(Error::NotFound)?;

    transfer_store.create(NewTransfer {
        name: data.name,
        amount: data.amount,
        sender_id: sender_bank.user_id,
        sender_bank_id: data.sender_bank_id,
        receiver_id: receiver_bank.user_id,
        receiver_bank_id: data.receiver_bank_id,
        email: data.email,
    })
}

/// Handler for creating a transfer via the POST method.
pub async fn create_transfer_endpoint(
    State(state): State<AppState>,
    Extension(profile): Extension<UserProfile>,
    Json(data): Json<CreateTransferData>,
) -> Result<impl IntoResponse, Error> {
    let transfer = record_transfer(&state.bank_store, &state.transfer_store, &profile, data)?;

    Ok((StatusCode::CREATED, Json(transfer)))
}

/// The query parameters for listing transfers.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferListParams {
    /// The aggregation item id of the bank whose transfers to list.
    pub bank_id: String,
}

/// Handler that lists the transfers a bank participates in, as sender or as
/// receiver, in no particular order.
pub async fn list_transfers_endpoint(
    State(state): State<AppState>,
    Query(params): Query<TransferListParams>,
) -> Result<Json<Vec<Transfer>>, Error> {
    let transfers = state.transfer_store.list_by_bank_id(&params.bank_id)?;

    Ok(Json(transfers))
}
