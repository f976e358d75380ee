//! The fund transfer record model.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{db::DatabaseId, models::UserId};

/// The channel recorded on every transfer.
pub const TRANSFER_CHANNEL: &str = "Online";
/// The category recorded on every transfer.
pub const TRANSFER_CATEGORY: &str = "Transfer";

/// A fund transfer between two linked bank accounts.
///
/// Transfers are immutable once created. The sender and receiver banks are
/// referenced by the aggregation provider's item id rather than the bank
/// record id, a denormalization that lets either side of a transfer be found
/// with a single query and no joins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    /// The record id assigned by the store.
    pub id: DatabaseId,
    pub name: String,
    /// The signed transfer amount.
    pub amount: f64,
    pub channel: String,
    pub category: String,
    pub sender_id: UserId,
    pub sender_bank_id: String,
    pub receiver_id: UserId,
    pub receiver_bank_id: String,
    /// The email address notified about the transfer.
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The fields for a transfer that has not been persisted yet.
///
/// The channel and category are fixed at insert time; callers cannot choose
/// them.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransfer {
    pub name: String,
    pub amount: f64,
    pub sender_id: UserId,
    pub sender_bank_id: String,
    pub receiver_id: UserId,
    pub receiver_bank_id: String,
    pub email: String,
}
