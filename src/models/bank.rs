//! The linked bank account model.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Serialize;

use crate::{db::DatabaseId, models::UserId};

/// A bank account linked through the aggregation provider.
///
/// At most one record exists per `account_id`; re-linking the same external
/// account returns the existing record instead of creating a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    /// The record id assigned by the store.
    pub id: DatabaseId,
    /// The account id assigned by the aggregation provider. Unique.
    pub account_id: String,
    /// The aggregation provider's item id for the linked institution.
    pub bank_id: String,
    /// The durable credential for reading this account from the aggregation
    /// provider. Never serialized into API responses.
    #[serde(skip_serializing)]
    pub access_token: String,
    /// The payments-processor funding source backed by this account.
    pub funding_source_url: String,
    /// A link-safe derivative of `account_id`.
    pub shareable_id: String,
    /// The profile that owns this account.
    pub user_id: UserId,
}

/// The fields for a bank account that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBankAccount {
    pub account_id: String,
    pub bank_id: String,
    pub access_token: String,
    pub funding_source_url: String,
    pub shareable_id: String,
    pub user_id: UserId,
}

/// Derive the link-safe shareable id for an external account id.
pub fn shareable_id(account_id: &str) -> String {
    URL_SAFE_NO_PAD.encode(account_id)
}
