//! Defines the bank account store trait.

use crate::{
    Error,
    models::{BankAccount, NewBankAccount, UserId},
};

/// Handles the creation and retrieval of linked bank accounts.
pub trait BankStore: Send + Sync {
    /// Insert a bank account, or return the existing record if one already
    /// exists for the same external account id.
    ///
    /// The first insert is authoritative: on conflict the existing record's
    /// fields are left untouched and returned as-is. This makes the tail of
    /// the linking flow safe to retry even though the public link token that
    /// started it is single use.
    fn upsert(&self, new_bank: NewBankAccount) -> Result<BankAccount, Error>;

    /// Get all bank accounts linked by a user, in the store's natural order.
    fn list_by_user(&self, user_id: &UserId) -> Result<Vec<BankAccount>, Error>;

    /// Point lookup by the aggregation provider's account id.
    ///
    /// Absence is a valid result, not an error.
    fn find_by_account_id(&self, account_id: &str) -> Result<Option<BankAccount>, Error>;

    /// Look up a bank account by the aggregation provider's item id.
    ///
    /// Absence is a valid result, not an error.
    fn find_by_bank_id(&self, bank_id: &str) -> Result<Option<BankAccount>, Error>;
}
