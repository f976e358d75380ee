//! Defines the transfer store trait.

use crate::{
    Error,
    models::{NewTransfer, Transfer},
};

/// Handles the creation and retrieval of fund transfers.
pub trait TransferStore: Send + Sync {
    /// Insert an immutable transfer record.
    ///
    /// Amounts and identifiers are validated by the caller, not the store.
    fn create(&self, new_transfer: NewTransfer) -> Result<Transfer, Error>;

    /// Get every transfer where the bank participates as the sender or as
    /// the receiver, merged into one unordered sequence.
    ///
    /// Callers are responsible for sorting or filtering by direction.
    fn list_by_bank_id(&self, bank_id: &str) -> Result<Vec<Transfer>, Error>;
}
