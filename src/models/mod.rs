//! The domain models of the application.

mod bank;
mod profile;
mod session;
mod transfer;

pub use bank::{BankAccount, NewBankAccount, shareable_id};
pub use profile::{ProcessorCustomer, UserId, UserProfile};
pub use session::Session;
pub use transfer::{NewTransfer, TRANSFER_CATEGORY, TRANSFER_CHANNEL, Transfer};
