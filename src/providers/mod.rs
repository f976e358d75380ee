//! Clients for the external collaborators: the identity provider, the bank
//! aggregation provider, and the payments processor.
//!
//! Each collaborator is a trait so the services that depend on it can be
//! exercised against in-process doubles; the HTTP implementations talk JSON
//! over reqwest.

mod aggregation;
mod identity;
mod payments;

pub use aggregation::{
    AccountMetadata, AggregationClient, HttpAggregationClient, TokenExchange,
};
pub use identity::{HttpIdentityProvider, IdentityProvider, ProviderSession};
pub use payments::{HttpPaymentsClient, NewCustomer, PaymentsClient};
