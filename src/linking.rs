//! The linked-account provisioning service.
//!
//! Linking runs a strictly ordered chain of external calls: exchange the
//! public link token, fetch account metadata, mint a processor token, create
//! a funding source, then persist the bank record. Each hop is a distinct
//! failure domain and raises immediately; there is no internal retry and no
//! compensation for earlier hops (in particular, an access token obtained
//! before a later failure is never revoked). The idempotent bank upsert is
//! the only safety net against duplicate linking on client-side retry.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::{
    Error,
    db::DatabaseId,
    models::{BankAccount, NewBankAccount, ProcessorCustomer, UserId, UserProfile, shareable_id},
    providers::{AggregationClient, NewCustomer, PaymentsClient},
    stores::{BankStore, ProfileStore},
};

/// A linked account as shown to the client: the stored bank record joined
/// with the provider's current metadata for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedAccount {
    /// The bank record id assigned by the store.
    pub id: DatabaseId,
    pub account_id: String,
    pub bank_id: String,
    pub name: String,
    pub mask: Option<String>,
    pub shareable_id: String,
}

/// An in-process cache of each user's linked account list.
///
/// A successful link invalidates the owner's entry so subsequent reads
/// observe the new account.
#[derive(Clone, Default)]
pub struct AccountCache {
    entries: Arc<Mutex<HashMap<String, Vec<LinkedAccount>>>>,
}

impl AccountCache {
    fn get(&self, user_id: &UserId) -> Option<Vec<LinkedAccount>> {
        self.entries.lock().unwrap().get(user_id.as_str()).cloned()
    }

    fn put(&self, user_id: &UserId, accounts: Vec<LinkedAccount>) {
        self.entries
            .lock()
            .unwrap()
            .insert(user_id.as_str().to_owned(), accounts);
    }

    fn invalidate(&self, user_id: &UserId) {
        self.entries.lock().unwrap().remove(user_id.as_str());
    }
}

/// Provisions linked bank accounts and serves the account list.
#[derive(Clone)]
pub struct AccountLinker {
    aggregation: Arc<dyn AggregationClient>,
    payments: Arc<dyn PaymentsClient>,
    banks: Arc<dyn BankStore>,
    profiles: Arc<dyn ProfileStore>,
    cache: AccountCache,
}

impl AccountLinker {
    /// Create a new linker.
    pub fn new(
        aggregation: Arc<dyn AggregationClient>,
        payments: Arc<dyn PaymentsClient>,
        banks: Arc<dyn BankStore>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        Self {
            aggregation,
            payments,
            banks,
            profiles,
            cache: AccountCache::default(),
        }
    }

    /// Request a short-lived link token for starting the client-side link
    /// flow.
    pub async fn create_link_token(&self, profile: &UserProfile) -> Result<String, Error> {
        let client_name = format!("{} {}", profile.first_name, profile.last_name);

        self.aggregation
            .create_link_token(profile.user_id.as_str(), &client_name)
            .await
    }

    /// Exchange a public link token and provision the resulting account.
    ///
    /// The steps are ordered by data dependency and must not be reordered:
    /// each hop's input is the previous hop's output. A failure leaves the
    /// side effects of earlier hops in place; since public link tokens are
    /// single use, the caller must restart the link flow rather than retry
    /// the same token.
    pub async fn exchange_public_token(
        &self,
        public_token: &str,
        profile: &UserProfile,
    ) -> Result<BankAccount, Error> {
        let exchange = self.aggregation.exchange_public_token(public_token).await?;

        let accounts = self.aggregation.get_accounts(&exchange.access_token).await?;
        let account = accounts
            .into_iter()
            .next()
            .ok_or_else(|| Error::AccountFetch("provider returned no accounts".to_owned()))?;

        let processor_token = self
            .aggregation
            .create_processor_token(&exchange.access_token, &account.account_id)
            .await?;

        let customer = self.ensure_processor_customer(profile).await?;
        let funding_source_url = self
            .payments
            .create_funding_source(&customer.id, &processor_token, &account.name)
            .await?;

        // Re-linking an already linked account lands here with the same
        // account_id and returns the original record.
        let bank = self.banks.upsert(NewBankAccount {
            shareable_id: shareable_id(&account.account_id),
            account_id: account.account_id,
            bank_id: exchange.item_id,
            access_token: exchange.access_token,
            funding_source_url,
            user_id: profile.user_id.clone(),
        })?;

        self.cache.invalidate(&profile.user_id);

        Ok(bank)
    }

    /// The user's linked accounts, each joined with the provider's current
    /// metadata.
    ///
    /// Fetches for different banks run concurrently; the results are joined
    /// before combining, with no ordering requirement on completion.
    pub async fn list_accounts(&self, user_id: &UserId) -> Result<Vec<LinkedAccount>, Error> {
        if let Some(accounts) = self.cache.get(user_id) {
            return Ok(accounts);
        }

        let banks = self.banks.list_by_user(user_id)?;

        let mut fetches = JoinSet::new();
        for bank in banks {
            let aggregation = self.aggregation.clone();
            fetches.spawn(async move { Self::fetch_linked_account(aggregation, bank).await });
        }

        let mut accounts = Vec::new();
        while let Some(joined) = fetches.join_next().await {
            let account = joined
                .map_err(|error| Error::Provider(format!("account fetch task failed: {error}")))??;
            accounts.push(account);
        }

        self.cache.put(user_id, accounts.clone());

        Ok(accounts)
    }

    async fn fetch_linked_account(
        aggregation: Arc<dyn AggregationClient>,
        bank: BankAccount,
    ) -> Result<LinkedAccount, Error> {
        let metadata = aggregation.get_accounts(&bank.access_token).await?;
        let account = metadata
            .into_iter()
            .find(|account| account.account_id == bank.account_id)
            .ok_or_else(|| {
                Error::AccountFetch(format!(
                    "linked account {} is no longer reported by the provider",
                    bank.account_id
                ))
            })?;

        Ok(LinkedAccount {
            id: bank.id,
            account_id: bank.account_id,
            bank_id: bank.bank_id,
            name: account.name,
            mask: account.mask,
            shareable_id: bank.shareable_id,
        })
    }

    /// Get the profile's payment-processor customer, creating and persisting
    /// one on first use.
    ///
    /// The customer reference stays absent until the user first links a bank
    /// account, so creation happens here rather than at sign-up.
    async fn ensure_processor_customer(
        &self,
        profile: &UserProfile,
    ) -> Result<ProcessorCustomer, Error> {
        if let Some(customer) = &profile.processor_customer {
            return Ok(customer.clone());
        }

        let customer_url = self
            .payments
            .create_customer(&NewCustomer::from_profile(profile))
            .await?;
        let customer = ProcessorCustomer::from_url(&customer_url).ok_or_else(|| {
            Error::CustomerCreation(format!("unparseable customer resource URL {customer_url}"))
        })?;

        self.profiles
            .set_processor_customer(&profile.user_id, &customer)?;

        Ok(customer)
    }
}

#[cfg(test)]
mod linking_tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use async_trait::async_trait;
    use rusqlite::Connection;

    use crate::{
        Error,
        db::CreateTable,
        models::{ProcessorCustomer, UserId, UserProfile},
        providers::{
            AccountMetadata, AggregationClient, NewCustomer, PaymentsClient, TokenExchange,
        },
        stores::{
            BankStore, ProfileStore,
            sqlite::{SqliteBankStore, SqliteProfileStore},
        },
    };

    use super::AccountLinker;

    /// Aggregation provider double backed by canned responses.
    struct StubAggregation {
        accounts: Vec<AccountMetadata>,
        fail_exchange: bool,
        fail_processor_token: bool,
    }

    impl StubAggregation {
        fn new() -> Self {
            Self {
                accounts: vec![AccountMetadata {
                    account_id: "acct-1".to_owned(),
                    name: "Everyday Checking".to_owned(),
                    mask: Some("0000".to_owned()),
                }],
                fail_exchange: false,
                fail_processor_token: false,
            }
        }
    }

    #[async_trait]
    impl AggregationClient for StubAggregation {
        async fn create_link_token(&self, user_id: &str, _: &str) -> Result<String, Error> {
            Ok(format!("link-token-for-{user_id}"))
        }

        async fn exchange_public_token(&self, _: &str) -> Result<TokenExchange, Error> {
            if self.fail_exchange {
                return Err(Error::TokenExchange("expired public token".to_owned()));
            }

            Ok(TokenExchange {
                access_token: "access-token-1".to_owned(),
                item_id: "item-1".to_owned(),
            })
        }

        async fn get_accounts(&self, _: &str) -> Result<Vec<AccountMetadata>, Error> {
            Ok(self.accounts.clone())
        }

        async fn create_processor_token(&self, _: &str, _: &str) -> Result<String, Error> {
            if self.fail_processor_token {
                return Err(Error::ProcessorToken("integration not enabled".to_owned()));
            }

            Ok("processor-token-1".to_owned())
        }
    }

    /// Payments processor double counting customer creations.
    struct StubPayments {
        customers_created: AtomicUsize,
        fail_funding_source: bool,
    }

    impl StubPayments {
        fn new() -> Self {
            Self {
                customers_created: AtomicUsize::new(0),
                fail_funding_source: false,
            }
        }
    }

    #[async_trait]
    impl PaymentsClient for StubPayments {
        async fn create_customer(&self, _: &NewCustomer) -> Result<String, Error> {
            self.customers_created.fetch_add(1, Ordering::SeqCst);
            Ok("https://api.payments.test/customers/cus-1".to_owned())
        }

        async fn create_funding_source(&self, _: &str, _: &str, _: &str) -> Result<String, Error> {
            if self.fail_funding_source {
                return Err(Error::FundingSource("invalid processor token".to_owned()));
            }

            Ok("https://api.payments.test/funding-sources/fs-1".to_owned())
        }
    }

    struct Fixture {
        linker: AccountLinker,
        banks: Arc<SqliteBankStore>,
        profiles: Arc<SqliteProfileStore>,
        payments: Arc<StubPayments>,
    }

    fn get_fixture(aggregation: StubAggregation, payments: StubPayments) -> Fixture {
        let conn = Connection::open_in_memory().unwrap();
        SqliteBankStore::create_table(&conn).unwrap();
        SqliteProfileStore::create_table(&conn).unwrap();
        let connection = Arc::new(Mutex::new(conn));

        let banks = Arc::new(SqliteBankStore::new(connection.clone()));
        let profiles = Arc::new(SqliteProfileStore::new(connection));
        let payments = Arc::new(payments);

        let linker = AccountLinker::new(
            Arc::new(aggregation),
            payments.clone(),
            banks.clone(),
            profiles.clone(),
        );

        Fixture {
            linker,
            banks,
            profiles,
            payments,
        }
    }

    fn test_profile(profiles: &SqliteProfileStore) -> UserProfile {
        profiles
            .upsert(UserProfile {
                user_id: UserId::new("user-1"),
                email: "a@x.com".to_owned(),
                first_name: "A".to_owned(),
                last_name: "B".to_owned(),
                address1: "1 First Street".to_owned(),
                city: "Springfield".to_owned(),
                state: "IL".to_owned(),
                postal_code: "62704".to_owned(),
                date_of_birth: "1990-01-01".to_owned(),
                national_id_last4: "6789".to_owned(),
                processor_customer: None,
            })
            .unwrap()
    }

    #[tokio::test]
    async fn exchange_persists_bank_and_customer() {
        let fixture = get_fixture(StubAggregation::new(), StubPayments::new());
        let profile = test_profile(&fixture.profiles);

        let bank = fixture
            .linker
            .exchange_public_token("public-token-1", &profile)
            .await
            .unwrap();

        assert_eq!(bank.account_id, "acct-1");
        assert_eq!(bank.bank_id, "item-1");
        assert_eq!(bank.access_token, "access-token-1");
        assert_eq!(
            bank.funding_source_url,
            "https://api.payments.test/funding-sources/fs-1"
        );
        assert_eq!(bank.user_id, UserId::new("user-1"));

        let stored_profile = fixture
            .profiles
            .find_by_user_id(&UserId::new("user-1"))
            .unwrap()
            .unwrap();
        assert_eq!(
            stored_profile.processor_customer,
            ProcessorCustomer::from_url("https://api.payments.test/customers/cus-1")
        );
    }

    #[tokio::test]
    async fn relinking_same_account_returns_existing_record() {
        let fixture = get_fixture(StubAggregation::new(), StubPayments::new());
        let profile = test_profile(&fixture.profiles);

        let first = fixture
            .linker
            .exchange_public_token("public-token-1", &profile)
            .await
            .unwrap();
        let second = fixture
            .linker
            .exchange_public_token("public-token-2", &profile)
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let banks = fixture.banks.list_by_user(&UserId::new("user-1")).unwrap();
        assert_eq!(banks.len(), 1);
    }

    #[tokio::test]
    async fn failed_funding_source_persists_nothing() {
        let mut payments = StubPayments::new();
        payments.fail_funding_source = true;
        let fixture = get_fixture(StubAggregation::new(), payments);
        let profile = test_profile(&fixture.profiles);

        let result = fixture
            .linker
            .exchange_public_token("public-token-1", &profile)
            .await;

        assert!(matches!(result, Err(Error::FundingSource(_))));
        // No bank record means the access token obtained earlier in the
        // chain was never persisted.
        assert_eq!(fixture.banks.find_by_account_id("acct-1").unwrap(), None);
    }

    #[tokio::test]
    async fn failed_exchange_stops_the_chain() {
        let mut aggregation = StubAggregation::new();
        aggregation.fail_exchange = true;
        let fixture = get_fixture(aggregation, StubPayments::new());
        let profile = test_profile(&fixture.profiles);

        let result = fixture
            .linker
            .exchange_public_token("public-token-1", &profile)
            .await;

        assert!(matches!(result, Err(Error::TokenExchange(_))));
        assert_eq!(
            fixture
                .payments
                .customers_created
                .load(Ordering::SeqCst),
            0
        );
    }

    #[tokio::test]
    async fn empty_account_list_is_an_account_fetch_error() {
        let mut aggregation = StubAggregation::new();
        aggregation.accounts.clear();
        let fixture = get_fixture(aggregation, StubPayments::new());
        let profile = test_profile(&fixture.profiles);

        let result = fixture
            .linker
            .exchange_public_token("public-token-1", &profile)
            .await;

        assert!(matches!(result, Err(Error::AccountFetch(_))));
    }

    #[tokio::test]
    async fn existing_customer_is_reused() {
        let fixture = get_fixture(StubAggregation::new(), StubPayments::new());
        test_profile(&fixture.profiles);
        let customer =
            ProcessorCustomer::from_url("https://api.payments.test/customers/cus-9").unwrap();
        fixture
            .profiles
            .set_processor_customer(&UserId::new("user-1"), &customer)
            .unwrap();
        let profile = fixture
            .profiles
            .find_by_user_id(&UserId::new("user-1"))
            .unwrap()
            .unwrap();

        fixture
            .linker
            .exchange_public_token("public-token-1", &profile)
            .await
            .unwrap();

        assert_eq!(
            fixture
                .payments
                .customers_created
                .load(Ordering::SeqCst),
            0
        );
    }

    #[tokio::test]
    async fn successful_link_invalidates_cached_account_list() {
        let fixture = get_fixture(StubAggregation::new(), StubPayments::new());
        let profile = test_profile(&fixture.profiles);

        // Prime the cache with the (empty) pre-link account list.
        let before = fixture.linker.list_accounts(&profile.user_id).await.unwrap();
        assert_eq!(before, vec![]);

        fixture
            .linker
            .exchange_public_token("public-token-1", &profile)
            .await
            .unwrap();

        let after = fixture.linker.list_accounts(&profile.user_id).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].account_id, "acct-1");
        assert_eq!(after[0].name, "Everyday Checking");
    }

    #[tokio::test]
    async fn create_link_token_forwards_user_identity() {
        let fixture = get_fixture(StubAggregation::new(), StubPayments::new());
        let profile = test_profile(&fixture.profiles);

        let token = fixture.linker.create_link_token(&profile).await.unwrap();

        assert_eq!(token, "link-token-for-user-1");
    }
}
