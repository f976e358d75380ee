//! Client for the bank aggregation provider.
//!
//! The aggregation provider links real bank accounts: a short-lived public
//! token from the client-side link flow is exchanged for a durable access
//! token, which is then used to read account metadata and mint processor
//! tokens scoped to the payments-processor integration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Error;

/// The result of exchanging a public link token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenExchange {
    /// The durable credential for reading the linked item.
    pub access_token: String,
    /// The provider's id for the linked institution item.
    pub item_id: String,
}

/// Metadata for one account under a linked item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountMetadata {
    /// The provider's unique id for the account.
    pub account_id: String,
    /// The account's display name.
    pub name: String,
    /// The last digits of the account number, when the provider shares them.
    #[serde(default)]
    pub mask: Option<String>,
}

/// Operations offered by the aggregation provider.
#[async_trait]
pub trait AggregationClient: Send + Sync {
    /// Request a short-lived link token for starting the client-side link
    /// flow.
    async fn create_link_token(&self, user_id: &str, client_name: &str) -> Result<String, Error>;

    /// Exchange a public link token for a durable access token and item id.
    ///
    /// Public tokens are single use; a failed exchange requires restarting
    /// the link flow for a fresh token.
    ///
    /// # Errors
    /// Returns [Error::TokenExchange] if the provider rejects the token.
    async fn exchange_public_token(&self, public_token: &str) -> Result<TokenExchange, Error>;

    /// Fetch the accounts available under an access token.
    ///
    /// # Errors
    /// Returns [Error::AccountFetch] if the metadata cannot be read.
    async fn get_accounts(&self, access_token: &str) -> Result<Vec<AccountMetadata>, Error>;

    /// Mint a processor token for one account, scoped to the payments
    /// processor integration.
    ///
    /// # Errors
    /// Returns [Error::ProcessorToken] if the provider refuses.
    async fn create_processor_token(
        &self,
        access_token: &str,
        account_id: &str,
    ) -> Result<String, Error>;
}

#[derive(Serialize)]
struct LinkTokenRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    client_name: &'a str,
    user: LinkTokenUser<'a>,
    products: [&'a str; 1],
    country_codes: [&'a str; 1],
    language: &'a str,
}

#[derive(Serialize)]
struct LinkTokenUser<'a> {
    client_user_id: &'a str,
}

#[derive(Deserialize)]
struct LinkTokenResponse {
    link_token: String,
}

#[derive(Serialize)]
struct ExchangeRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    public_token: &'a str,
}

#[derive(Serialize)]
struct AccountsRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    access_token: &'a str,
}

#[derive(Deserialize)]
struct AccountsResponse {
    accounts: Vec<AccountMetadata>,
}

#[derive(Serialize)]
struct ProcessorTokenRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    access_token: &'a str,
    account_id: &'a str,
    processor: &'a str,
}

#[derive(Deserialize)]
struct ProcessorTokenResponse {
    processor_token: String,
}

/// Aggregation provider client that talks JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAggregationClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    secret: String,
    /// The payments-processor integration processor tokens are scoped to.
    processor: String,
}

impl HttpAggregationClient {
    /// Create a client for the provider at `base_url` using the given API
    /// credentials.
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        secret: impl Into<String>,
        processor: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            client_id: client_id.into(),
            secret: secret.into(),
            processor: processor.into(),
        }
    }

    async fn post<Request, Response>(
        &self,
        path: &str,
        body: &Request,
    ) -> Result<Response, reqwest::Error>
    where
        Request: Serialize + Sync,
        Response: for<'de> Deserialize<'de>,
    {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

#[async_trait]
impl AggregationClient for HttpAggregationClient {
    async fn create_link_token(&self, user_id: &str, client_name: &str) -> Result<String, Error> {
        let response: LinkTokenResponse = self
            .post(
                "/link/token/create",
                &LinkTokenRequest {
                    client_id: &self.client_id,
                    secret: &self.secret,
                    client_name,
                    user: LinkTokenUser {
                        client_user_id: user_id,
                    },
                    products: ["auth"],
                    country_codes: ["US"],
                    language: "en",
                },
            )
            .await
            .map_err(|error| Error::Provider(error.to_string()))?;

        Ok(response.link_token)
    }

    async fn exchange_public_token(&self, public_token: &str) -> Result<TokenExchange, Error> {
        self.post(
            "/item/public_token/exchange",
            &ExchangeRequest {
                client_id: &self.client_id,
                secret: &self.secret,
                public_token,
            },
        )
        .await
        .map_err(|error| Error::TokenExchange(error.to_string()))
    }

    async fn get_accounts(&self, access_token: &str) -> Result<Vec<AccountMetadata>, Error> {
        let response: AccountsResponse = self
            .post(
                "/accounts/get",
                &AccountsRequest {
                    client_id: &self.client_id,
                    secret: &self.secret,
                    access_token,
                },
            )
            .await
            .map_err(|error| Error::AccountFetch(error.to_string()))?;

        Ok(response.accounts)
    }

    async fn create_processor_token(
        &self,
        access_token: &str,
        account_id: &str,
    ) -> Result<String, Error> {
        let response: ProcessorTokenResponse = self
            .post(
                "/processor/token/create",
                &ProcessorTokenRequest {
                    client_id: &self.client_id,
                    secret: &self.secret,
                    access_token,
                    account_id,
                    processor: &self.processor,
                },
            )
            .await
            .map_err(|error| Error::ProcessorToken(error.to_string()))?;

        Ok(response.processor_token)
    }
}
