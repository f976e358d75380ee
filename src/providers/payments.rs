//! Client for the payments processor.
//!
//! The processor represents users as customer resources and linked bank
//! accounts as funding sources; both are addressed by the resource URLs the
//! processor returns in `Location` headers.

use async_trait::async_trait;
use reqwest::header::LOCATION;
use serde::Serialize;

use crate::{Error, models::UserProfile};

/// The fields for creating a payments-processor customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub customer_type: String,
    pub address1: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub date_of_birth: String,
    /// The last four digits of the national identifier; the full value is
    /// never stored, so this is all the processor receives.
    pub ssn: String,
}

impl NewCustomer {
    /// Build a personal customer request from a user's profile.
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            email: profile.email.clone(),
            customer_type: "personal".to_owned(),
            address1: profile.address1.clone(),
            city: profile.city.clone(),
            state: profile.state.clone(),
            postal_code: profile.postal_code.clone(),
            date_of_birth: profile.date_of_birth.clone(),
            ssn: profile.national_id_last4.clone(),
        }
    }
}

/// Operations offered by the payments processor.
#[async_trait]
pub trait PaymentsClient: Send + Sync {
    /// Create a customer record, returning its resource URL.
    ///
    /// # Errors
    /// Returns [Error::CustomerCreation] if the processor refuses.
    async fn create_customer(&self, customer: &NewCustomer) -> Result<String, Error>;

    /// Create a funding source for a customer from a processor token,
    /// returning the funding source's resource URL.
    ///
    /// # Errors
    /// Returns [Error::FundingSource] if the processor rejects the token or
    /// the customer id.
    async fn create_funding_source(
        &self,
        customer_id: &str,
        processor_token: &str,
        bank_name: &str,
    ) -> Result<String, Error>;
}

#[derive(Serialize)]
struct FundingSourceRequest<'a> {
    #[serde(rename = "plaidToken")]
    processor_token: &'a str,
    name: &'a str,
}

/// Payments processor client that talks JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpPaymentsClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl HttpPaymentsClient {
    /// Create a client for the processor at `base_url`.
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }

    /// Pull the created resource's URL out of the `Location` header.
    fn resource_location(response: &reqwest::Response) -> Option<String> {
        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    }
}

#[async_trait]
impl PaymentsClient for HttpPaymentsClient {
    async fn create_customer(&self, customer: &NewCustomer) -> Result<String, Error> {
        let response = self
            .client
            .post(format!("{}/customers", self.base_url))
            .bearer_auth(&self.api_token)
            .json(customer)
            .send()
            .await
            .map_err(|error| Error::CustomerCreation(error.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::CustomerCreation(format!(
                "customer creation failed with status {}",
                response.status()
            )));
        }

        Self::resource_location(&response).ok_or_else(|| {
            Error::CustomerCreation("response did not include a resource location".to_owned())
        })
    }

    async fn create_funding_source(
        &self,
        customer_id: &str,
        processor_token: &str,
        bank_name: &str,
    ) -> Result<String, Error> {
        let response = self
            .client
            .post(format!(
                "{}/customers/{}/funding-sources",
                self.base_url, customer_id
            ))
            .bearer_auth(&self.api_token)
            .json(&FundingSourceRequest {
                processor_token,
                name: bank_name,
            })
            .send()
            .await
            .map_err(|error| Error::FundingSource(error.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::FundingSource(format!(
                "funding source creation failed with status {}",
                response.status()
            )));
        }

        Self::resource_location(&response).ok_or_else(|| {
            Error::FundingSource("response did not include a resource location".to_owned())
        })
    }
}
