//! Application router configuration with protected and unprotected route
//! definitions.

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    AppState,
    accounts::get_accounts_endpoint,
    auth::{AuthState, auth_guard},
    current_user::current_user_endpoint,
    endpoints,
    link_account::{create_link_token_endpoint, exchange_public_token_endpoint},
    logging::logging_middleware,
    sign_in::sign_in_endpoint,
    sign_out::sign_out_endpoint,
    sign_up::sign_up_endpoint,
    transfers::{create_transfer_endpoint, list_transfers_endpoint},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::SIGN_UP, post(sign_up_endpoint))
        .route(endpoints::SIGN_IN, post(sign_in_endpoint))
        .route(endpoints::SIGN_OUT, post(sign_out_endpoint))
        .route(endpoints::ME, get(current_user_endpoint));

    let protected_routes = Router::new()
        .route(endpoints::LINK_TOKEN, post(create_link_token_endpoint))
        .route(
            endpoints::EXCHANGE_PUBLIC_TOKEN,
            post(exchange_public_token_endpoint),
        )
        .route(endpoints::ACCOUNTS, get(get_accounts_endpoint))
        .route(
            endpoints::TRANSFERS,
            post(create_transfer_endpoint).get(list_transfers_endpoint),
        )
        .route_layer(middleware::from_fn_with_state(
            AuthState::from_ref(&state),
            auth_guard,
        ));

    protected_routes
        .merge(unprotected_routes)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod routing_tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        AppState, Error, build_router,
        models::{UserId, UserProfile},
        providers::{
            AccountMetadata, AggregationClient, IdentityProvider, NewCustomer, PaymentsClient,
            ProviderSession, TokenExchange,
        },
    };

    /// Identity provider double that accepts any credentials.
    struct StubIdentityProvider;

    #[async_trait]
    impl IdentityProvider for StubIdentityProvider {
        async fn sign_in(&self, _: &str, _: &str) -> Result<ProviderSession, Error> {
            Ok(ProviderSession {
                token: "token-1".to_owned(),
                user_id: UserId::new("user-1"),
            })
        }

        async fn sign_up(&self, _: &str, _: &str, _: &str) -> Result<ProviderSession, Error> {
            Ok(ProviderSession {
                token: "token-1".to_owned(),
                user_id: UserId::new("user-1"),
            })
        }

        async fn sign_out(&self, _: &str) -> Result<(), Error> {
            Ok(())
        }
    }

    struct StubAggregation;

    #[async_trait]
    impl AggregationClient for StubAggregation {
        async fn create_link_token(&self, _: &str, _: &str) -> Result<String, Error> {
            Ok("link-token-1".to_owned())
        }

        async fn exchange_public_token(&self, _: &str) -> Result<TokenExchange, Error> {
            Ok(TokenExchange {
                access_token: "access-token-1".to_owned(),
                item_id: "item-1".to_owned(),
            })
        }

        async fn get_accounts(&self, _: &str) -> Result<Vec<AccountMetadata>, Error> {
            Ok(vec![AccountMetadata {
                account_id: "acct-1".to_owned(),
                name: "Everyday Checking".to_owned(),
                mask: None,
            }])
        }

        async fn create_processor_token(&self, _: &str, _: &str) -> Result<String, Error> {
            Ok("processor-token-1".to_owned())
        }
    }

    struct StubPayments;

    #[async_trait]
    impl PaymentsClient for StubPayments {
        async fn create_customer(&self, _: &NewCustomer) -> Result<String, Error> {
            Ok("https://api.payments.test/customers/cus-1".to_owned())
        }

        async fn create_funding_source(&self, _: &str, _: &str, _: &str) -> Result<String, Error> {
            Ok("https://api.payments.test/funding-sources/fs-1".to_owned())
        }
    }

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "nafstenoas",
            Arc::new(StubIdentityProvider),
            Arc::new(StubAggregation),
            Arc::new(StubPayments),
        )
        .unwrap();

        TestServer::builder()
            .save_cookies()
            .build(build_router(state))
    }

    fn sign_up_body() -> serde_json::Value {
        json!({
            "email": "a@x.com",
            "password": "hunter2",
            "firstName": "A",
            "lastName": "B",
            "address1": "1 First Street",
            "city": "Springfield",
            "state": "IL",
            "postalCode": "62704",
            "dateOfBirth": "1990-01-01",
            "ssn": "123-45-6789",
        })
    }

    #[tokio::test]
    async fn sign_up_sets_cookie_and_me_returns_profile() {
        let server = get_test_server();

        let response = server.post("/api/sign_up").json(&sign_up_body()).await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let response = server.get("/api/me").await;
        response.assert_status_ok();
        let profile: Option<UserProfile> = response.json();
        let profile = profile.expect("expected a signed-in user");
        assert_eq!(profile.first_name, "A");
        assert_eq!(profile.national_id_last4, "6789");
    }

    #[tokio::test]
    async fn me_without_session_returns_null() {
        let server = get_test_server();

        let response = server.get("/api/me").await;

        response.assert_status_ok();
        let profile: Option<UserProfile> = response.json();
        assert_eq!(profile, None);
    }

    #[tokio::test]
    async fn protected_route_without_session_is_unauthorized() {
        let server = get_test_server();

        let response = server.get("/api/accounts").await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn full_link_flow_provisions_bank_account() {
        let server = get_test_server();
        server
            .post("/api/sign_up")
            .json(&sign_up_body())
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post("/api/exchange_public_token")
            .json(&json!({ "publicToken": "public-token-1" }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let bank: serde_json::Value = response.json();
        assert_eq!(bank["accountId"], "acct-1");
        assert_eq!(bank["bankId"], "item-1");
        // The durable credential must never appear in a response.
        assert!(bank.get("accessToken").is_none());

        let response = server.get("/api/accounts").await;
        response.assert_status_ok();
        let accounts: serde_json::Value = response.json();
        assert_eq!(accounts[0]["name"], "Everyday Checking");
    }

    #[tokio::test]
    async fn sign_out_clears_session() {
        let server = get_test_server();
        server
            .post("/api/sign_up")
            .json(&sign_up_body())
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        server.post("/api/sign_out").await.assert_status_ok();

        let profile: Option<UserProfile> = server.get("/api/me").await.json();
        assert_eq!(profile, None);
    }
}
