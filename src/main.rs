use std::sync::Arc;

use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use finlink_rs::{
    AppState, Config, HttpAggregationClient, HttpIdentityProvider, HttpPaymentsClient,
    build_router, graceful_shutdown,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer().with_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            ),
        )
        .init();

    let config = Config::parse();

    let db_connection =
        Connection::open(&config.db_path).expect("Could not open the database file");

    let http_client = reqwest::Client::new();
    let identity = Arc::new(HttpIdentityProvider::new(
        http_client.clone(),
        config.identity_provider_url.clone(),
    ));
    let aggregation = Arc::new(HttpAggregationClient::new(
        http_client.clone(),
        config.aggregation_url.clone(),
        config.aggregation_client_id.clone(),
        config.aggregation_secret.clone(),
        config.aggregation_processor.clone(),
    ));
    let payments = Arc::new(HttpPaymentsClient::new(
        http_client,
        config.payments_url.clone(),
        config.payments_api_token.clone(),
    ));

    let state = AppState::new(
        db_connection,
        &config.cookie_secret,
        identity,
        aggregation,
        payments,
    )
    .expect("Could not initialize the application state");

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    tracing::info!("HTTP server listening on {}", config.address);
    axum_server::bind(config.address)
        .handle(handle)
        .serve(build_router(state).into_make_service())
        .await
        .unwrap();
}
