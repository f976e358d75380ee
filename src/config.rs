//! The command line and environment configuration for the server.

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

/// The settings needed to run the server.
///
/// Every flag can also be supplied through its environment variable, which
/// is how secrets are expected to arrive in deployment.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Personal-finance server: bank linking and fund transfers")]
pub struct Config {
    /// The address to listen on.
    #[arg(long, env = "FINLINK_ADDRESS", default_value = "127.0.0.1:3000")]
    pub address: SocketAddr,

    /// The path to the SQLite database file.
    #[arg(long, env = "FINLINK_DB_PATH", default_value = "finlink.db")]
    pub db_path: PathBuf,

    /// The secret the cookie signing key is derived from.
    #[arg(long, env = "FINLINK_COOKIE_SECRET", hide_env_values = true)]
    pub cookie_secret: String,

    /// The identity provider's base URL.
    #[arg(long, env = "IDENTITY_PROVIDER_URL")]
    pub identity_provider_url: String,

    /// The aggregation provider's base URL.
    #[arg(long, env = "AGGREGATION_URL")]
    pub aggregation_url: String,

    /// The client id for the aggregation provider API.
    #[arg(long, env = "AGGREGATION_CLIENT_ID")]
    pub aggregation_client_id: String,

    /// The secret for the aggregation provider API.
    #[arg(long, env = "AGGREGATION_SECRET", hide_env_values = true)]
    pub aggregation_secret: String,

    /// The payments-processor integration that processor tokens are scoped
    /// to.
    #[arg(long, env = "AGGREGATION_PROCESSOR", default_value = "dwolla")]
    pub aggregation_processor: String,

    /// The payments processor's base URL.
    #[arg(long, env = "PAYMENTS_URL")]
    pub payments_url: String,

    /// The API token for the payments processor.
    #[arg(long, env = "PAYMENTS_API_TOKEN", hide_env_values = true)]
    pub payments_api_token: String,
}
