//! Finlink is a personal-finance web service: users sign up, authenticate,
//! link bank accounts through a third-party aggregation provider, provision
//! payment funding sources through a payments processor, and record fund
//! transfers between linked accounts.
//!
//! This library provides a JSON REST API. The external collaborators (the
//! identity provider, the aggregation provider and the payments processor)
//! are reached over HTTP and modelled as traits so the services that depend
//! on them can be tested in process.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod accounts;
mod auth;
mod config;
mod current_user;
mod db;
mod endpoints;
mod error;
mod link_account;
mod linking;
mod logging;
mod models;
mod providers;
mod routing;
mod sign_in;
mod sign_out;
mod sign_up;
mod state;
mod stores;
mod transfers;

pub use config::Config;
pub use db::initialize as initialize_db;
pub use error::Error;
pub use providers::{HttpAggregationClient, HttpIdentityProvider, HttpPaymentsClient};
pub use routing::build_router;
pub use state::AppState;

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down
/// gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
