//! Budget Tracker is a web app for recording expenses and incomes and
//! seeing where the money goes.
//!
//! This library provides an HTTP server that directly serves HTML pages,
//! plus a handful of downloads (CSV and PDF reports) and a JSON endpoint for
//! the charts page.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod aggregation;
mod alert;
mod amount;
mod app_state;
mod auth;
mod budget;
mod category;
mod charts;
mod db;
mod endpoints;
mod error;
mod home;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod period;
mod report;
mod routing;
mod timezone;
mod transaction;
mod validation;

#[cfg(test)]
mod test_utils;

pub use amount::Amount;
pub use app_state::{AppState, create_cookie_key};
pub use auth::{
    PasswordHash, User, UserID, Username, ValidatedPassword, create_user, get_user_by_username,
    update_password,
};
pub use budget::create_budget;
pub use category::{CategoryName, get_or_create_category};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use transaction::{NewTransaction, TransactionKind, create_transaction};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
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
