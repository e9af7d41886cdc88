//! Walletfolio is a web app for tracking wallets, spending, and savings.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod alert;
mod app_state;
mod budget;
mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod goal;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod pagination;
mod routing;
mod session;
mod shared_templates;
#[cfg(test)]
mod test_utils;
mod timezone;
mod transaction;
mod transfer;
mod wallet;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use session::{DEFAULT_USER_ID, UserContext, UserId};

use crate::{
    alert::Alert,
    internal_server_error::{InternalServerErrorPageTemplate, render_internal_server_error},
    not_found::get_404_not_found_response,
    transaction::CategoryId,
    wallet::WalletId,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
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

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The wallet ID did not match one of the user's wallets.
    #[error("the wallet ID does not refer to one of your wallets")]
    WalletNotFound(Option<WalletId>),

    /// The specified wallet name already exists for this user.
    #[error("the wallet \"{0}\" already exists")]
    DuplicateWalletName(String),

    /// Tried to delete a wallet that still has transactions or transfers.
    #[error("the wallet still has transactions or transfers recorded against it")]
    WalletHasRecords,

    /// Tried to delete a wallet whose balance is not zero.
    #[error("the wallet balance is not zero")]
    WalletBalanceNonZero,

    /// A transfer named the same wallet as both source and destination.
    #[error("source and destination wallets must be different")]
    SameWalletTransfer,

    /// A transfer amount was not positive or its fee was negative.
    #[error("transfer amount must be positive and the fee cannot be negative")]
    InvalidTransferAmount,

    /// The source wallet cannot cover the transfer amount plus fee.
    #[error("insufficient balance: available {available:.2}, required {required:.2}")]
    InsufficientBalance {
        /// The source wallet's current balance.
        available: f64,
        /// The amount plus fee the transfer would deduct.
        required: f64,
    },

    /// The category ID used for a transaction did not match a visible category.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// Tried to add money to a savings goal that does not exist.
    #[error("the savings goal could not be found")]
    GoalNotFound,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound | Error::WalletNotFound(_) => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => {
                render_internal_server_error(InternalServerErrorPageTemplate {
                    description: "Invalid Timezone Settings",
                    fix: &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to a valid, canonical timezone string"
                    ),
                })
            }
            Error::DatabaseLockError => render_internal_server_error(Default::default()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(Default::default())
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::WalletNotFound(wallet_id) => (
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Wallet not found",
                    &format!("Could not find a wallet with the ID {wallet_id:?}. Try refreshing the page."),
                ),
            ),
            Error::DuplicateWalletName(name) => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Duplicate wallet name",
                    &format!(
                        "The wallet {name} already exists. \
                        Choose a different name, or edit or delete the existing wallet.",
                    ),
                ),
            ),
            Error::WalletHasRecords => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Could not delete wallet",
                    "The wallet still has transactions or transfers recorded against it. \
                    Deactivate the wallet instead to hide it without losing history.",
                ),
            ),
            Error::WalletBalanceNonZero => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Could not delete wallet",
                    "The wallet balance is not zero. Transfer the remaining funds to \
                    another wallet first, or deactivate the wallet instead.",
                ),
            ),
            Error::SameWalletTransfer => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Invalid transfer",
                    "The source and destination wallets must be different.",
                ),
            ),
            Error::InvalidTransferAmount => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Invalid transfer",
                    "The transfer amount must be greater than zero and the fee cannot be negative.",
                ),
            ),
            Error::InsufficientBalance {
                available,
                required,
            } => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Insufficient balance",
                    &format!(
                        "The source wallet cannot cover this transfer. \
                        Available: {}, required: {}.",
                        html::format_currency(available),
                        html::format_currency(required)
                    ),
                ),
            ),
            Error::InvalidCategory(category_id) => (
                StatusCode::BAD_REQUEST,
                Alert::error(
                    "Invalid category",
                    &format!("Could not find a category with the ID {category_id:?}"),
                ),
            ),
            Error::GoalNotFound => (
                StatusCode::NOT_FOUND,
                Alert::error(
                    "Could not update savings goal",
                    "The savings goal could not be found. \
                    Try refreshing the page to see if it has already been removed.",
                ),
            ),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::error(
                        "Something went wrong",
                        "An unexpected error occurred, check the server logs for more details.",
                    ),
                )
            }
        };

        (status_code, alert.into_html()).into_response()
    }
}
