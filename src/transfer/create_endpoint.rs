//! Defines the endpoint for executing a wallet-to-wallet transfer.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;
use serde::Deserialize;
use time::{Date, macros::format_description};

use crate::{
    AppState, Error, UserContext,
    alert::Alert,
    html::format_currency,
    session::UserId,
    timezone::today_in,
    transfer::{
        NewTransfer, execute_transfer, get_recent_transfers,
        transfer_page::{
            RECENT_TRANSFERS_LIMIT, recent_transfers_panel, transfer_form_view,
        },
    },
    wallet::{Wallet, get_active_wallets},
};

/// The state needed to execute a transfer.
#[derive(Debug, Clone)]
pub struct CreateTransferState {
    /// The database connection for executing transfers.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransferState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The form data for a wallet transfer.
///
/// Fields arrive as strings so invalid input can be redisplayed verbatim
/// alongside the validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferForm {
    #[serde(default)]
    pub from_wallet_id: String,
    #[serde(default)]
    pub to_wallet_id: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub fee: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub description: String,
}

impl TransferForm {
    /// Check the form against the user's active wallets and convert it into
    /// the typed transfer fields.
    ///
    /// All problems are collected so the user sees every issue at once;
    /// nothing is written when any check fails. The balance check here is a
    /// pre-check for a friendly message: [execute_transfer] re-checks
    /// atomically before moving money.
    fn validate(&self, user_id: UserId, wallets: &[Wallet]) -> Result<NewTransfer, Vec<String>> {
        let mut errors = Vec::new();

        let from_wallet_id = self.from_wallet_id.parse::<i64>().unwrap_or(0);
        let to_wallet_id = self.to_wallet_id.parse::<i64>().unwrap_or(0);

        if from_wallet_id <= 0 || to_wallet_id <= 0 {
            errors.push("Please select both source and destination wallets.".to_owned());
        } else if from_wallet_id == to_wallet_id {
            errors.push("Source and destination wallets cannot be the same.".to_owned());
        }

        let from_wallet = wallets.iter().find(|w| w.id == from_wallet_id);
        if from_wallet_id > 0 && from_wallet.is_none() {
            errors.push("Source wallet not found or not active.".to_owned());
        }
        if to_wallet_id > 0
            && from_wallet_id != to_wallet_id
            && !wallets.iter().any(|w| w.id == to_wallet_id)
        {
            errors.push("Destination wallet not found or not active.".to_owned());
        }

        let amount = self.amount.trim().parse::<f64>().unwrap_or(0.0);
        if amount <= 0.0 {
            errors.push("Please enter a valid amount greater than 0.".to_owned());
        }

        let fee = if self.fee.trim().is_empty() {
            Ok(0.0)
        } else {
            self.fee.trim().parse::<f64>()
        };
        let fee = match fee {
            Ok(fee) if fee >= 0.0 => fee,
            Ok(_) => {
                errors.push("Fees cannot be negative.".to_owned());
                0.0
            }
            Err(_) => {
                errors.push("Fees cannot be negative.".to_owned());
                0.0
            }
        };

        if let Some(wallet) = from_wallet {
            let required = amount + fee;
            if amount > 0.0 && wallet.balance < required {
                errors.push(format!(
                    "Insufficient balance in source wallet. Available: {}, Required: {}.",
                    format_currency(wallet.balance),
                    format_currency(required)
                ));
            }
        }

        let date_format = format_description!("[year]-[month]-[day]");
        let date = match Date::parse(self.date.trim(), &date_format) {
            Ok(date) => date,
            Err(_) => {
                errors.push("Please enter a valid date.".to_owned());
                Date::MIN
            }
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewTransfer {
            user_id,
            from_wallet_id,
            to_wallet_id,
            amount,
            fee,
            date,
            description: self.description.trim().to_owned(),
        })
    }
}

/// A route handler for executing a transfer.
///
/// On success the response carries a success banner, a cleared form, and an
/// out-of-band refresh of the recent transfers panel. On any failure no
/// balance change persists and the form is re-rendered with the submitted
/// values.
pub async fn create_transfer_endpoint(
    State(state): State<CreateTransferState>,
    user: UserContext,
    Form(form): Form<TransferForm>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let today = match today_in(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let wallets = match get_active_wallets(user.user_id, &connection) {
        Ok(wallets) => wallets,
        Err(error) => return error.into_alert_response(),
    };

    let new_transfer = match form.validate(user.user_id, &wallets) {
        Ok(new_transfer) => new_transfer,
        Err(errors) => {
            return transfer_form_view(&wallets, &form, &[], &errors.join(" ")).into_response();
        }
    };

    let transfer = match execute_transfer(&new_transfer, &mut connection) {
        Ok(transfer) => transfer,
        Err(
            error @ (Error::InsufficientBalance { .. }
            | Error::SameWalletTransfer
            | Error::InvalidTransferAmount
            | Error::WalletNotFound(_)),
        ) => {
            return transfer_form_view(&wallets, &form, &[], &error.to_string()).into_response();
        }
        Err(error) => {
            tracing::error!("transfer failed with {form:?}: {error}");
            return error.into_alert_response();
        }
    };

    // Re-read wallets and transfers so the response shows the new balances.
    let wallets = match get_active_wallets(user.user_id, &connection) {
        Ok(wallets) => wallets,
        Err(error) => return error.into_alert_response(),
    };
    let transfers = match get_recent_transfers(user.user_id, RECENT_TRANSFERS_LIMIT, &connection) {
        Ok(transfers) => transfers,
        Err(error) => return error.into_alert_response(),
    };

    let details = if transfer.fee > 0.0 {
        format!(
            "Moved {}. Transfer fees of {} were deducted.",
            format_currency(transfer.amount),
            format_currency(transfer.fee)
        )
    } else {
        format!("Moved {}.", format_currency(transfer.amount))
    };
    let success = Alert::success("Transfer completed successfully!", &details);

    let cleared_form = TransferForm {
        date: today.to_string(),
        fee: "0.00".to_owned(),
        ..Default::default()
    };

    let fragment = html! {
        (transfer_form_view(&wallets, &cleared_form, &[success], ""))

        // Refresh the recent transfers panel in place.
        div hx-swap-oob="outerHTML:#recent-transfers"
        {
            (recent_transfers_panel(&transfers))
        }
    };

    fragment.into_response()
}
