//! The income entry page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserContext,
    alert::Alert,
    endpoints,
    html::format_currency,
    timezone::today_in,
    transaction::{
        TransactionKind,
        entry::{EntryForm, EntryPageContext, entry_form_view, entry_page_view},
        get_categories, record_transaction,
    },
    wallet::get_active_wallets,
};

/// The state needed for the income entry page and endpoint.
#[derive(Debug, Clone)]
pub struct IncomePageState {
    /// The database connection for recording transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for IncomePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the form for recording an income transaction.
pub async fn get_income_page(
    State(state): State<IncomePageState>,
    user: UserContext,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let today = today_in(&state.local_timezone)?;
    let wallets = get_active_wallets(user.user_id, &connection)?;
    let categories = get_categories(TransactionKind::Income, user.user_id, &connection)?;

    let context = EntryPageContext {
        kind: TransactionKind::Income,
        post_endpoint: endpoints::POST_INCOME,
        view_endpoint: endpoints::NEW_INCOME_VIEW,
        wallets: &wallets,
        categories: &categories,
        max_date: today,
    };

    let form = EntryForm {
        date: today.to_string(),
        ..Default::default()
    };

    Ok(entry_page_view(&context, &form).into_response())
}

/// A route handler for recording an income transaction.
///
/// On success the transaction row, the wallet balance change, and the
/// ledger entry are committed as one unit and the cleared form is returned
/// with a success banner. On validation failure the form is re-rendered
/// with the submitted values and nothing is written.
pub async fn record_income_endpoint(
    State(state): State<IncomePageState>,
    user: UserContext,
    Form(form): Form<EntryForm>,
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
    let categories = match get_categories(TransactionKind::Income, user.user_id, &connection) {
        Ok(categories) => categories,
        Err(error) => return error.into_alert_response(),
    };

    let context = EntryPageContext {
        kind: TransactionKind::Income,
        post_endpoint: endpoints::POST_INCOME,
        view_endpoint: endpoints::NEW_INCOME_VIEW,
        wallets: &wallets,
        categories: &categories,
        max_date: today,
    };

    let new_transaction =
        match form.validate(TransactionKind::Income, user.user_id, today, &connection) {
            Ok(new_transaction) => new_transaction,
            Err(errors) => {
                return entry_form_view(&context, &form, &[], &errors.join(" ")).into_response();
            }
        };

    let recorded = {
        let sql_transaction = match connection.transaction() {
            Ok(sql_transaction) => sql_transaction,
            Err(error) => return Error::from(error).into_alert_response(),
        };

        match record_transaction(&new_transaction, &sql_transaction) {
            Ok(recorded) => match sql_transaction.commit() {
                Ok(()) => recorded,
                Err(error) => return Error::from(error).into_alert_response(),
            },
            Err(error) => {
                tracing::error!("could not record income with {form:?}: {error}");
                return error.into_alert_response();
            }
        }
    };

    // Re-read the wallets so the select shows the updated balance.
    let wallets = match get_active_wallets(user.user_id, &connection) {
        Ok(wallets) => wallets,
        Err(error) => return error.into_alert_response(),
    };
    let context = EntryPageContext {
        wallets: &wallets,
        ..context
    };

    let success = Alert::success(
        "Income recorded",
        &format!("Added {} to your wallet.", format_currency(recorded.amount)),
    );

    let cleared_form = EntryForm {
        date: today.to_string(),
        ..Default::default()
    };

    entry_form_view(&context, &cleared_form, &[success], "").into_response()
}
