//! The expense entry page and endpoint, including the budget warning.

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
    budget::check_budget_warning,
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

/// The state needed for the expense entry page and endpoint.
#[derive(Debug, Clone)]
pub struct ExpensePageState {
    /// The database connection for recording transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ExpensePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display the form for recording an expense transaction.
pub async fn get_expense_page(
    State(state): State<ExpensePageState>,
    user: UserContext,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let today = today_in(&state.local_timezone)?;
    let wallets = get_active_wallets(user.user_id, &connection)?;
    let categories = get_categories(TransactionKind::Expense, user.user_id, &connection)?;

    let context = EntryPageContext {
        kind: TransactionKind::Expense,
        post_endpoint: endpoints::POST_EXPENSE,
        view_endpoint: endpoints::NEW_EXPENSE_VIEW,
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

/// A route handler for recording an expense transaction.
///
/// When the month-to-date total for the category would exceed a matching
/// budget, a warning banner is attached to the response. The warning never
/// blocks the expense; it is always recorded. The month-to-date total is
/// computed before the insert.
pub async fn record_expense_endpoint(
    State(state): State<ExpensePageState>,
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
    let categories = match get_categories(TransactionKind::Expense, user.user_id, &connection) {
        Ok(categories) => categories,
        Err(error) => return error.into_alert_response(),
    };

    let context = EntryPageContext {
        kind: TransactionKind::Expense,
        post_endpoint: endpoints::POST_EXPENSE,
        view_endpoint: endpoints::NEW_EXPENSE_VIEW,
        wallets: &wallets,
        categories: &categories,
        max_date: today,
    };

    let new_transaction =
        match form.validate(TransactionKind::Expense, user.user_id, today, &connection) {
            Ok(new_transaction) => new_transaction,
            Err(errors) => {
                return entry_form_view(&context, &form, &[], &errors.join(" ")).into_response();
            }
        };

    // The warning compares the category's month-to-date total, as it stands
    // before this expense, against any matching budget.
    let category_name = categories
        .iter()
        .find(|category| category.id == new_transaction.category_id)
        .map(|category| category.name.clone())
        .unwrap_or_default();
    let budget_warning = match check_budget_warning(
        user.user_id,
        new_transaction.category_id,
        &category_name,
        new_transaction.amount,
        new_transaction.date,
        &connection,
    ) {
        Ok(budget_warning) => budget_warning,
        Err(error) => return error.into_alert_response(),
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
                tracing::error!("could not record expense with {form:?}: {error}");
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

    let mut banners = vec![Alert::success(
        "Expense recorded",
        &format!(
            "Deducted {} from your wallet.",
            format_currency(recorded.amount)
        ),
    )];

    if let Some(warning) = budget_warning {
        banners.push(Alert::warning(
            "Budget exceeded",
            &format!(
                "This expense exceeds your monthly budget for \"{}\". \
                Remaining budget after this expense: {}.",
                warning.category_name,
                format_currency(warning.remaining)
            ),
        ));
    }

    let cleared_form = EntryForm {
        date: today.to_string(),
        ..Default::default()
    };

    entry_form_view(&context, &cleared_form, &banners, "").into_response()
}

#[cfg(test)]
mod record_expense_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        UserContext,
        budget::upsert_budget,
        db::initialize,
        test_utils::{assert_valid_html, must_get_form, parse_html_fragment},
        transaction::{
            NewTransaction, TransactionKind, count_user_transactions, entry::EntryForm,
            get_categories, record_transaction,
        },
        wallet::{NewWallet, create_wallet, get_wallet},
    };

    use super::{ExpensePageState, record_expense_endpoint};

    fn get_test_state() -> ExpensePageState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        ExpensePageState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn test_user() -> UserContext {
        UserContext { user_id: 1 }
    }

    fn create_test_wallet(state: &ExpensePageState) -> i64 {
        let connection = state.db_connection.lock().unwrap();
        create_wallet(
            &NewWallet {
                user_id: 1,
                wallet_type_id: 1,
                wallet_name: "Spending".to_owned(),
                description: String::new(),
                initial_balance: 1000.0,
                account_number: None,
                bank_name: None,
                card_last_four: None,
                credit_limit: 0.0,
                color_code: "#3498db".to_owned(),
                is_default: false,
            },
            &connection,
        )
        .unwrap()
        .id
    }

    fn groceries_category(state: &ExpensePageState) -> i64 {
        let connection = state.db_connection.lock().unwrap();
        get_categories(TransactionKind::Expense, 1, &connection)
            .unwrap()
            .into_iter()
            .find(|c| c.name == "Groceries")
            .unwrap()
            .id
    }

    fn expense_form(wallet_id: i64, category_id: i64, amount: &str, date: &str) -> EntryForm {
        EntryForm {
            wallet_id: wallet_id.to_string(),
            category_id: category_id.to_string(),
            amount: amount.to_owned(),
            description: "Weekly shop".to_owned(),
            date: date.to_owned(),
        }
    }

    #[tokio::test]
    async fn records_expense_and_updates_balance() {
        let state = get_test_state();
        let wallet_id = create_test_wallet(&state);
        let category_id = groceries_category(&state);

        let response = record_expense_endpoint(
            State(state.clone()),
            test_user(),
            Form(expense_form(wallet_id, category_id, "30.00", "2025-06-15")),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert!(html.html().contains("Expense recorded"));

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_wallet(wallet_id, 1, &connection).unwrap().balance, 970.0);
    }

    #[tokio::test]
    async fn warns_when_budget_exceeded_but_still_records() {
        let state = get_test_state();
        let wallet_id = create_test_wallet(&state);
        let category_id = groceries_category(&state);
        {
            let connection = state.db_connection.lock().unwrap();
            upsert_budget(1, category_id, 2025, 6, 200.0, &connection).unwrap();
            record_transaction(
                &NewTransaction {
                    user_id: 1,
                    wallet_id,
                    category_id,
                    kind: TransactionKind::Expense,
                    amount: 180.0,
                    description: "Earlier shopping".to_owned(),
                    date: date!(2025 - 06 - 05),
                },
                &connection,
            )
            .unwrap();
        }

        let response = record_expense_endpoint(
            State(state.clone()),
            test_user(),
            Form(expense_form(wallet_id, category_id, "30.00", "2025-06-15")),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let text = html.html();
        assert!(text.contains("Expense recorded"));
        assert!(text.contains("Budget exceeded"));
        assert!(text.contains("-$10.00"));

        // The warning is informational: the expense must still be recorded.
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            count_user_transactions(1, Some(TransactionKind::Expense), &connection),
            Ok(2)
        );
    }

    #[tokio::test]
    async fn no_warning_within_budget() {
        let state = get_test_state();
        let wallet_id = create_test_wallet(&state);
        let category_id = groceries_category(&state);
        {
            let connection = state.db_connection.lock().unwrap();
            upsert_budget(1, category_id, 2025, 6, 200.0, &connection).unwrap();
        }

        let response = record_expense_endpoint(
            State(state.clone()),
            test_user(),
            Form(expense_form(wallet_id, category_id, "30.00", "2025-06-15")),
        )
        .await
        .into_response();

        let html = parse_html_fragment(response).await;
        assert!(!html.html().contains("Budget exceeded"));
    }

    #[tokio::test]
    async fn rejects_empty_description() {
        let state = get_test_state();
        let wallet_id = create_test_wallet(&state);
        let category_id = groceries_category(&state);

        let mut form = expense_form(wallet_id, category_id, "30.00", "2025-06-15");
        form.description = String::new();

        let response = record_expense_endpoint(State(state.clone()), test_user(), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);
        must_get_form(&html);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_user_transactions(1, None, &connection), Ok(0));
        assert_eq!(get_wallet(wallet_id, 1, &connection).unwrap().balance, 1000.0);
    }
}
