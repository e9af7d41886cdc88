//! Endpoints for deleting, (de)activating, and defaulting wallets.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{
    AppState, Error, UserContext, endpoints,
    wallet::{WalletId, delete_wallet, set_default_wallet, toggle_wallet_active},
};

/// The state needed for the wallet lifecycle endpoints.
#[derive(Debug, Clone)]
pub struct WalletLifecycleState {
    /// The database connection for managing wallets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for WalletLifecycleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

fn redirect_to_wallets() -> Response {
    (
        HxRedirect(endpoints::WALLETS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// A route handler for deleting a wallet.
///
/// Deletion is rejected when the wallet still has a balance or any recorded
/// transactions or transfers; the error alert suggests deactivating instead.
pub async fn delete_wallet_endpoint(
    State(state): State<WalletLifecycleState>,
    user: UserContext,
    Path(wallet_id): Path<WalletId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_wallet(wallet_id, user.user_id, &connection) {
        Ok(()) => redirect_to_wallets(),
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for flipping a wallet's active flag.
pub async fn toggle_wallet_endpoint(
    State(state): State<WalletLifecycleState>,
    user: UserContext,
    Path(wallet_id): Path<WalletId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match toggle_wallet_active(wallet_id, user.user_id, &connection) {
        Ok(_) => redirect_to_wallets(),
        Err(error) => error.into_alert_response(),
    }
}

/// A route handler for making a wallet the user's default.
pub async fn set_default_wallet_endpoint(
    State(state): State<WalletLifecycleState>,
    user: UserContext,
    Path(wallet_id): Path<WalletId>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match set_default_wallet(wallet_id, user.user_id, &mut connection) {
        Ok(()) => redirect_to_wallets(),
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod lifecycle_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        UserContext,
        db::initialize,
        test_utils::assert_hx_redirect,
        transaction::{NewTransaction, TransactionKind, find_or_create_bank_fees, record_transaction},
        wallet::{NewWallet, create_wallet, get_wallet, get_wallet_summaries},
    };

    use super::{
        WalletLifecycleState, delete_wallet_endpoint, set_default_wallet_endpoint,
        toggle_wallet_endpoint,
    };

    fn get_test_state() -> WalletLifecycleState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        WalletLifecycleState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn test_user() -> UserContext {
        UserContext { user_id: 1 }
    }

    fn create_test_wallet(state: &WalletLifecycleState, name: &str, balance: f64) -> i64 {
        let connection = state.db_connection.lock().unwrap();
        create_wallet(
            &NewWallet {
                user_id: 1,
                wallet_type_id: 1,
                wallet_name: name.to_owned(),
                description: String::new(),
                initial_balance: balance,
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

    #[tokio::test]
    async fn delete_unused_wallet_redirects() {
        let state = get_test_state();
        let wallet_id = create_test_wallet(&state, "Unused", 0.0);

        let response =
            delete_wallet_endpoint(State(state.clone()), test_user(), Path(wallet_id))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, crate::endpoints::WALLETS_VIEW);

        let connection = state.db_connection.lock().unwrap();
        assert!(get_wallet_summaries(1, &connection).unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_rejected_for_wallet_with_balance() {
        let state = get_test_state();
        let wallet_id = create_test_wallet(&state, "Funded", 10.0);

        let response =
            delete_wallet_endpoint(State(state.clone()), test_user(), Path(wallet_id))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_wallet_summaries(1, &connection).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_rejected_for_wallet_with_transactions() {
        let state = get_test_state();
        let wallet_id = create_test_wallet(&state, "Used", 0.0);
        {
            let connection = state.db_connection.lock().unwrap();
            let category_id = find_or_create_bank_fees(1, &connection).unwrap();
            record_transaction(
                &NewTransaction {
                    user_id: 1,
                    wallet_id,
                    category_id,
                    kind: TransactionKind::Income,
                    amount: 5.0,
                    description: "Found money".to_owned(),
                    date: date!(2025 - 06 - 15),
                },
                &connection,
            )
            .unwrap();
            // Put the balance back to zero so only the record check can reject.
            connection
                .execute("UPDATE wallet SET balance = 0 WHERE id = ?1", [wallet_id])
                .unwrap();
        }

        let response =
            delete_wallet_endpoint(State(state.clone()), test_user(), Path(wallet_id))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_wallet_summaries(1, &connection).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn toggle_deactivates_wallet() {
        let state = get_test_state();
        let wallet_id = create_test_wallet(&state, "Spending", 0.0);

        let response =
            toggle_wallet_endpoint(State(state.clone()), test_user(), Path(wallet_id))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        assert!(!get_wallet(wallet_id, 1, &connection).unwrap().is_active);
    }

    #[tokio::test]
    async fn set_default_moves_flag() {
        let state = get_test_state();
        let first = create_test_wallet(&state, "First", 0.0);
        let second = create_test_wallet(&state, "Second", 0.0);

        set_default_wallet_endpoint(State(state.clone()), test_user(), Path(first))
            .await
            .into_response();
        let response =
            set_default_wallet_endpoint(State(state.clone()), test_user(), Path(second))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        assert!(!get_wallet(first, 1, &connection).unwrap().is_default);
        assert!(get_wallet(second, 1, &connection).unwrap().is_default);
    }

    #[tokio::test]
    async fn missing_wallet_returns_not_found_alert() {
        let state = get_test_state();

        let response = delete_wallet_endpoint(State(state), test_user(), Path(1337))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
