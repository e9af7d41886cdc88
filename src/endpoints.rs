//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/wallets/{wallet_id}', use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The landing page with an overview of the user's finances.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page listing the user's wallets and the new wallet form.
pub const WALLETS_VIEW: &str = "/wallets";
/// The page showing a single wallet with its balance history.
pub const WALLET_DETAIL_VIEW: &str = "/wallets/{wallet_id}";
/// The page listing the user's transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for recording an income transaction.
pub const NEW_INCOME_VIEW: &str = "/transactions/income/new";
/// The page for recording an expense transaction.
pub const NEW_EXPENSE_VIEW: &str = "/transactions/expense/new";
/// The page for transferring money between wallets.
pub const TRANSFER_VIEW: &str = "/transfer";
/// The page listing monthly budgets.
pub const BUDGETS_VIEW: &str = "/budgets";
/// The page listing savings goals.
pub const GOALS_VIEW: &str = "/goals";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to create a wallet.
pub const POST_WALLET: &str = "/api/wallets";
/// The route to delete a wallet.
pub const DELETE_WALLET: &str = "/api/wallets/{wallet_id}";
/// The route to activate or deactivate a wallet.
pub const TOGGLE_WALLET: &str = "/api/wallets/{wallet_id}/toggle";
/// The route to make a wallet the default.
pub const DEFAULT_WALLET: &str = "/api/wallets/{wallet_id}/default";
/// The route to record an income transaction.
pub const POST_INCOME: &str = "/api/transactions/income";
/// The route to record an expense transaction.
pub const POST_EXPENSE: &str = "/api/transactions/expense";
/// The route to execute a wallet-to-wallet transfer.
pub const POST_TRANSFER: &str = "/api/transfers";
/// The route to create or replace a monthly budget.
pub const POST_BUDGET: &str = "/api/budgets";
/// The route to create a savings goal.
pub const POST_GOAL: &str = "/api/goals";
/// The route to add money to a savings goal.
pub const CONTRIBUTE_GOAL: &str = "/api/goals/{goal_id}/contribute";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/wallets/{wallet_id}', '{wallet_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::DASHBOARD_VIEW);
        assert_endpoint_is_valid_uri(endpoints::WALLETS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::WALLET_DETAIL_VIEW);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_INCOME_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_EXPENSE_VIEW);
        assert_endpoint_is_valid_uri(endpoints::TRANSFER_VIEW);
        assert_endpoint_is_valid_uri(endpoints::BUDGETS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::GOALS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::INTERNAL_ERROR_VIEW);
        assert_endpoint_is_valid_uri(endpoints::STATIC);

        assert_endpoint_is_valid_uri(endpoints::POST_WALLET);
        assert_endpoint_is_valid_uri(endpoints::DELETE_WALLET);
        assert_endpoint_is_valid_uri(endpoints::TOGGLE_WALLET);
        assert_endpoint_is_valid_uri(endpoints::DEFAULT_WALLET);
        assert_endpoint_is_valid_uri(endpoints::POST_INCOME);
        assert_endpoint_is_valid_uri(endpoints::POST_EXPENSE);
        assert_endpoint_is_valid_uri(endpoints::POST_TRANSFER);
        assert_endpoint_is_valid_uri(endpoints::POST_BUDGET);
        assert_endpoint_is_valid_uri(endpoints::POST_GOAL);
        assert_endpoint_is_valid_uri(endpoints::CONTRIBUTE_GOAL);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/wallets/{wallet_id}", 1);

        assert_eq!(formatted_path, "/wallets/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/wallets/all", 1);

        assert_eq!(formatted_path, "/wallets/all");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/api/goals/{goal_id}/contribute", 7);

        assert_eq!(formatted_path, "/api/goals/7/contribute");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
