//! Application router configuration.

use axum::{
    Router,
    response::Redirect,
    routing::{delete, get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    budget::{get_budgets_page, upsert_budget_endpoint},
    dashboard::get_dashboard_page,
    endpoints,
    goal::{contribute_goal_endpoint, create_goal_endpoint, get_goals_page},
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    transaction::{
        get_expense_page, get_income_page, get_transactions_page, record_expense_endpoint,
        record_income_endpoint,
    },
    transfer::{create_transfer_endpoint, get_transfer_page},
    wallet::{
        create_wallet_endpoint, delete_wallet_endpoint, get_wallet_detail_page, get_wallets_page,
        set_default_wallet_endpoint, toggle_wallet_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let page_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::WALLETS_VIEW, get(get_wallets_page))
        .route(endpoints::WALLET_DETAIL_VIEW, get(get_wallet_detail_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(endpoints::NEW_INCOME_VIEW, get(get_income_page))
        .route(endpoints::NEW_EXPENSE_VIEW, get(get_expense_page))
        .route(endpoints::TRANSFER_VIEW, get(get_transfer_page))
        .route(endpoints::BUDGETS_VIEW, get(get_budgets_page))
        .route(endpoints::GOALS_VIEW, get(get_goals_page))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let api_routes = Router::new()
        .route(endpoints::POST_WALLET, post(create_wallet_endpoint))
        .route(endpoints::DELETE_WALLET, delete(delete_wallet_endpoint))
        .route(endpoints::TOGGLE_WALLET, post(toggle_wallet_endpoint))
        .route(endpoints::DEFAULT_WALLET, post(set_default_wallet_endpoint))
        .route(endpoints::POST_INCOME, post(record_income_endpoint))
        .route(endpoints::POST_EXPENSE, post(record_expense_endpoint))
        .route(endpoints::POST_TRANSFER, post(create_transfer_endpoint))
        .route(endpoints::POST_BUDGET, post(upsert_budget_endpoint))
        .route(endpoints::POST_GOAL, post(create_goal_endpoint))
        .route(endpoints::CONTRIBUTE_GOAL, post(contribute_goal_endpoint));

    page_routes
        .merge(api_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

#[cfg(test)]
mod root_route_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{endpoints, routing::get_index_page};

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::DASHBOARD_VIEW);
    }
}
