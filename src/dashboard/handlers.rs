//! Dashboard HTTP handlers and view rendering.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserContext,
    budget::{BudgetStatus, get_budget_statuses},
    dashboard::{
        aggregation::{
            CategoryTotal, MonthlyTrendPoint, get_average_daily_expense, get_lifetime_totals,
            get_month_totals, get_monthly_trend, get_today_activity, get_top_expense_categories,
        },
        cards::{StatCards, stat_cards_view},
        charts::monthly_trend_chart,
        tables::{
            budgets_panel, goals_panel, recent_transactions_panel, top_categories_panel,
            wallets_panel,
        },
    },
    endpoints,
    goal::{GoalSummary, SavingsGoal, get_goal_summary, get_goals},
    html::{
        ChartPanel, PAGE_CONTAINER_STYLE, base, chart_containers, charts_script, echarts_script,
        link,
    },
    navigation::NavBar,
    timezone::today_in,
    transaction::{TransactionRow, get_recent_transactions},
    wallet::{WalletSummary, get_total_balance, get_wallet_summaries},
};

/// How many recent transactions the dashboard lists.
const RECENT_TRANSACTIONS_LIMIT: u64 = 5;
/// How many top expense categories the dashboard lists.
const TOP_CATEGORIES_LIMIT: u64 = 5;
/// How many months the trend chart covers.
const TREND_MONTHS: u32 = 6;
/// How many days the daily spending average covers.
const AVERAGE_WINDOW_DAYS: i64 = 30;

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading aggregates.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Holds all the data needed to render the dashboard.
struct DashboardData {
    stats: StatCards,
    wallets: Vec<WalletSummary>,
    recent_transactions: Vec<TransactionRow>,
    top_categories: Vec<CategoryTotal>,
    budget_statuses: Vec<BudgetStatus>,
    goal_summary: GoalSummary,
    goals: Vec<SavingsGoal>,
    trend: Vec<MonthlyTrendPoint>,
}

/// Display a page with an overview of the user's finances.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    user: UserContext,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let today = today_in(&state.local_timezone)?;

    let wallets = get_wallet_summaries(user.user_id, &connection)?;
    let recent_transactions =
        get_recent_transactions(user.user_id, RECENT_TRANSACTIONS_LIMIT, &connection)?;

    if wallets.is_empty() && recent_transactions.is_empty() {
        return Ok(dashboard_no_data_view().into_response());
    }

    let data = DashboardData {
        stats: StatCards {
            total_balance: get_total_balance(user.user_id, &connection)?,
            lifetime: get_lifetime_totals(user.user_id, &connection)?,
            this_month: get_month_totals(user.user_id, today, &connection)?,
            today: get_today_activity(user.user_id, today, &connection)?,
            average_daily_expense: get_average_daily_expense(
                user.user_id,
                today,
                AVERAGE_WINDOW_DAYS,
                &connection,
            )?,
        },
        wallets,
        recent_transactions,
        top_categories: get_top_expense_categories(
            user.user_id,
            today,
            TOP_CATEGORIES_LIMIT,
            &connection,
        )?,
        budget_statuses: get_budget_statuses(user.user_id, today, &connection)?,
        goal_summary: get_goal_summary(user.user_id, &connection)?,
        goals: get_goals(user.user_id, &connection)?,
        trend: get_monthly_trend(user.user_id, today, TREND_MONTHS, &connection)?,
    };

    Ok(dashboard_view(&data).into_response())
}

fn dashboard_view(data: &DashboardData) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let charts = [ChartPanel {
        id: "trend-chart",
        options: monthly_trend_chart(&data.trend).to_string(),
    }];

    let head_elements = [echarts_script(), charts_script(&charts)];

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-xl"
            {
                (stat_cards_view(&data.stats))

                (chart_containers(&charts))

                div class="grid grid-cols-1 lg:grid-cols-2 gap-4"
                {
                    (wallets_panel(&data.wallets))
                    (recent_transactions_panel(&data.recent_transactions))
                    (top_categories_panel(&data.top_categories))
                    (budgets_panel(&data.budget_statuses))
                    (goals_panel(&data.goal_summary, &data.goals))
                }
            }
        }
    };

    base("Dashboard", &head_elements, &content)
}

fn dashboard_no_data_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="max-w-md text-center mt-16"
            {
                h2 class="text-2xl font-semibold mb-4" { "Welcome to Walletfolio" }

                p class="text-gray-600 dark:text-gray-400 mb-6"
                {
                    "Create your first wallet, then start recording income and \
                    expenses to see your finances here."
                }

                (link(endpoints::WALLETS_VIEW, "Create a wallet"))
            }
        }
    };

    base("Dashboard", &[], &content)
}
