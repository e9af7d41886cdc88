//! The wallet detail page: metadata, balance trend, and recent activity.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use charming::{
    Chart,
    component::{Axis, Grid, Title},
    element::{AxisType, Tooltip, Trigger},
    series::Line,
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserContext, endpoints,
    html::{
        BADGE_EXPENSE_STYLE, BADGE_INCOME_STYLE, CARD_STYLE, ChartPanel, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, chart_containers,
        charts_script, echarts_script, format_currency,
    },
    navigation::NavBar,
    transaction::{
        TransactionKind, TransactionRow, WalletMonthlyStat, get_recent_transactions_for_wallet,
        get_wallet_monthly_stats,
    },
    transfer::{TransferDirection, WalletTransferRow, get_transfers_for_wallet},
    wallet::{BalanceHistoryEntry, Wallet, WalletId, get_balance_history, get_wallet},
};

/// How far back the balance trend chart looks.
const HISTORY_DAYS: i64 = 30;
/// How many recent transactions and transfers to list.
const RECENT_LIMIT: u64 = 10;
/// How many months of statistics to show.
const STATS_MONTHS: u64 = 6;

/// The state needed for the wallet detail page.
#[derive(Debug, Clone)]
pub struct WalletDetailState {
    /// The database connection for reading the wallet and its history.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for WalletDetailState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Display one wallet with its balance trend and recent activity.
pub async fn get_wallet_detail_page(
    State(state): State<WalletDetailState>,
    user: UserContext,
    Path(wallet_id): Path<WalletId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let wallet = get_wallet(wallet_id, user.user_id, &connection)?;
    let history = get_balance_history(wallet_id, HISTORY_DAYS, &connection)?;
    let transactions = get_recent_transactions_for_wallet(wallet_id, RECENT_LIMIT, &connection)?;
    let transfers = get_transfers_for_wallet(wallet_id, RECENT_LIMIT, &connection)?;
    let monthly_stats = get_wallet_monthly_stats(wallet_id, STATS_MONTHS, &connection)?;

    Ok(
        wallet_detail_view(&wallet, &history, &transactions, &transfers, &monthly_stats)
            .into_response(),
    )
}

fn wallet_detail_view(
    wallet: &Wallet,
    history: &[BalanceHistoryEntry],
    transactions: &[TransactionRow],
    transfers: &[WalletTransferRow],
    monthly_stats: &[WalletMonthlyStat],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::WALLETS_VIEW).into_html();

    let charts = [ChartPanel {
        id: "balance-trend-chart",
        options: balance_trend_chart(history).to_string(),
    }];

    let head_elements = [echarts_script(), charts_script(&charts)];

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-lg"
            {
                header class="flex flex-wrap justify-between items-baseline mb-6"
                {
                    div
                    {
                        h2 class="text-2xl font-semibold" { (wallet.wallet_name) }

                        @if !wallet.description.is_empty() {
                            p class="text-gray-600 dark:text-gray-400" { (wallet.description) }
                        }

                        @if let Some(bank_name) = &wallet.bank_name {
                            p class="text-sm text-gray-600 dark:text-gray-400"
                            {
                                (bank_name)
                                @if let Some(last_four) = &wallet.card_last_four {
                                    " ···· " (last_four)
                                }
                            }
                        }
                    }

                    div class="text-right"
                    {
                        p class="text-3xl font-bold" { (format_currency(wallet.balance)) }

                        @if !wallet.is_active {
                            p class="text-sm text-yellow-700 dark:text-yellow-300" { "Inactive" }
                        }
                    }
                }

                @if history.is_empty() {
                    p class="text-gray-600 dark:text-gray-400 mb-4"
                    {
                        "No balance changes in the last 30 days."
                    }
                } @else {
                    (chart_containers(&charts))
                }

                div class="grid grid-cols-1 lg:grid-cols-2 gap-6"
                {
                    (recent_transactions_panel(transactions))
                    (recent_transfers_panel(transfers))
                }

                (monthly_stats_panel(monthly_stats))
            }
        }
    };

    base(&wallet.wallet_name, &head_elements, &content)
}

fn balance_trend_chart(history: &[BalanceHistoryEntry]) -> Chart {
    let labels: Vec<String> = history
        .iter()
        .map(|entry| entry.created_at.clone())
        .collect();
    let values: Vec<f64> = history.iter().map(|entry| entry.new_balance).collect();

    Chart::new()
        .title(Title::new().text("Balance").subtext("Last 30 days"))
        .tooltip(Tooltip::new().trigger(Trigger::Axis))
        .grid(
            Grid::new()
                .left("3%")
                .right("4%")
                .bottom("3%")
                .contain_label(true),
        )
        .x_axis(Axis::new().type_(AxisType::Category).data(labels))
        .y_axis(Axis::new().type_(AxisType::Value))
        .series(Line::new().name("Balance").data(values))
}

fn recent_transactions_panel(transactions: &[TransactionRow]) -> Markup {
    html! {
        section class=(CARD_STYLE)
        {
            h3 class="text-lg font-semibold mb-3" { "Recent Transactions" }

            @if transactions.is_empty() {
                p class="text-gray-600 dark:text-gray-400" { "No transactions yet." }
            } @else {
                ul class="space-y-2"
                {
                    @for transaction in transactions {
                        li class="flex justify-between items-baseline text-sm"
                        {
                            span
                            {
                                (transaction.description)
                                span class="text-gray-600 dark:text-gray-400"
                                {
                                    " · " (transaction.category_name) " · " (transaction.date)
                                }
                            }

                            @match transaction.kind {
                                TransactionKind::Income => {
                                    span class=(BADGE_INCOME_STYLE)
                                    {
                                        "+" (format_currency(transaction.amount))
                                    }
                                }
                                TransactionKind::Expense => {
                                    span class=(BADGE_EXPENSE_STYLE)
                                    {
                                        "-" (format_currency(transaction.amount))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn recent_transfers_panel(transfers: &[WalletTransferRow]) -> Markup {
    html! {
        section class=(CARD_STYLE)
        {
            h3 class="text-lg font-semibold mb-3" { "Recent Transfers" }

            @if transfers.is_empty() {
                p class="text-gray-600 dark:text-gray-400" { "No transfers yet." }
            } @else {
                ul class="space-y-2"
                {
                    @for transfer in transfers {
                        li class="flex justify-between items-baseline text-sm"
                        {
                            span
                            {
                                @match transfer.direction {
                                    TransferDirection::Outgoing => {
                                        "To " (transfer.to_wallet_name)
                                    }
                                    TransferDirection::Incoming => {
                                        "From " (transfer.from_wallet_name)
                                    }
                                }

                                span class="text-gray-600 dark:text-gray-400"
                                {
                                    " · " (transfer.date)

                                    @if transfer.fee > 0.0 {
                                        " · fee " (format_currency(transfer.fee))
                                    }
                                }
                            }

                            @match transfer.direction {
                                TransferDirection::Incoming => {
                                    span class=(BADGE_INCOME_STYLE)
                                    {
                                        "+" (format_currency(transfer.amount))
                                    }
                                }
                                TransferDirection::Outgoing => {
                                    span class=(BADGE_EXPENSE_STYLE)
                                    {
                                        "-" (format_currency(transfer.amount))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn monthly_stats_panel(monthly_stats: &[WalletMonthlyStat]) -> Markup {
    html! {
        section class="w-full mt-6"
        {
            h3 class="text-lg font-semibold mb-3" { "Monthly Activity" }

            @if monthly_stats.is_empty() {
                p class="text-gray-600 dark:text-gray-400" { "No activity recorded yet." }
            } @else {
                div class="relative overflow-x-auto rounded shadow-md"
                {
                    table class="w-full text-sm text-left text-gray-600 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Month" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Income" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Expenses" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                            }
                        }

                        tbody
                        {
                            @for stat in monthly_stats {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (stat.month) }
                                    td class=(TABLE_CELL_STYLE) { (format_currency(stat.income)) }
                                    td class=(TABLE_CELL_STYLE) { (format_currency(stat.expense)) }
                                    td class=(TABLE_CELL_STYLE) { (stat.transaction_count) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
