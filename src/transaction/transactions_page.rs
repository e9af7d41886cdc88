//! The transactions page: the user's history, filterable and paginated.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error, UserContext, endpoints,
    html::{
        BADGE_EXPENSE_STYLE, BADGE_INCOME_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, format_currency, link,
    },
    navigation::NavBar,
    pagination::{PageLink, PaginationConfig, page_count, page_links},
    transaction::{
        TransactionKind, TransactionRow, count_user_transactions, get_transaction_rows,
    },
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The config that controls how to display pages of data.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters accepted by the transactions page.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    /// The page to display, starting at 1.
    pub page: Option<u64>,
    /// Restrict the list to "income" or "expense".
    pub filter: Option<String>,
}

/// Display the user's transactions, newest first.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    user: UserContext,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let kind_filter = match query.filter.as_deref() {
        Some("income") => Some(TransactionKind::Income),
        Some("expense") => Some(TransactionKind::Expense),
        _ => None,
    };

    let config = &state.pagination_config;
    let row_count = count_user_transactions(user.user_id, kind_filter, &connection)?;
    let total_pages = page_count(row_count, config.default_page_size);
    let curr_page = query
        .page
        .unwrap_or(config.default_page)
        .clamp(1, total_pages);
    let offset = (curr_page - 1) * config.default_page_size;

    let rows = get_transaction_rows(
        user.user_id,
        kind_filter,
        config.default_page_size,
        offset,
        &connection,
    )?;

    let links = page_links(curr_page, total_pages, config.max_links);

    Ok(transactions_view(&rows, kind_filter, &links).into_response())
}

fn filter_query(kind: Option<TransactionKind>) -> String {
    match kind {
        Some(kind) => format!("?filter={kind}"),
        None => String::new(),
    }
}

fn transactions_view(
    rows: &[TransactionRow],
    kind_filter: Option<TransactionKind>,
    links: &[PageLink],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let filter_tab = |label: &str, kind: Option<TransactionKind>| -> Markup {
        let url = format!("{}{}", endpoints::TRANSACTIONS_VIEW, filter_query(kind));
        let style = if kind == kind_filter {
            "px-3 py-1.5 rounded bg-blue-600 text-white text-sm font-medium"
        } else {
            "px-3 py-1.5 rounded text-sm font-medium text-gray-700 hover:bg-gray-100 \
            dark:text-gray-300 dark:hover:bg-gray-800"
        };

        html!( a href=(url) class=(style) { (label) } )
    };

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-lg"
            {
                div class="flex flex-wrap justify-between items-center mb-4"
                {
                    div class="flex gap-2"
                    {
                        (filter_tab("All", None))
                        (filter_tab("Income", Some(TransactionKind::Income)))
                        (filter_tab("Expenses", Some(TransactionKind::Expense)))
                    }

                    div class="flex gap-4"
                    {
                        (link(endpoints::NEW_INCOME_VIEW, "Record income"))
                        (link(endpoints::NEW_EXPENSE_VIEW, "Record expense"))
                    }
                }

                @if rows.is_empty() {
                    p class="text-gray-600 dark:text-gray-400"
                    {
                        "No transactions to show."
                    }
                } @else {
                    div class="relative overflow-x-auto rounded shadow-md"
                    {
                        table class="w-full text-sm text-left text-gray-600 dark:text-gray-400"
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Wallet" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                }
                            }

                            tbody
                            {
                                @for row in rows {
                                    tr class=(TABLE_ROW_STYLE)
                                    {
                                        td class=(TABLE_CELL_STYLE) { (row.date) }
                                        td class=(TABLE_CELL_STYLE) { (row.description) }
                                        td class=(TABLE_CELL_STYLE) { (row.category_name) }
                                        td class=(TABLE_CELL_STYLE) { (row.wallet_name) }
                                        td class=(TABLE_CELL_STYLE)
                                        {
                                            @match row.kind {
                                                TransactionKind::Income => {
                                                    span class=(BADGE_INCOME_STYLE)
                                                    {
                                                        "+" (format_currency(row.amount))
                                                    }
                                                }
                                                TransactionKind::Expense => {
                                                    span class=(BADGE_EXPENSE_STYLE)
                                                    {
                                                        "-" (format_currency(row.amount))
                                                    }
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }

                    @if links.len() > 1 {
                        (pagination_view(links, kind_filter))
                    }
                }
            }
        }
    };

    base("Transactions", &[], &content)
}

fn pagination_view(links: &[PageLink], kind_filter: Option<TransactionKind>) -> Markup {
    let page_url = |page: u64| -> String {
        let filter = filter_query(kind_filter);
        let separator = if filter.is_empty() { "?" } else { "&" };

        format!("{}{filter}{separator}page={page}", endpoints::TRANSACTIONS_VIEW)
    };

    html! {
        nav class="flex justify-center gap-2 mt-4" aria-label="Pagination"
        {
            @for link in links {
                @match link {
                    PageLink::Number { page, current: true } => {
                        span class="px-3 py-1.5 rounded bg-blue-600 text-white text-sm"
                        {
                            (page)
                        }
                    }
                    PageLink::Number { page, current: false } => {
                        a
                            href=(page_url(*page))
                            class=(LINK_STYLE)
                        {
                            (page)
                        }
                    }
                    PageLink::Gap => {
                        span class="px-1 text-gray-600 dark:text-gray-400" { "…" }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod transactions_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        UserContext,
        db::initialize,
        pagination::PaginationConfig,
        test_utils::{assert_valid_html, parse_html_document},
        transaction::{NewTransaction, TransactionKind, get_categories, record_transaction},
        wallet::{NewWallet, create_wallet},
    };

    use super::{TransactionsPageState, TransactionsQuery, get_transactions_page};

    fn get_test_state() -> TransactionsPageState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        TransactionsPageState {
            db_connection: Arc::new(Mutex::new(conn)),
            pagination_config: PaginationConfig::default(),
        }
    }

    fn test_user() -> UserContext {
        UserContext { user_id: 1 }
    }

    fn seed_transactions(state: &TransactionsPageState) {
        let connection = state.db_connection.lock().unwrap();
        let wallet_id = create_wallet(
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
        .id;

        let income_category = get_categories(TransactionKind::Income, 1, &connection).unwrap()[0].id;
        let expense_category =
            get_categories(TransactionKind::Expense, 1, &connection).unwrap()[0].id;

        record_transaction(
            &NewTransaction {
                user_id: 1,
                wallet_id,
                category_id: income_category,
                kind: TransactionKind::Income,
                amount: 500.0,
                description: "Pay day".to_owned(),
                date: date!(2025 - 06 - 01),
            },
            &connection,
        )
        .unwrap();
        record_transaction(
            &NewTransaction {
                user_id: 1,
                wallet_id,
                category_id: expense_category,
                kind: TransactionKind::Expense,
                amount: 42.0,
                description: "Groceries run".to_owned(),
                date: date!(2025 - 06 - 02),
            },
            &connection,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn lists_all_transactions() {
        let state = get_test_state();
        seed_transactions(&state);

        let response = get_transactions_page(
            State(state),
            test_user(),
            Query(TransactionsQuery::default()),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let text = html.html();
        assert!(text.contains("Pay day"));
        assert!(text.contains("Groceries run"));
    }

    #[tokio::test]
    async fn filter_restricts_to_income() {
        let state = get_test_state();
        seed_transactions(&state);

        let response = get_transactions_page(
            State(state),
            test_user(),
            Query(TransactionsQuery {
                page: None,
                filter: Some("income".to_owned()),
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        let text = html.html();
        assert!(text.contains("Pay day"));
        assert!(!text.contains("Groceries run"));
    }

    #[tokio::test]
    async fn empty_list_shows_placeholder() {
        let state = get_test_state();

        let response = get_transactions_page(
            State(state),
            test_user(),
            Query(TransactionsQuery::default()),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert!(html.html().contains("No transactions to show."));
    }

    #[tokio::test]
    async fn out_of_range_page_is_clamped() {
        let state = get_test_state();
        seed_transactions(&state);

        let response = get_transactions_page(
            State(state),
            test_user(),
            Query(TransactionsQuery {
                page: Some(999),
                filter: None,
            }),
        )
        .await
        .unwrap();

        let html = parse_html_document(response).await;
        assert!(html.html().contains("Pay day"));
    }
}
