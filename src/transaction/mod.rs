//! Income and expense transactions, their categories, and the entry pages.

mod category;
mod core;
pub(crate) mod entry;
mod expense_page;
mod income_page;
mod transactions_page;

pub use category::{
    BANK_FEES_CATEGORY, CategoryId, TransactionCategory, create_category_table,
    find_or_create_bank_fees, get_categories, get_visible_category, map_category_row,
    seed_shared_categories,
};
pub use core::{
    NewTransaction, Transaction, TransactionId, TransactionKind, TransactionRow,
    WalletMonthlyStat, count_user_transactions, create_transaction_table, get_recent_transactions,
    get_recent_transactions_for_wallet, get_transaction_rows, get_wallet_monthly_stats,
    map_transaction_row, month_bounds, record_transaction,
};
pub use expense_page::{get_expense_page, record_expense_endpoint};
pub use income_page::{get_income_page, record_income_endpoint};
pub use transactions_page::get_transactions_page;
