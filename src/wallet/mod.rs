//! Wallets: balance-holding accounts, their lifecycle, and their ledger.

mod core;
mod create_endpoint;
mod detail_page;
mod lifecycle_endpoints;
mod wallets_page;

pub use core::{
    BalanceChange, BalanceHistoryEntry, NewWallet, Wallet, WalletId, WalletSummary, WalletType,
    WalletTypeId, apply_balance_delta, count_wallet_records, create_balance_history_table,
    create_wallet, create_wallet_summary_view, create_wallet_table, create_wallet_type_table,
    delete_wallet, get_active_wallets, get_balance_history, get_total_balance, get_wallet,
    get_wallet_summaries, get_wallet_types, seed_wallet_types, set_default_wallet,
    toggle_wallet_active,
};
pub use create_endpoint::create_wallet_endpoint;
pub use detail_page::get_wallet_detail_page;
pub use lifecycle_endpoints::{
    delete_wallet_endpoint, set_default_wallet_endpoint, toggle_wallet_endpoint,
};
pub use wallets_page::get_wallets_page;
