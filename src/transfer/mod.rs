//! Wallet-to-wallet transfers and their atomic execution.

mod core;
mod create_endpoint;
mod transfer_page;

pub use core::{
    NewTransfer, RecentTransfer, TransferDirection, TransferId, WalletTransfer, WalletTransferRow,
    create_transfer_table, execute_transfer, get_recent_transfers, get_transfers_for_wallet,
};
pub use create_endpoint::create_transfer_endpoint;
pub use transfer_page::get_transfer_page;
