//! Creates the application's database schema and reference data.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error,
    budget::create_budget_table,
    goal::create_goal_table,
    transaction::{create_category_table, create_transaction_table, seed_shared_categories},
    transfer::create_transfer_table,
    wallet::{
        create_balance_history_table, create_wallet_summary_view, create_wallet_table,
        create_wallet_type_table, seed_wallet_types,
    },
};

/// Create the application tables, views, and reference data.
///
/// All statements run in a single exclusive transaction so a partially
/// created schema is never left behind.
///
/// # Errors
/// Returns an error if any statement fails.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_wallet_type_table(&transaction)?;
    create_wallet_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_transfer_table(&transaction)?;
    create_budget_table(&transaction)?;
    create_goal_table(&transaction)?;
    create_balance_history_table(&transaction)?;
    create_wallet_summary_view(&transaction)?;

    seed_wallet_types(&transaction)?;
    seed_shared_categories(&transaction)?;

    transaction.commit()?;

    Ok(())
}
