//! Defines the core data models and database queries for wallets.

use rusqlite::{Connection, Row, params};

use crate::{
    Error, database_id::DatabaseId, session::UserId, transaction::TransactionId,
    transfer::TransferId,
};

pub type WalletId = DatabaseId;
pub type WalletTypeId = DatabaseId;

/// A kind of wallet (cash, bank account, credit card, ...).
///
/// Read-only reference data seeded at database initialization.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletType {
    /// The ID of the wallet type.
    pub id: WalletTypeId,
    /// The display name, e.g. "Bank Account".
    pub type_name: String,
    /// The CSS class of the icon shown next to the type.
    pub icon_class: String,
    /// Whether the type is offered when creating new wallets.
    pub is_active: bool,
}

/// A balance-holding account owned by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Wallet {
    /// The ID of the wallet.
    pub id: WalletId,
    /// The user that owns the wallet.
    pub user_id: UserId,
    /// The kind of wallet.
    pub wallet_type_id: WalletTypeId,
    /// The display name, unique per user.
    pub wallet_name: String,
    /// A free-form description.
    pub description: String,
    /// The current balance.
    ///
    /// Mutated only through [apply_balance_delta] so every change leaves a
    /// ledger entry.
    pub balance: f64,
    /// The account number for bank wallets.
    pub account_number: Option<String>,
    /// The bank name for bank wallets.
    pub bank_name: Option<String>,
    /// The last four digits for card wallets.
    pub card_last_four: Option<String>,
    /// The credit limit for credit card wallets.
    pub credit_limit: f64,
    /// The accent colour used when displaying the wallet.
    pub color_code: String,
    /// Whether this is the user's default wallet. At most one per user.
    pub is_default: bool,
    /// Inactive wallets are hidden from entry forms but keep their history.
    pub is_active: bool,
}

/// A wallet row from the `wallet_summary` view, with its type and record counts.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletSummary {
    pub id: WalletId,
    pub wallet_name: String,
    pub balance: f64,
    pub color_code: String,
    pub is_default: bool,
    pub is_active: bool,
    pub type_name: String,
    pub icon_class: String,
    pub transaction_count: i64,
    pub transfer_count: i64,
}

/// The fields needed to create a wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWallet {
    pub user_id: UserId,
    pub wallet_type_id: WalletTypeId,
    pub wallet_name: String,
    pub description: String,
    pub initial_balance: f64,
    pub account_number: Option<String>,
    pub bank_name: Option<String>,
    pub card_last_four: Option<String>,
    pub credit_limit: f64,
    pub color_code: String,
    pub is_default: bool,
}

/// Why a wallet's balance changed, recorded on every ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceChange {
    Income,
    Expense,
    TransferIn,
    TransferOut,
    Adjustment,
}

impl BalanceChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            BalanceChange::Income => "income",
            BalanceChange::Expense => "expense",
            BalanceChange::TransferIn => "transfer_in",
            BalanceChange::TransferOut => "transfer_out",
            BalanceChange::Adjustment => "adjustment",
        }
    }
}

/// One row of a wallet's append-only balance ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceHistoryEntry {
    pub previous_balance: f64,
    pub new_balance: f64,
    pub change_amount: f64,
    pub change_type: String,
    pub description: String,
    pub created_at: String,
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn create_wallet_type_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS wallet_type (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            type_name TEXT NOT NULL UNIQUE,
            icon_class TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        )",
        (),
    )?;

    Ok(())
}

pub fn create_wallet_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS wallet (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            wallet_type_id INTEGER NOT NULL,
            wallet_name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            balance REAL NOT NULL DEFAULT 0,
            account_number TEXT,
            bank_name TEXT,
            card_last_four TEXT,
            credit_limit REAL NOT NULL DEFAULT 0,
            color_code TEXT NOT NULL DEFAULT '#3498db',
            is_default INTEGER NOT NULL DEFAULT 0,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(user_id, wallet_name),
            FOREIGN KEY(wallet_type_id) REFERENCES wallet_type(id)
        )",
        (),
    )?;

    Ok(())
}

pub fn create_balance_history_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS wallet_balance_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            wallet_id INTEGER NOT NULL,
            previous_balance REAL NOT NULL,
            new_balance REAL NOT NULL,
            change_amount REAL NOT NULL,
            change_type TEXT NOT NULL
                CHECK (change_type IN ('income', 'expense', 'transfer_in', 'transfer_out', 'adjustment')),
            description TEXT NOT NULL DEFAULT '',
            transaction_id INTEGER,
            transfer_id INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY(wallet_id) REFERENCES wallet(id)
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_balance_history_wallet
            ON wallet_balance_history(wallet_id, created_at)",
        (),
    )?;

    Ok(())
}

pub fn create_wallet_summary_view(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE VIEW IF NOT EXISTS wallet_summary AS
        SELECT
            w.id,
            w.user_id,
            w.wallet_name,
            w.balance,
            w.color_code,
            w.is_default,
            w.is_active,
            wt.type_name,
            wt.icon_class,
            (SELECT COUNT(*) FROM \"transaction\" t
                WHERE t.wallet_id = w.id) AS transaction_count,
            (SELECT COUNT(*) FROM wallet_transfer tr
                WHERE tr.from_wallet_id = w.id OR tr.to_wallet_id = w.id) AS transfer_count
        FROM wallet w
        JOIN wallet_type wt ON wt.id = w.wallet_type_id",
        (),
    )?;

    Ok(())
}

pub fn seed_wallet_types(connection: &Connection) -> Result<(), rusqlite::Error> {
    let count: i64 = connection.query_row("SELECT COUNT(*) FROM wallet_type", [], |row| row.get(0))?;

    if count > 0 {
        return Ok(());
    }

    let types = [
        ("Cash", "fa-money-bill-wave"),
        ("Bank Account", "fa-building-columns"),
        ("Credit Card", "fa-credit-card"),
        ("Debit Card", "fa-credit-card"),
        ("E-Wallet", "fa-mobile-screen"),
        ("Savings", "fa-piggy-bank"),
    ];

    for (type_name, icon_class) in types {
        connection.execute(
            "INSERT INTO wallet_type (type_name, icon_class) VALUES (?1, ?2)",
            params![type_name, icon_class],
        )?;
    }

    Ok(())
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const WALLET_COLUMNS: &str = "id, user_id, wallet_type_id, wallet_name, description, balance, \
    account_number, bank_name, card_last_four, credit_limit, color_code, is_default, is_active";

pub fn map_wallet_row(row: &Row) -> Result<Wallet, rusqlite::Error> {
    Ok(Wallet {
        id: row.get(0)?,
        user_id: row.get(1)?,
        wallet_type_id: row.get(2)?,
        wallet_name: row.get(3)?,
        description: row.get(4)?,
        balance: row.get(5)?,
        account_number: row.get(6)?,
        bank_name: row.get(7)?,
        card_last_four: row.get(8)?,
        credit_limit: row.get(9)?,
        color_code: row.get(10)?,
        is_default: row.get(11)?,
        is_active: row.get(12)?,
    })
}

/// Create a new wallet.
///
/// If the wallet is flagged as the default, the flag is first cleared on the
/// user's other wallets. An initial balance is recorded as an 'adjustment'
/// ledger entry. Callers composing this with other statements should wrap
/// the connection in a SQL transaction.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateWalletName] if the user already has a wallet with this name,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_wallet(new: &NewWallet, connection: &Connection) -> Result<Wallet, Error> {
    if new.is_default {
        connection.execute(
            "UPDATE wallet SET is_default = 0 WHERE user_id = ?1",
            params![new.user_id],
        )?;
    }

    let wallet = connection
        .prepare(&format!(
            "INSERT INTO wallet (user_id, wallet_type_id, wallet_name, description, balance,
                account_number, bank_name, card_last_four, credit_limit, color_code, is_default)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            RETURNING {WALLET_COLUMNS}"
        ))?
        .query_row(
            params![
                new.user_id,
                new.wallet_type_id,
                new.wallet_name,
                new.description,
                new.initial_balance,
                new.account_number,
                new.bank_name,
                new.card_last_four,
                new.credit_limit,
                new.color_code,
                new.is_default,
            ],
            map_wallet_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateWalletName(new.wallet_name.clone()),
            error => error.into(),
        })?;

    if wallet.balance != 0.0 {
        connection.execute(
            "INSERT INTO wallet_balance_history
                (wallet_id, previous_balance, new_balance, change_amount, change_type, description)
            VALUES (?1, 0, ?2, ?3, 'adjustment', 'Initial balance')",
            params![wallet.id, wallet.balance, wallet.balance],
        )?;
    }

    Ok(wallet)
}

/// Retrieve one of `user_id`'s wallets by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::WalletNotFound] if `id` does not refer to a wallet owned by `user_id`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_wallet(id: WalletId, user_id: UserId, connection: &Connection) -> Result<Wallet, Error> {
    connection
        .prepare(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallet WHERE id = :id AND user_id = :user_id"
        ))?
        .query_one(
            &[(":id", &id), (":user_id", &user_id)],
            map_wallet_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::WalletNotFound(Some(id)),
            error => error.into(),
        })
}

/// Retrieve `user_id`'s active wallets for use in entry forms.
pub fn get_active_wallets(user_id: UserId, connection: &Connection) -> Result<Vec<Wallet>, Error> {
    connection
        .prepare(&format!(
            "SELECT {WALLET_COLUMNS} FROM wallet
            WHERE user_id = :user_id AND is_active = 1
            ORDER BY is_default DESC, wallet_name"
        ))?
        .query_map(&[(":user_id", &user_id)], map_wallet_row)?
        .map(|maybe_wallet| maybe_wallet.map_err(Error::SqlError))
        .collect()
}

/// Retrieve the active wallet types offered when creating a wallet.
pub fn get_wallet_types(connection: &Connection) -> Result<Vec<WalletType>, Error> {
    connection
        .prepare(
            "SELECT id, type_name, icon_class, is_active FROM wallet_type
            WHERE is_active = 1
            ORDER BY type_name",
        )?
        .query_map([], |row| {
            Ok(WalletType {
                id: row.get(0)?,
                type_name: row.get(1)?,
                icon_class: row.get(2)?,
                is_active: row.get(3)?,
            })
        })?
        .map(|maybe_type| maybe_type.map_err(Error::SqlError))
        .collect()
}

/// Retrieve `user_id`'s wallets from the summary view, default first then by balance.
pub fn get_wallet_summaries(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<WalletSummary>, Error> {
    connection
        .prepare(
            "SELECT id, wallet_name, balance, color_code, is_default, is_active,
                type_name, icon_class, transaction_count, transfer_count
            FROM wallet_summary
            WHERE user_id = :user_id
            ORDER BY is_default DESC, balance DESC",
        )?
        .query_map(&[(":user_id", &user_id)], |row| {
            Ok(WalletSummary {
                id: row.get(0)?,
                wallet_name: row.get(1)?,
                balance: row.get(2)?,
                color_code: row.get(3)?,
                is_default: row.get(4)?,
                is_active: row.get(5)?,
                type_name: row.get(6)?,
                icon_class: row.get(7)?,
                transaction_count: row.get(8)?,
                transfer_count: row.get(9)?,
            })
        })?
        .map(|maybe_summary| maybe_summary.map_err(Error::SqlError))
        .collect()
}

/// Get the total balance across the user's active wallets.
pub fn get_total_balance(user_id: UserId, connection: &Connection) -> Result<f64, Error> {
    let total = connection.query_row(
        "SELECT COALESCE(SUM(balance), 0) FROM wallet
        WHERE user_id = ?1 AND is_active = 1",
        params![user_id],
        |row| row.get(0),
    )?;

    Ok(total)
}

/// Apply a signed `delta` to a wallet's stored balance and append the
/// matching ledger entry.
///
/// This is the only code path that writes `wallet.balance`. Callers
/// composing several mutations (transfers, fee deductions) must wrap the
/// connection in a SQL transaction so a failure rolls back every entry.
///
/// Returns the new balance.
///
/// # Errors
/// This function will return a:
/// - [Error::WalletNotFound] if `wallet_id` does not refer to a wallet,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn apply_balance_delta(
    wallet_id: WalletId,
    delta: f64,
    change: BalanceChange,
    description: &str,
    transaction_id: Option<TransactionId>,
    transfer_id: Option<TransferId>,
    connection: &Connection,
) -> Result<f64, Error> {
    let previous_balance: f64 = connection
        .query_row(
            "SELECT balance FROM wallet WHERE id = ?1",
            params![wallet_id],
            |row| row.get(0),
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::WalletNotFound(Some(wallet_id)),
            error => error.into(),
        })?;

    let new_balance = previous_balance + delta;

    connection.execute(
        "UPDATE wallet SET balance = ?1 WHERE id = ?2",
        params![new_balance, wallet_id],
    )?;

    connection.execute(
        "INSERT INTO wallet_balance_history
            (wallet_id, previous_balance, new_balance, change_amount, change_type,
            description, transaction_id, transfer_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            wallet_id,
            previous_balance,
            new_balance,
            delta,
            change.as_str(),
            description,
            transaction_id,
            transfer_id,
        ],
    )?;

    Ok(new_balance)
}

/// The number of transactions and transfers referencing a wallet.
pub fn count_wallet_records(
    wallet_id: WalletId,
    connection: &Connection,
) -> Result<(i64, i64), Error> {
    let transaction_count = connection.query_row(
        "SELECT COUNT(*) FROM \"transaction\" WHERE wallet_id = ?1",
        params![wallet_id],
        |row| row.get(0),
    )?;

    let transfer_count = connection.query_row(
        "SELECT COUNT(*) FROM wallet_transfer
        WHERE from_wallet_id = ?1 OR to_wallet_id = ?1",
        params![wallet_id],
        |row| row.get(0),
    )?;

    Ok((transaction_count, transfer_count))
}

/// Delete a wallet.
///
/// Deletion is only permitted when nothing references the wallet and its
/// balance is zero; otherwise the wallet should be deactivated instead.
///
/// # Errors
/// This function will return a:
/// - [Error::WalletNotFound] if `wallet_id` does not refer to one of `user_id`'s wallets,
/// - [Error::WalletHasRecords] if transactions or transfers reference the wallet,
/// - [Error::WalletBalanceNonZero] if the balance is not zero,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_wallet(
    wallet_id: WalletId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let wallet = get_wallet(wallet_id, user_id, connection)?;

    let (transaction_count, transfer_count) = count_wallet_records(wallet_id, connection)?;

    if transaction_count > 0 || transfer_count > 0 {
        return Err(Error::WalletHasRecords);
    }

    if wallet.balance != 0.0 {
        return Err(Error::WalletBalanceNonZero);
    }

    connection.execute(
        "DELETE FROM wallet WHERE id = ?1 AND user_id = ?2",
        params![wallet_id, user_id],
    )?;

    Ok(())
}

/// Flip a wallet's active flag, returning the new status.
///
/// Always permitted; never touches the balance or history.
///
/// # Errors
/// This function will return a:
/// - [Error::WalletNotFound] if `wallet_id` does not refer to one of `user_id`'s wallets,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn toggle_wallet_active(
    wallet_id: WalletId,
    user_id: UserId,
    connection: &Connection,
) -> Result<bool, Error> {
    let wallet = get_wallet(wallet_id, user_id, connection)?;
    let new_status = !wallet.is_active;

    connection.execute(
        "UPDATE wallet SET is_active = ?1 WHERE id = ?2 AND user_id = ?3",
        params![new_status, wallet_id, user_id],
    )?;

    Ok(new_status)
}

/// Make `wallet_id` the user's default wallet.
///
/// Clears the flag on every other wallet and sets it on the chosen one as a
/// single SQL transaction, so exactly one wallet per user is the default
/// afterwards.
///
/// # Errors
/// This function will return a:
/// - [Error::WalletNotFound] if `wallet_id` does not refer to one of `user_id`'s wallets,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn set_default_wallet(
    wallet_id: WalletId,
    user_id: UserId,
    connection: &mut Connection,
) -> Result<(), Error> {
    let transaction = connection.transaction()?;

    transaction.execute(
        "UPDATE wallet SET is_default = 0 WHERE user_id = ?1",
        params![user_id],
    )?;

    let rows_changed = transaction.execute(
        "UPDATE wallet SET is_default = 1 WHERE id = ?1 AND user_id = ?2",
        params![wallet_id, user_id],
    )?;

    if rows_changed == 0 {
        return Err(Error::WalletNotFound(Some(wallet_id)));
    }

    transaction.commit()?;

    Ok(())
}

/// Retrieve a wallet's ledger entries from the last `days` days, oldest first.
pub fn get_balance_history(
    wallet_id: WalletId,
    days: i64,
    connection: &Connection,
) -> Result<Vec<BalanceHistoryEntry>, Error> {
    connection
        .prepare(
            "SELECT previous_balance, new_balance, change_amount, change_type,
                description, created_at
            FROM wallet_balance_history
            WHERE wallet_id = :wallet_id
                AND created_at >= datetime('now', '-' || :days || ' days')
            ORDER BY created_at, id",
        )?
        .query_map(
            &[(":wallet_id", &wallet_id), (":days", &days)],
            |row| {
                Ok(BalanceHistoryEntry {
                    previous_balance: row.get(0)?,
                    new_balance: row.get(1)?,
                    change_amount: row.get(2)?,
                    change_type: row.get(3)?,
                    description: row.get(4)?,
                    created_at: row.get(5)?,
                })
            },
        )?
        .map(|maybe_entry| maybe_entry.map_err(Error::SqlError))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod wallet_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{
        BalanceChange, NewWallet, apply_balance_delta, create_wallet, delete_wallet,
        get_balance_history, get_total_balance, get_wallet, get_wallet_summaries,
        get_wallet_types, set_default_wallet, toggle_wallet_active,
    };

    const TEST_USER: i64 = 1;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn new_wallet(name: &str, initial_balance: f64) -> NewWallet {
        NewWallet {
            user_id: TEST_USER,
            wallet_type_id: 1,
            wallet_name: name.to_owned(),
            description: String::new(),
            initial_balance,
            account_number: None,
            bank_name: None,
            card_last_four: None,
            credit_limit: 0.0,
            color_code: "#3498db".to_owned(),
            is_default: false,
        }
    }

    #[test]
    fn seeds_wallet_types() {
        let conn = get_test_connection();

        let types = get_wallet_types(&conn).unwrap();

        assert!(!types.is_empty());
        assert!(types.iter().any(|t| t.type_name == "Cash"));
    }

    #[test]
    fn create_and_get_wallet() {
        let conn = get_test_connection();

        let created = create_wallet(&new_wallet("Spending", 50.0), &conn).unwrap();
        let got = get_wallet(created.id, TEST_USER, &conn).unwrap();

        assert_eq!(created, got);
        assert_eq!(got.balance, 50.0);
    }

    #[test]
    fn create_records_initial_balance_adjustment() {
        let conn = get_test_connection();

        let wallet = create_wallet(&new_wallet("Spending", 50.0), &conn).unwrap();

        let history = get_balance_history(wallet.id, 30, &conn).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].change_type, "adjustment");
        assert_eq!(history[0].previous_balance, 0.0);
        assert_eq!(history[0].new_balance, 50.0);
    }

    #[test]
    fn create_skips_adjustment_for_zero_balance() {
        let conn = get_test_connection();

        let wallet = create_wallet(&new_wallet("Empty", 0.0), &conn).unwrap();

        let history = get_balance_history(wallet.id, 30, &conn).unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn create_fails_on_duplicate_name() {
        let conn = get_test_connection();
        create_wallet(&new_wallet("Spending", 0.0), &conn).unwrap();

        let result = create_wallet(&new_wallet("Spending", 0.0), &conn);

        assert_eq!(
            result,
            Err(Error::DuplicateWalletName("Spending".to_owned()))
        );
    }

    #[test]
    fn duplicate_names_allowed_across_users() {
        let conn = get_test_connection();
        create_wallet(&new_wallet("Spending", 0.0), &conn).unwrap();

        let mut other_users_wallet = new_wallet("Spending", 0.0);
        other_users_wallet.user_id = TEST_USER + 1;

        assert!(create_wallet(&other_users_wallet, &conn).is_ok());
    }

    #[test]
    fn get_wallet_fails_for_other_user() {
        let conn = get_test_connection();
        let wallet = create_wallet(&new_wallet("Spending", 0.0), &conn).unwrap();

        let result = get_wallet(wallet.id, TEST_USER + 1, &conn);

        assert_eq!(result, Err(Error::WalletNotFound(Some(wallet.id))));
    }

    #[test]
    fn apply_balance_delta_updates_balance_and_ledger() {
        let conn = get_test_connection();
        let wallet = create_wallet(&new_wallet("Spending", 100.0), &conn).unwrap();

        let new_balance = apply_balance_delta(
            wallet.id,
            -25.5,
            BalanceChange::Expense,
            "Groceries",
            None,
            None,
            &conn,
        )
        .unwrap();

        assert_eq!(new_balance, 74.5);
        assert_eq!(get_wallet(wallet.id, TEST_USER, &conn).unwrap().balance, 74.5);

        let history = get_balance_history(wallet.id, 30, &conn).unwrap();
        let last = history.last().unwrap();
        assert_eq!(last.previous_balance, 100.0);
        assert_eq!(last.new_balance, 74.5);
        assert_eq!(last.change_amount, -25.5);
        assert_eq!(last.change_type, "expense");
    }

    #[test]
    fn apply_balance_delta_fails_for_missing_wallet() {
        let conn = get_test_connection();

        let result = apply_balance_delta(
            1337,
            10.0,
            BalanceChange::Income,
            "",
            None,
            None,
            &conn,
        );

        assert_eq!(result, Err(Error::WalletNotFound(Some(1337))));
    }

    #[test]
    fn delete_fails_with_nonzero_balance() {
        let conn = get_test_connection();
        let wallet = create_wallet(&new_wallet("Spending", 10.0), &conn).unwrap();

        let result = delete_wallet(wallet.id, TEST_USER, &conn);

        assert_eq!(result, Err(Error::WalletBalanceNonZero));
        assert!(get_wallet(wallet.id, TEST_USER, &conn).is_ok());
    }

    #[test]
    fn delete_succeeds_for_unused_wallet() {
        let conn = get_test_connection();
        let wallet = create_wallet(&new_wallet("Spending", 0.0), &conn).unwrap();

        delete_wallet(wallet.id, TEST_USER, &conn).unwrap();

        assert_eq!(
            get_wallet(wallet.id, TEST_USER, &conn),
            Err(Error::WalletNotFound(Some(wallet.id)))
        );
    }

    #[test]
    fn toggle_flips_active_flag() {
        let conn = get_test_connection();
        let wallet = create_wallet(&new_wallet("Spending", 0.0), &conn).unwrap();
        assert!(wallet.is_active);

        assert_eq!(toggle_wallet_active(wallet.id, TEST_USER, &conn), Ok(false));
        assert_eq!(toggle_wallet_active(wallet.id, TEST_USER, &conn), Ok(true));
    }

    #[test]
    fn set_default_clears_other_wallets() {
        let mut conn = get_test_connection();
        let mut first = new_wallet("First", 0.0);
        first.is_default = true;
        let first = create_wallet(&first, &conn).unwrap();
        let second = create_wallet(&new_wallet("Second", 0.0), &conn).unwrap();

        set_default_wallet(second.id, TEST_USER, &mut conn).unwrap();

        let summaries = get_wallet_summaries(TEST_USER, &conn).unwrap();
        let defaults: Vec<_> = summaries.iter().filter(|w| w.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, second.id);
        assert!(!get_wallet(first.id, TEST_USER, &conn).unwrap().is_default);
    }

    #[test]
    fn set_default_fails_for_missing_wallet() {
        let mut conn = get_test_connection();
        let mut first = new_wallet("First", 0.0);
        first.is_default = true;
        let first = create_wallet(&first, &conn).unwrap();

        let result = set_default_wallet(1337, TEST_USER, &mut conn);

        assert_eq!(result, Err(Error::WalletNotFound(Some(1337))));
        // The failed switch must not have cleared the existing default.
        assert!(get_wallet(first.id, TEST_USER, &conn).unwrap().is_default);
    }

    #[test]
    fn total_balance_ignores_inactive_wallets() {
        let conn = get_test_connection();
        create_wallet(&new_wallet("First", 100.0), &conn).unwrap();
        let second = create_wallet(&new_wallet("Second", 50.0), &conn).unwrap();
        toggle_wallet_active(second.id, TEST_USER, &conn).unwrap();

        let total = get_total_balance(TEST_USER, &conn).unwrap();

        assert_eq!(total, 100.0);
    }

    #[test]
    fn total_balance_defaults_to_zero() {
        let conn = get_test_connection();

        assert_eq!(get_total_balance(TEST_USER, &conn), Ok(0.0));
    }
}
