//! Defines the core data models and database queries for transactions.

use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    session::UserId,
    transaction::category::CategoryId,
    wallet::{BalanceChange, WalletId, apply_balance_delta},
};

pub type TransactionId = DatabaseId;

/// Whether a transaction brings money in or takes it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// The label shown on pages, e.g. "Income".
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }

    /// The sign of this kind's effect on a wallet balance.
    pub fn balance_sign(&self) -> f64 {
        match self {
            TransactionKind::Income => 1.0,
            TransactionKind::Expense => -1.0,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl rusqlite::ToSql for TransactionKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for TransactionKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(FromSqlError::Other(
                format!("unknown transaction kind \"{other}\"").into(),
            )),
        }
    }
}

/// An event where money entered or left one of the user's wallets.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserId,
    /// The wallet the money moved in or out of.
    pub wallet_id: WalletId,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
    /// Whether this is income or an expense.
    pub kind: TransactionKind,
    /// The amount of money. Always positive; `kind` carries the direction.
    pub amount: f64,
    /// A text description of what the transaction was for.
    pub description: String,
    /// When the transaction happened.
    pub date: Date,
}

/// The fields needed to record a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub user_id: UserId,
    pub wallet_id: WalletId,
    pub category_id: CategoryId,
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: String,
    pub date: Date,
}

/// A transaction joined to its category and wallet names for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: String,
    pub date: Date,
    pub category_name: String,
    pub wallet_name: String,
}

/// Per-month income/expense totals for one wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletMonthlyStat {
    /// The month formatted as "YYYY-MM".
    pub month: String,
    pub income: f64,
    pub expense: f64,
    pub transaction_count: i64,
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            wallet_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
            amount REAL NOT NULL,
            description TEXT NOT NULL,
            date TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY(wallet_id) REFERENCES wallet(id),
            FOREIGN KEY(category_id) REFERENCES transaction_category(id)
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date
            ON \"transaction\"(user_id, date)",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_category_date
            ON \"transaction\"(category_id, date)",
        (),
    )?;

    Ok(())
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        wallet_id: row.get(2)?,
        category_id: row.get(3)?,
        kind: row.get(4)?,
        amount: row.get(5)?,
        description: row.get(6)?,
        date: row.get(7)?,
    })
}

/// Record a transaction: insert the row, move the wallet balance, and append
/// the ledger entry.
///
/// The balance delta is `+amount` for income and `-amount` for expenses.
/// Callers composing this with other statements (transfers, fee deductions)
/// must wrap the connection in a SQL transaction so a failure rolls back
/// every entry.
///
/// # Errors
/// This function will return a:
/// - [Error::WalletNotFound] if the wallet does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn record_transaction(
    new: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, wallet_id, category_id, kind, amount, description, date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, user_id, wallet_id, category_id, kind, amount, description, date",
        )?
        .query_row(
            params![
                new.user_id,
                new.wallet_id,
                new.category_id,
                new.kind,
                new.amount,
                new.description,
                new.date,
            ],
            map_transaction_row,
        )?;

    apply_balance_delta(
        new.wallet_id,
        new.kind.balance_sign() * new.amount,
        match new.kind {
            TransactionKind::Income => BalanceChange::Income,
            TransactionKind::Expense => BalanceChange::Expense,
        },
        &new.description,
        Some(transaction.id),
        None,
        connection,
    )?;

    Ok(transaction)
}

fn map_display_row(row: &Row) -> Result<TransactionRow, rusqlite::Error> {
    Ok(TransactionRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        amount: row.get(2)?,
        description: row.get(3)?,
        date: row.get(4)?,
        category_name: row.get(5)?,
        wallet_name: row.get(6)?,
    })
}

const DISPLAY_ROW_QUERY: &str = "SELECT t.id, t.kind, t.amount, t.description, t.date,
        c.name AS category_name, w.wallet_name
    FROM \"transaction\" t
    JOIN transaction_category c ON c.id = t.category_id
    JOIN wallet w ON w.id = t.wallet_id";

/// Count the user's transactions, optionally restricted to one kind.
pub fn count_user_transactions(
    user_id: UserId,
    kind: Option<TransactionKind>,
    connection: &Connection,
) -> Result<u64, Error> {
    let count: i64 = match kind {
        Some(kind) => connection.query_row(
            "SELECT COUNT(*) FROM \"transaction\" WHERE user_id = ?1 AND kind = ?2",
            params![user_id, kind],
            |row| row.get(0),
        )?,
        None => connection.query_row(
            "SELECT COUNT(*) FROM \"transaction\" WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?,
    };

    Ok(count as u64)
}

/// Retrieve a page of the user's transactions, newest first, optionally
/// restricted to one kind.
pub fn get_transaction_rows(
    user_id: UserId,
    kind: Option<TransactionKind>,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<TransactionRow>, Error> {
    let rows = match kind {
        Some(kind) => connection
            .prepare(&format!(
                "{DISPLAY_ROW_QUERY}
                WHERE t.user_id = ?1 AND t.kind = ?2
                ORDER BY t.date DESC, t.id DESC
                LIMIT ?3 OFFSET ?4"
            ))?
            .query_map(params![user_id, kind, limit as i64, offset as i64], map_display_row)?
            .collect::<Result<Vec<_>, _>>()?,
        None => connection
            .prepare(&format!(
                "{DISPLAY_ROW_QUERY}
                WHERE t.user_id = ?1
                ORDER BY t.date DESC, t.id DESC
                LIMIT ?2 OFFSET ?3"
            ))?
            .query_map(params![user_id, limit as i64, offset as i64], map_display_row)?
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(rows)
}

/// Retrieve the user's most recent transactions for the dashboard.
pub fn get_recent_transactions(
    user_id: UserId,
    limit: u64,
    connection: &Connection,
) -> Result<Vec<TransactionRow>, Error> {
    get_transaction_rows(user_id, None, limit, 0, connection)
}

/// Retrieve the most recent transactions recorded against one wallet.
pub fn get_recent_transactions_for_wallet(
    wallet_id: WalletId,
    limit: u64,
    connection: &Connection,
) -> Result<Vec<TransactionRow>, Error> {
    connection
        .prepare(&format!(
            "{DISPLAY_ROW_QUERY}
            WHERE t.wallet_id = ?1
            ORDER BY t.date DESC, t.id DESC
            LIMIT ?2"
        ))?
        .query_map(params![wallet_id, limit as i64], map_display_row)?
        .map(|maybe_row| maybe_row.map_err(Error::SqlError))
        .collect()
}

/// Per-month income/expense totals for a wallet over its most recent `months` months.
pub fn get_wallet_monthly_stats(
    wallet_id: WalletId,
    months: u64,
    connection: &Connection,
) -> Result<Vec<WalletMonthlyStat>, Error> {
    connection
        .prepare(
            "SELECT substr(date, 1, 7) AS month,
                COALESCE(SUM(CASE WHEN kind = 'income' THEN amount ELSE 0 END), 0) AS income,
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount ELSE 0 END), 0) AS expense,
                COUNT(id) AS transaction_count
            FROM \"transaction\"
            WHERE wallet_id = ?1
            GROUP BY month
            ORDER BY month DESC
            LIMIT ?2",
        )?
        .query_map(params![wallet_id, months as i64], |row| {
            Ok(WalletMonthlyStat {
                month: row.get(0)?,
                income: row.get(1)?,
                expense: row.get(2)?,
                transaction_count: row.get(3)?,
            })
        })?
        .map(|maybe_stat| maybe_stat.map_err(Error::SqlError))
        .collect()
}

/// The first and last day of the month containing `date`.
pub fn month_bounds(date: Date) -> (Date, Date) {
    let first = date
        .replace_day(1)
        .expect("the first day of a month is always valid");
    let last_day = time::util::days_in_year_month(date.year(), date.month());
    let last = date
        .replace_day(last_day)
        .expect("the last day of a month is always valid");

    (first, last)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod transaction_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        transaction::category::find_or_create_bank_fees,
        wallet::{NewWallet, create_wallet, get_wallet},
    };

    use super::{
        NewTransaction, TransactionKind, count_user_transactions, get_recent_transactions,
        get_transaction_rows, get_wallet_monthly_stats, month_bounds, record_transaction,
    };

    const TEST_USER: i64 = 1;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_wallet(conn: &Connection, name: &str, balance: f64) -> i64 {
        create_wallet(
            &NewWallet {
                user_id: TEST_USER,
                wallet_type_id: 1,
                wallet_name: name.to_owned(),
                description: String::new(),
                initial_balance: balance,
                account_number: None,
                bank_name: None,
                card_last_four: None,
                credit_limit: 0.0,
                color_code: "#3498db".to_owned(),
                is_default: false,
            },
            conn,
        )
        .unwrap()
        .id
    }

    fn new_transaction(
        wallet_id: i64,
        category_id: i64,
        kind: TransactionKind,
        amount: f64,
        date: time::Date,
    ) -> NewTransaction {
        NewTransaction {
            user_id: TEST_USER,
            wallet_id,
            category_id,
            kind,
            amount,
            description: "Test".to_owned(),
            date,
        }
    }

    #[test]
    fn record_income_increases_wallet_balance() {
        let conn = get_test_connection();
        let wallet_id = create_test_wallet(&conn, "Spending", 100.0);
        let category_id = find_or_create_bank_fees(TEST_USER, &conn).unwrap();

        let transaction = record_transaction(
            &new_transaction(
                wallet_id,
                category_id,
                TransactionKind::Income,
                25.0,
                date!(2025 - 06 - 15),
            ),
            &conn,
        )
        .unwrap();

        assert_eq!(transaction.amount, 25.0);
        assert_eq!(
            get_wallet(wallet_id, TEST_USER, &conn).unwrap().balance,
            125.0
        );
    }

    #[test]
    fn record_expense_decreases_wallet_balance() {
        let conn = get_test_connection();
        let wallet_id = create_test_wallet(&conn, "Spending", 100.0);
        let category_id = find_or_create_bank_fees(TEST_USER, &conn).unwrap();

        record_transaction(
            &new_transaction(
                wallet_id,
                category_id,
                TransactionKind::Expense,
                30.0,
                date!(2025 - 06 - 15),
            ),
            &conn,
        )
        .unwrap();

        assert_eq!(
            get_wallet(wallet_id, TEST_USER, &conn).unwrap().balance,
            70.0
        );
    }

    #[test]
    fn count_and_filter_by_kind() {
        let conn = get_test_connection();
        let wallet_id = create_test_wallet(&conn, "Spending", 100.0);
        let category_id = find_or_create_bank_fees(TEST_USER, &conn).unwrap();
        let day = date!(2025 - 06 - 15);

        for amount in [10.0, 20.0] {
            record_transaction(
                &new_transaction(wallet_id, category_id, TransactionKind::Expense, amount, day),
                &conn,
            )
            .unwrap();
        }
        record_transaction(
            &new_transaction(wallet_id, category_id, TransactionKind::Income, 5.0, day),
            &conn,
        )
        .unwrap();

        assert_eq!(count_user_transactions(TEST_USER, None, &conn), Ok(3));
        assert_eq!(
            count_user_transactions(TEST_USER, Some(TransactionKind::Expense), &conn),
            Ok(2)
        );

        let expenses = get_transaction_rows(
            TEST_USER,
            Some(TransactionKind::Expense),
            10,
            0,
            &conn,
        )
        .unwrap();
        assert_eq!(expenses.len(), 2);
        assert!(expenses.iter().all(|row| row.kind == TransactionKind::Expense));
    }

    #[test]
    fn recent_transactions_are_newest_first() {
        let conn = get_test_connection();
        let wallet_id = create_test_wallet(&conn, "Spending", 100.0);
        let category_id = find_or_create_bank_fees(TEST_USER, &conn).unwrap();

        record_transaction(
            &new_transaction(
                wallet_id,
                category_id,
                TransactionKind::Expense,
                10.0,
                date!(2025 - 06 - 01),
            ),
            &conn,
        )
        .unwrap();
        record_transaction(
            &new_transaction(
                wallet_id,
                category_id,
                TransactionKind::Expense,
                20.0,
                date!(2025 - 06 - 10),
            ),
            &conn,
        )
        .unwrap();

        let rows = get_recent_transactions(TEST_USER, 5, &conn).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, 20.0);
        assert_eq!(rows[1].amount, 10.0);
    }

    #[test]
    fn monthly_stats_group_by_month() {
        let conn = get_test_connection();
        let wallet_id = create_test_wallet(&conn, "Spending", 1000.0);
        let category_id = find_or_create_bank_fees(TEST_USER, &conn).unwrap();

        record_transaction(
            &new_transaction(
                wallet_id,
                category_id,
                TransactionKind::Expense,
                10.0,
                date!(2025 - 05 - 20),
            ),
            &conn,
        )
        .unwrap();
        record_transaction(
            &new_transaction(
                wallet_id,
                category_id,
                TransactionKind::Income,
                50.0,
                date!(2025 - 06 - 02),
            ),
            &conn,
        )
        .unwrap();
        record_transaction(
            &new_transaction(
                wallet_id,
                category_id,
                TransactionKind::Expense,
                5.0,
                date!(2025 - 06 - 03),
            ),
            &conn,
        )
        .unwrap();

        let stats = get_wallet_monthly_stats(wallet_id, 6, &conn).unwrap();

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].month, "2025-06");
        assert_eq!(stats[0].income, 50.0);
        assert_eq!(stats[0].expense, 5.0);
        assert_eq!(stats[0].transaction_count, 2);
        assert_eq!(stats[1].month, "2025-05");
        assert_eq!(stats[1].expense, 10.0);
    }

    #[test]
    fn month_bounds_cover_whole_month() {
        assert_eq!(
            month_bounds(date!(2025 - 02 - 14)),
            (date!(2025 - 02 - 01), date!(2025 - 02 - 28))
        );
        assert_eq!(
            month_bounds(date!(2024 - 02 - 14)),
            (date!(2024 - 02 - 01), date!(2024 - 02 - 29))
        );
        assert_eq!(
            month_bounds(date!(2025 - 12 - 31)),
            (date!(2025 - 12 - 01), date!(2025 - 12 - 31))
        );
    }
}
