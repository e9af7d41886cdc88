//! Defines the core data model and queries for monthly category budgets.

use rusqlite::{Connection, params};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    session::UserId,
    transaction::{CategoryId, month_bounds},
};

pub type BudgetId = DatabaseId;

/// A per-category spending ceiling for one month.
///
/// Budgets only ever produce warnings; they never block an expense.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBudget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The user the budget belongs to.
    pub user_id: UserId,
    /// The expense category the budget limits.
    pub category_id: CategoryId,
    /// The calendar year the budget applies to.
    pub year: i32,
    /// The calendar month (1-12) the budget applies to.
    pub month: u8,
    /// The spending ceiling.
    pub amount: f64,
}

/// A budget joined to its category and month-to-date spending.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetStatus {
    pub category_name: String,
    pub budget_amount: f64,
    pub spent_amount: f64,
    /// Spent amount as a percentage of the budget, rounded to one decimal.
    pub usage_percentage: f64,
}

/// A non-blocking banner shown when an expense pushes a category over budget.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetWarning {
    pub category_name: String,
    /// Budget remaining after the expense; negative when over budget.
    pub remaining: f64,
}

pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS monthly_budget (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            year INTEGER NOT NULL,
            month INTEGER NOT NULL,
            amount REAL NOT NULL,
            UNIQUE(user_id, category_id, year, month),
            FOREIGN KEY(category_id) REFERENCES transaction_category(id)
        )",
        (),
    )?;

    Ok(())
}

/// Create a budget, replacing the amount if one already exists for the same
/// category and month.
pub fn upsert_budget(
    user_id: UserId,
    category_id: CategoryId,
    year: i32,
    month: u8,
    amount: f64,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO monthly_budget (user_id, category_id, year, month, amount)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(user_id, category_id, year, month)
            DO UPDATE SET amount = excluded.amount",
        params![user_id, category_id, year, month, amount],
    )?;

    Ok(())
}

/// The budget for a category in the month containing `date`, if any.
pub fn get_budget_for(
    user_id: UserId,
    category_id: CategoryId,
    date: Date,
    connection: &Connection,
) -> Result<Option<MonthlyBudget>, Error> {
    let result = connection
        .prepare(
            "SELECT id, user_id, category_id, year, month, amount FROM monthly_budget
            WHERE user_id = ?1 AND category_id = ?2 AND year = ?3 AND month = ?4",
        )?
        .query_one(
            params![user_id, category_id, date.year(), u8::from(date.month())],
            |row| {
                Ok(MonthlyBudget {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    category_id: row.get(2)?,
                    year: row.get(3)?,
                    month: row.get(4)?,
                    amount: row.get(5)?,
                })
            },
        );

    match result {
        Ok(budget) => Ok(Some(budget)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// The user's expense total for a category in the month containing `date`.
pub fn spent_in_month(
    user_id: UserId,
    category_id: CategoryId,
    date: Date,
    connection: &Connection,
) -> Result<f64, Error> {
    let (first, last) = month_bounds(date);

    let spent = connection.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM \"transaction\"
        WHERE user_id = ?1 AND category_id = ?2 AND kind = 'expense'
            AND date BETWEEN ?3 AND ?4",
        params![user_id, category_id, first, last],
        |row| row.get(0),
    )?;

    Ok(spent)
}

/// Check whether recording an expense of `amount` would push the category
/// over its budget for the month containing `date`.
///
/// The month-to-date total is computed before the expense is inserted, and
/// the warning is informational only.
pub fn check_budget_warning(
    user_id: UserId,
    category_id: CategoryId,
    category_name: &str,
    amount: f64,
    date: Date,
    connection: &Connection,
) -> Result<Option<BudgetWarning>, Error> {
    let Some(budget) = get_budget_for(user_id, category_id, date, connection)? else {
        return Ok(None);
    };

    let already_spent = spent_in_month(user_id, category_id, date, connection)?;
    let new_total = already_spent + amount;

    if new_total > budget.amount {
        Ok(Some(BudgetWarning {
            category_name: category_name.to_owned(),
            remaining: budget.amount - new_total,
        }))
    } else {
        Ok(None)
    }
}

/// The budget rows for the month containing `date`, each with its
/// month-to-date spending and usage percentage.
pub fn get_budget_statuses(
    user_id: UserId,
    date: Date,
    connection: &Connection,
) -> Result<Vec<BudgetStatus>, Error> {
    let (first, last) = month_bounds(date);

    connection
        .prepare(
            "SELECT c.name, b.amount,
                COALESCE((SELECT SUM(t.amount) FROM \"transaction\" t
                    WHERE t.user_id = b.user_id
                        AND t.category_id = b.category_id
                        AND t.kind = 'expense'
                        AND t.date BETWEEN ?3 AND ?4), 0) AS spent
            FROM monthly_budget b
            JOIN transaction_category c ON c.id = b.category_id
            WHERE b.user_id = ?1 AND b.year = ?2 AND b.month = ?5
            ORDER BY c.name",
        )?
        .query_map(
            params![user_id, first.year(), first, last, u8::from(first.month())],
            |row| {
                let budget_amount: f64 = row.get(1)?;
                let spent_amount: f64 = row.get(2)?;
                let usage_percentage = if budget_amount > 0.0 {
                    (spent_amount / budget_amount * 1000.0).round() / 10.0
                } else {
                    0.0
                };

                Ok(BudgetStatus {
                    category_name: row.get(0)?,
                    budget_amount,
                    spent_amount,
                    usage_percentage,
                })
            },
        )?
        .map(|maybe_status| maybe_status.map_err(Error::SqlError))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod budget_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        transaction::{
            NewTransaction, TransactionKind, get_categories, record_transaction,
        },
        wallet::{NewWallet, create_wallet},
    };

    use super::{
        BudgetWarning, check_budget_warning, get_budget_for, get_budget_statuses, spent_in_month,
        upsert_budget,
    };

    const TEST_USER: i64 = 1;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn expense_category(conn: &Connection, name: &str) -> (i64, String) {
        let category = get_categories(TransactionKind::Expense, TEST_USER, conn)
            .unwrap()
            .into_iter()
            .find(|c| c.name == name)
            .expect("expected seeded category");

        (category.id, category.name)
    }

    fn record_expense(conn: &Connection, category_id: i64, amount: f64, date: time::Date) {
        let wallet_count: i64 = conn
            .query_row("SELECT COUNT(*) FROM wallet", [], |row| row.get(0))
            .unwrap();
        let wallet_id = if wallet_count == 0 {
            create_wallet(
                &NewWallet {
                    user_id: TEST_USER,
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
                conn,
            )
            .unwrap()
            .id
        } else {
            1
        };

        record_transaction(
            &NewTransaction {
                user_id: TEST_USER,
                wallet_id,
                category_id,
                kind: TransactionKind::Expense,
                amount,
                description: "Test".to_owned(),
                date,
            },
            conn,
        )
        .unwrap();
    }

    #[test]
    fn upsert_replaces_existing_budget() {
        let conn = get_test_connection();
        let (category_id, _) = expense_category(&conn, "Groceries");
        let day = date!(2025 - 06 - 15);

        upsert_budget(TEST_USER, category_id, 2025, 6, 200.0, &conn).unwrap();
        upsert_budget(TEST_USER, category_id, 2025, 6, 250.0, &conn).unwrap();

        let budget = get_budget_for(TEST_USER, category_id, day, &conn)
            .unwrap()
            .unwrap();
        assert_eq!(budget.amount, 250.0);
    }

    #[test]
    fn no_budget_returns_none() {
        let conn = get_test_connection();
        let (category_id, _) = expense_category(&conn, "Groceries");

        let budget = get_budget_for(TEST_USER, category_id, date!(2025 - 06 - 15), &conn).unwrap();

        assert_eq!(budget, None);
    }

    #[test]
    fn spent_in_month_only_counts_matching_expenses() {
        let conn = get_test_connection();
        let (groceries, _) = expense_category(&conn, "Groceries");
        let (transport, _) = expense_category(&conn, "Transport");

        record_expense(&conn, groceries, 50.0, date!(2025 - 06 - 05));
        record_expense(&conn, groceries, 30.0, date!(2025 - 06 - 20));
        // Different category and different month must not count.
        record_expense(&conn, transport, 10.0, date!(2025 - 06 - 10));
        record_expense(&conn, groceries, 99.0, date!(2025 - 05 - 31));

        let spent = spent_in_month(TEST_USER, groceries, date!(2025 - 06 - 15), &conn).unwrap();

        assert_eq!(spent, 80.0);
    }

    #[test]
    fn warning_when_expense_exceeds_budget() {
        let conn = get_test_connection();
        let (category_id, name) = expense_category(&conn, "Groceries");
        let day = date!(2025 - 06 - 15);

        upsert_budget(TEST_USER, category_id, 2025, 6, 200.0, &conn).unwrap();
        record_expense(&conn, category_id, 180.0, day);

        let warning =
            check_budget_warning(TEST_USER, category_id, &name, 30.0, day, &conn).unwrap();

        assert_eq!(
            warning,
            Some(BudgetWarning {
                category_name: "Groceries".to_owned(),
                remaining: -10.0,
            })
        );
    }

    #[test]
    fn no_warning_within_budget() {
        let conn = get_test_connection();
        let (category_id, name) = expense_category(&conn, "Groceries");
        let day = date!(2025 - 06 - 15);

        upsert_budget(TEST_USER, category_id, 2025, 6, 200.0, &conn).unwrap();
        record_expense(&conn, category_id, 100.0, day);

        let warning =
            check_budget_warning(TEST_USER, category_id, &name, 50.0, day, &conn).unwrap();

        assert_eq!(warning, None);
    }

    #[test]
    fn no_warning_without_budget() {
        let conn = get_test_connection();
        let (category_id, name) = expense_category(&conn, "Groceries");

        let warning = check_budget_warning(
            TEST_USER,
            category_id,
            &name,
            1000.0,
            date!(2025 - 06 - 15),
            &conn,
        )
        .unwrap();

        assert_eq!(warning, None);
    }

    #[test]
    fn statuses_report_usage_percentage() {
        let conn = get_test_connection();
        let (category_id, _) = expense_category(&conn, "Groceries");
        let day = date!(2025 - 06 - 15);

        upsert_budget(TEST_USER, category_id, 2025, 6, 200.0, &conn).unwrap();
        record_expense(&conn, category_id, 50.0, day);

        let statuses = get_budget_statuses(TEST_USER, day, &conn).unwrap();

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].category_name, "Groceries");
        assert_eq!(statuses[0].budget_amount, 200.0);
        assert_eq!(statuses[0].spent_amount, 50.0);
        assert_eq!(statuses[0].usage_percentage, 25.0);
    }

    #[test]
    fn statuses_default_to_zero_spending() {
        let conn = get_test_connection();
        let (category_id, _) = expense_category(&conn, "Groceries");
        let day = date!(2025 - 06 - 15);

        upsert_budget(TEST_USER, category_id, 2025, 6, 200.0, &conn).unwrap();

        let statuses = get_budget_statuses(TEST_USER, day, &conn).unwrap();

        assert_eq!(statuses[0].spent_amount, 0.0);
        assert_eq!(statuses[0].usage_percentage, 0.0);
    }
}
