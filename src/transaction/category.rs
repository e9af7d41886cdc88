//! Transaction categories: shared reference data plus per-user additions.

use rusqlite::{Connection, Row, params};

use crate::{
    Error,
    database_id::DatabaseId,
    session::UserId,
    transaction::core::TransactionKind,
};

pub type CategoryId = DatabaseId;

/// The category every transfer fee expense is recorded under.
pub const BANK_FEES_CATEGORY: &str = "Bank Fees";

/// A named bucket for income or expense transactions.
///
/// Categories with no owner are shared across all users; categories with an
/// owner are only visible to that user.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionCategory {
    /// The ID of the category.
    pub id: CategoryId,
    /// The owner, or `None` for a shared category.
    pub user_id: Option<UserId>,
    /// The display name, e.g. "Groceries".
    pub name: String,
    /// Whether the category is for income or expense transactions.
    pub kind: TransactionKind,
    /// A free-form description.
    pub description: String,
}

pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transaction_category (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER,
            name TEXT NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('income', 'expense')),
            description TEXT NOT NULL DEFAULT ''
        )",
        (),
    )?;

    Ok(())
}

pub fn seed_shared_categories(connection: &Connection) -> Result<(), rusqlite::Error> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM transaction_category WHERE user_id IS NULL",
        [],
        |row| row.get(0),
    )?;

    if count > 0 {
        return Ok(());
    }

    let categories = [
        ("Salary", TransactionKind::Income),
        ("Freelance", TransactionKind::Income),
        ("Investment Returns", TransactionKind::Income),
        ("Gifts", TransactionKind::Income),
        ("Other Income", TransactionKind::Income),
        ("Groceries", TransactionKind::Expense),
        ("Rent & Utilities", TransactionKind::Expense),
        ("Transport", TransactionKind::Expense),
        ("Dining Out", TransactionKind::Expense),
        ("Entertainment", TransactionKind::Expense),
        ("Health", TransactionKind::Expense),
        ("Shopping", TransactionKind::Expense),
        ("Other Expenses", TransactionKind::Expense),
    ];

    for (name, kind) in categories {
        connection.execute(
            "INSERT INTO transaction_category (user_id, name, kind) VALUES (NULL, ?1, ?2)",
            params![name, kind],
        )?;
    }

    Ok(())
}

pub fn map_category_row(row: &Row) -> Result<TransactionCategory, rusqlite::Error> {
    Ok(TransactionCategory {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        kind: row.get(3)?,
        description: row.get(4)?,
    })
}

/// Retrieve the categories of the given `kind` visible to `user_id`:
/// shared categories plus the user's own.
pub fn get_categories(
    kind: TransactionKind,
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<TransactionCategory>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind, description FROM transaction_category
            WHERE kind = :kind AND (user_id IS NULL OR user_id = :user_id)
            ORDER BY name",
        )?
        .query_map(
            &[
                (":kind", &kind as &dyn rusqlite::ToSql),
                (":user_id", &user_id as &dyn rusqlite::ToSql),
            ],
            map_category_row,
        )?
        .map(|maybe_category| maybe_category.map_err(Error::SqlError))
        .collect()
}

/// Retrieve a category visible to `user_id` by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if `id` does not refer to a category visible to the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_visible_category(
    id: CategoryId,
    user_id: UserId,
    connection: &Connection,
) -> Result<TransactionCategory, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind, description FROM transaction_category
            WHERE id = :id AND (user_id IS NULL OR user_id = :user_id)",
        )?
        .query_one(
            &[(":id", &id), (":user_id", &user_id)],
            map_category_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::InvalidCategory(Some(id)),
            error => error.into(),
        })
}

/// Find the expense category transfer fees are recorded under, creating it
/// for `user_id` on first use.
pub fn find_or_create_bank_fees(
    user_id: UserId,
    connection: &Connection,
) -> Result<CategoryId, Error> {
    let existing = connection
        .prepare(
            "SELECT id FROM transaction_category
            WHERE name = :name AND kind = 'expense'
                AND (user_id = :user_id OR user_id IS NULL)
            LIMIT 1",
        )?
        .query_one(
            &[
                (":name", &BANK_FEES_CATEGORY as &dyn rusqlite::ToSql),
                (":user_id", &user_id as &dyn rusqlite::ToSql),
            ],
            |row| row.get(0),
        );

    match existing {
        Ok(id) => Ok(id),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            connection.execute(
                "INSERT INTO transaction_category (user_id, name, kind, description)
                VALUES (?1, ?2, 'expense', 'Bank fees and charges')",
                params![user_id, BANK_FEES_CATEGORY],
            )?;

            Ok(connection.last_insert_rowid())
        }
        Err(error) => Err(error.into()),
    }
}
