//! Defines the core data model and the atomic execution of wallet transfers.

use rusqlite::{Connection, params};
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    session::UserId,
    transaction::{NewTransaction, TransactionKind, find_or_create_bank_fees, record_transaction},
    wallet::{BalanceChange, WalletId, apply_balance_delta, get_wallet},
};

pub type TransferId = DatabaseId;

/// A completed movement of money between two of a user's wallets.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletTransfer {
    /// The ID of the transfer.
    pub id: TransferId,
    /// The user that made the transfer.
    pub user_id: UserId,
    /// The wallet the money came out of.
    pub from_wallet_id: WalletId,
    /// The wallet the money went into.
    pub to_wallet_id: WalletId,
    /// The amount moved, excluding the fee.
    pub amount: f64,
    /// The fee charged for the transfer, deducted from the source wallet.
    pub fee: f64,
    /// When the transfer happened.
    pub date: Date,
    /// A text description of what the transfer was for.
    pub description: String,
}

/// The fields needed to execute a transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransfer {
    pub user_id: UserId,
    pub from_wallet_id: WalletId,
    pub to_wallet_id: WalletId,
    pub amount: f64,
    pub fee: f64,
    pub date: Date,
    pub description: String,
}

/// A transfer joined to its wallet names for the recent transfers list.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentTransfer {
    pub amount: f64,
    pub fee: f64,
    pub date: Date,
    pub description: String,
    pub from_wallet_name: String,
    pub from_color: String,
    pub to_wallet_name: String,
    pub to_color: String,
}

/// Which side of a transfer a wallet was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Incoming,
    Outgoing,
}

/// A transfer as seen from one wallet's detail page.
#[derive(Debug, Clone, PartialEq)]
pub struct WalletTransferRow {
    pub amount: f64,
    pub fee: f64,
    pub date: Date,
    pub description: String,
    pub direction: TransferDirection,
    pub from_wallet_name: String,
    pub to_wallet_name: String,
}

pub fn create_transfer_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS wallet_transfer (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            from_wallet_id INTEGER NOT NULL,
            to_wallet_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            fee REAL NOT NULL DEFAULT 0,
            date TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK (from_wallet_id <> to_wallet_id),
            FOREIGN KEY(from_wallet_id) REFERENCES wallet(id),
            FOREIGN KEY(to_wallet_id) REFERENCES wallet(id)
        )",
        (),
    )?;

    Ok(())
}

/// Move money between two of the user's wallets as one atomic unit.
///
/// A transfer of amount A with fee F decreases the source balance by A+F and
/// increases the destination balance by A. A fee > 0 is recorded as a
/// separate expense transaction against the source wallet under the
/// "Bank Fees" category. Everything runs in one SQL transaction: on any
/// failure no balance change or ledger entry persists.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidTransferAmount] if the amount is not positive or the fee is negative,
/// - [Error::SameWalletTransfer] if both sides name the same wallet,
/// - [Error::WalletNotFound] if either wallet does not belong to the user,
/// - [Error::InsufficientBalance] if the source cannot cover amount + fee,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn execute_transfer(
    new: &NewTransfer,
    connection: &mut Connection,
) -> Result<WalletTransfer, Error> {
    if new.amount <= 0.0 || new.fee < 0.0 {
        return Err(Error::InvalidTransferAmount);
    }

    if new.from_wallet_id == new.to_wallet_id {
        return Err(Error::SameWalletTransfer);
    }

    let transaction = connection.transaction()?;

    let from = get_wallet(new.from_wallet_id, new.user_id, &transaction)?;
    let to = get_wallet(new.to_wallet_id, new.user_id, &transaction)?;

    let required = new.amount + new.fee;
    if from.balance < required {
        return Err(Error::InsufficientBalance {
            available: from.balance,
            required,
        });
    }

    let transfer = transaction
        .prepare(
            "INSERT INTO wallet_transfer (user_id, from_wallet_id, to_wallet_id, amount, fee, date, description)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, user_id, from_wallet_id, to_wallet_id, amount, fee, date, description",
        )?
        .query_row(
            params![
                new.user_id,
                new.from_wallet_id,
                new.to_wallet_id,
                new.amount,
                new.fee,
                new.date,
                new.description,
            ],
            |row| {
                Ok(WalletTransfer {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    from_wallet_id: row.get(2)?,
                    to_wallet_id: row.get(3)?,
                    amount: row.get(4)?,
                    fee: row.get(5)?,
                    date: row.get(6)?,
                    description: row.get(7)?,
                })
            },
        )?;

    apply_balance_delta(
        from.id,
        -new.amount,
        BalanceChange::TransferOut,
        &format!("Transfer to {}", to.wallet_name),
        None,
        Some(transfer.id),
        &transaction,
    )?;

    apply_balance_delta(
        to.id,
        new.amount,
        BalanceChange::TransferIn,
        &format!("Transfer from {}", from.wallet_name),
        None,
        Some(transfer.id),
        &transaction,
    )?;

    if new.fee > 0.0 {
        let fee_category_id = find_or_create_bank_fees(new.user_id, &transaction)?;
        let fee_description = if new.description.is_empty() {
            "Transfer fees: Wallet transfer".to_owned()
        } else {
            format!("Transfer fees: {}", new.description)
        };

        record_transaction(
            &NewTransaction {
                user_id: new.user_id,
                wallet_id: from.id,
                category_id: fee_category_id,
                kind: TransactionKind::Expense,
                amount: new.fee,
                description: fee_description,
                date: new.date,
            },
            &transaction,
        )?;
    }

    transaction.commit()?;

    Ok(transfer)
}

/// Retrieve the user's most recent transfers with their wallet names.
pub fn get_recent_transfers(
    user_id: UserId,
    limit: u64,
    connection: &Connection,
) -> Result<Vec<RecentTransfer>, Error> {
    connection
        .prepare(
            "SELECT tr.amount, tr.fee, tr.date, tr.description,
                fw.wallet_name, fw.color_code, tw.wallet_name, tw.color_code
            FROM wallet_transfer tr
            JOIN wallet fw ON fw.id = tr.from_wallet_id
            JOIN wallet tw ON tw.id = tr.to_wallet_id
            WHERE tr.user_id = ?1
            ORDER BY tr.date DESC, tr.id DESC
            LIMIT ?2",
        )?
        .query_map(params![user_id, limit as i64], |row| {
            Ok(RecentTransfer {
                amount: row.get(0)?,
                fee: row.get(1)?,
                date: row.get(2)?,
                description: row.get(3)?,
                from_wallet_name: row.get(4)?,
                from_color: row.get(5)?,
                to_wallet_name: row.get(6)?,
                to_color: row.get(7)?,
            })
        })?
        .map(|maybe_transfer| maybe_transfer.map_err(Error::SqlError))
        .collect()
}

/// Retrieve the most recent transfers involving one wallet, with the
/// direction seen from that wallet.
pub fn get_transfers_for_wallet(
    wallet_id: WalletId,
    limit: u64,
    connection: &Connection,
) -> Result<Vec<WalletTransferRow>, Error> {
    connection
        .prepare(
            "SELECT tr.amount, tr.fee, tr.date, tr.description,
                tr.from_wallet_id, fw.wallet_name, tw.wallet_name
            FROM wallet_transfer tr
            JOIN wallet fw ON fw.id = tr.from_wallet_id
            JOIN wallet tw ON tw.id = tr.to_wallet_id
            WHERE tr.from_wallet_id = ?1 OR tr.to_wallet_id = ?1
            ORDER BY tr.date DESC, tr.id DESC
            LIMIT ?2",
        )?
        .query_map(params![wallet_id, limit as i64], move |row| {
            let from_wallet_id: WalletId = row.get(4)?;

            Ok(WalletTransferRow {
                amount: row.get(0)?,
                fee: row.get(1)?,
                date: row.get(2)?,
                description: row.get(3)?,
                direction: if from_wallet_id == wallet_id {
                    TransferDirection::Outgoing
                } else {
                    TransferDirection::Incoming
                },
                from_wallet_name: row.get(5)?,
                to_wallet_name: row.get(6)?,
            })
        })?
        .map(|maybe_transfer| maybe_transfer.map_err(Error::SqlError))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod execute_transfer_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        transaction::{TransactionKind, get_recent_transactions},
        wallet::{NewWallet, create_wallet, get_balance_history, get_wallet},
    };

    use super::{NewTransfer, TransferDirection, execute_transfer, get_recent_transfers,
        get_transfers_for_wallet};

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

    fn new_transfer(from: i64, to: i64, amount: f64, fee: f64) -> NewTransfer {
        NewTransfer {
            user_id: TEST_USER,
            from_wallet_id: from,
            to_wallet_id: to,
            amount,
            fee,
            date: date!(2025 - 06 - 15),
            description: "Monthly savings".to_owned(),
        }
    }

    fn balance_of(conn: &Connection, wallet_id: i64) -> f64 {
        get_wallet(wallet_id, TEST_USER, conn).unwrap().balance
    }

    #[test]
    fn moves_amount_and_fee() {
        let mut conn = get_test_connection();
        let from = create_test_wallet(&conn, "A", 100.0);
        let to = create_test_wallet(&conn, "B", 0.0);

        let transfer = execute_transfer(&new_transfer(from, to, 40.0, 2.0), &mut conn).unwrap();

        assert_eq!(transfer.amount, 40.0);
        assert_eq!(transfer.fee, 2.0);
        assert_eq!(balance_of(&conn, from), 58.0);
        assert_eq!(balance_of(&conn, to), 40.0);

        // The fee must be recorded as a separate expense against the source wallet.
        let transactions = get_recent_transactions(TEST_USER, 10, &conn).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].kind, TransactionKind::Expense);
        assert_eq!(transactions[0].amount, 2.0);
        assert_eq!(transactions[0].category_name, "Bank Fees");
        assert_eq!(transactions[0].wallet_name, "A");
    }

    #[test]
    fn transfer_without_fee_records_no_transaction() {
        let mut conn = get_test_connection();
        let from = create_test_wallet(&conn, "A", 100.0);
        let to = create_test_wallet(&conn, "B", 0.0);

        execute_transfer(&new_transfer(from, to, 40.0, 0.0), &mut conn).unwrap();

        assert_eq!(balance_of(&conn, from), 60.0);
        assert_eq!(balance_of(&conn, to), 40.0);
        assert!(get_recent_transactions(TEST_USER, 10, &conn).unwrap().is_empty());
    }

    #[test]
    fn writes_ledger_entries_for_both_wallets() {
        let mut conn = get_test_connection();
        let from = create_test_wallet(&conn, "A", 100.0);
        let to = create_test_wallet(&conn, "B", 0.0);

        execute_transfer(&new_transfer(from, to, 40.0, 2.0), &mut conn).unwrap();

        let from_history = get_balance_history(from, 30, &conn).unwrap();
        let change_types: Vec<_> = from_history
            .iter()
            .map(|entry| entry.change_type.as_str())
            .collect();
        // Initial balance adjustment, transfer out, then the fee expense.
        assert_eq!(change_types, ["adjustment", "transfer_out", "expense"]);

        let to_history = get_balance_history(to, 30, &conn).unwrap();
        assert_eq!(to_history.len(), 1);
        assert_eq!(to_history[0].change_type, "transfer_in");
        assert_eq!(to_history[0].change_amount, 40.0);
    }

    #[test]
    fn rejects_non_positive_amount() {
        let mut conn = get_test_connection();
        let from = create_test_wallet(&conn, "A", 100.0);
        let to = create_test_wallet(&conn, "B", 0.0);

        for amount in [0.0, -5.0] {
            let result = execute_transfer(&new_transfer(from, to, amount, 0.0), &mut conn);

            assert_eq!(result, Err(Error::InvalidTransferAmount));
        }

        assert_eq!(balance_of(&conn, from), 100.0);
        assert_eq!(balance_of(&conn, to), 0.0);
    }

    #[test]
    fn rejects_negative_fee() {
        let mut conn = get_test_connection();
        let from = create_test_wallet(&conn, "A", 100.0);
        let to = create_test_wallet(&conn, "B", 0.0);

        let result = execute_transfer(&new_transfer(from, to, 10.0, -1.0), &mut conn);

        assert_eq!(result, Err(Error::InvalidTransferAmount));
        assert_eq!(balance_of(&conn, from), 100.0);
    }

    #[test]
    fn rejects_same_wallet() {
        let mut conn = get_test_connection();
        let wallet = create_test_wallet(&conn, "A", 100.0);

        let result = execute_transfer(&new_transfer(wallet, wallet, 10.0, 0.0), &mut conn);

        assert_eq!(result, Err(Error::SameWalletTransfer));
        assert_eq!(balance_of(&conn, wallet), 100.0);
    }

    #[test]
    fn rejects_insufficient_balance() {
        let mut conn = get_test_connection();
        let from = create_test_wallet(&conn, "A", 41.0);
        let to = create_test_wallet(&conn, "B", 0.0);

        let result = execute_transfer(&new_transfer(from, to, 40.0, 2.0), &mut conn);

        assert_eq!(
            result,
            Err(Error::InsufficientBalance {
                available: 41.0,
                required: 42.0,
            })
        );
        assert_eq!(balance_of(&conn, from), 41.0);
        assert_eq!(balance_of(&conn, to), 0.0);
        assert!(get_recent_transfers(TEST_USER, 10, &conn).unwrap().is_empty());
    }

    #[test]
    fn rejects_other_users_wallet() {
        let mut conn = get_test_connection();
        let from = create_test_wallet(&conn, "A", 100.0);
        let to = create_test_wallet(&conn, "B", 0.0);

        let mut transfer = new_transfer(from, to, 10.0, 0.0);
        transfer.user_id = TEST_USER + 1;

        let result = execute_transfer(&transfer, &mut conn);

        assert_eq!(result, Err(Error::WalletNotFound(Some(from))));
        assert_eq!(balance_of(&conn, from), 100.0);
    }

    #[test]
    fn recent_transfers_include_wallet_names() {
        let mut conn = get_test_connection();
        let from = create_test_wallet(&conn, "A", 100.0);
        let to = create_test_wallet(&conn, "B", 0.0);
        execute_transfer(&new_transfer(from, to, 25.0, 0.0), &mut conn).unwrap();

        let transfers = get_recent_transfers(TEST_USER, 10, &conn).unwrap();

        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].from_wallet_name, "A");
        assert_eq!(transfers[0].to_wallet_name, "B");
        assert_eq!(transfers[0].amount, 25.0);
    }

    #[test]
    fn wallet_transfers_carry_direction() {
        let mut conn = get_test_connection();
        let first = create_test_wallet(&conn, "A", 100.0);
        let second = create_test_wallet(&conn, "B", 50.0);
        execute_transfer(&new_transfer(first, second, 25.0, 0.0), &mut conn).unwrap();
        execute_transfer(&new_transfer(second, first, 10.0, 0.0), &mut conn).unwrap();

        let rows = get_transfers_for_wallet(first, 10, &conn).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].direction, TransferDirection::Incoming);
        assert_eq!(rows[0].amount, 10.0);
        assert_eq!(rows[1].direction, TransferDirection::Outgoing);
        assert_eq!(rows[1].amount, 25.0);
    }
}
