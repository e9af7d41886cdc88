//! Defines the core data model and queries for savings goals.
//!
//! Goal funds are tracked independently of wallet balances: contributing to
//! a goal never moves money between wallets.

use rusqlite::{Connection, Row, params};
use time::Date;

use crate::{Error, database_id::DatabaseId, session::UserId};

pub type GoalId = DatabaseId;

/// A savings target with a running total and optional deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsGoal {
    /// The ID of the goal.
    pub id: GoalId,
    /// The user the goal belongs to.
    pub user_id: UserId,
    /// The display name, e.g. "Emergency fund".
    pub name: String,
    /// The amount being saved towards.
    pub target_amount: f64,
    /// The amount saved so far.
    pub current_amount: f64,
    /// The date the user wants to reach the target by.
    pub deadline: Option<Date>,
    /// Set once `current_amount` reaches `target_amount`.
    pub is_completed: bool,
}

/// Aggregate figures across all of a user's goals.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalSummary {
    pub total_goals: i64,
    pub completed_goals: i64,
    pub total_target: f64,
    pub total_saved: f64,
}

/// The fields needed to create a savings goal.
#[derive(Debug, Clone, PartialEq)]
pub struct NewGoal {
    pub user_id: UserId,
    pub name: String,
    pub target_amount: f64,
    pub deadline: Option<Date>,
}

pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS savings_goal (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            target_amount REAL NOT NULL,
            current_amount REAL NOT NULL DEFAULT 0,
            deadline TEXT,
            is_completed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )?;

    Ok(())
}

fn map_goal_row(row: &Row) -> Result<SavingsGoal, rusqlite::Error> {
    Ok(SavingsGoal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        target_amount: row.get(3)?,
        current_amount: row.get(4)?,
        deadline: row.get(5)?,
        is_completed: row.get(6)?,
    })
}

const GOAL_COLUMNS: &str =
    "id, user_id, name, target_amount, current_amount, deadline, is_completed";

/// Create a new savings goal with nothing saved yet.
pub fn create_goal(new: &NewGoal, connection: &Connection) -> Result<SavingsGoal, Error> {
    let goal = connection
        .prepare(&format!(
            "INSERT INTO savings_goal (user_id, name, target_amount, deadline)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING {GOAL_COLUMNS}"
        ))?
        .query_row(
            params![new.user_id, new.name, new.target_amount, new.deadline],
            map_goal_row,
        )?;

    Ok(goal)
}

/// Retrieve all of `user_id`'s goals, active goals before completed ones.
pub fn get_goals(user_id: UserId, connection: &Connection) -> Result<Vec<SavingsGoal>, Error> {
    connection
        .prepare(&format!(
            "SELECT {GOAL_COLUMNS} FROM savings_goal
            WHERE user_id = :user_id
            ORDER BY is_completed, deadline IS NULL, deadline, id"
        ))?
        .query_map(&[(":user_id", &user_id)], map_goal_row)?
        .map(|maybe_goal| maybe_goal.map_err(Error::SqlError))
        .collect()
}

/// Add `amount` to a goal's running total, marking the goal completed when
/// it reaches the target.
///
/// # Errors
/// This function will return a:
/// - [Error::GoalNotFound] if `goal_id` does not refer to one of `user_id`'s goals,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn add_contribution(
    goal_id: GoalId,
    user_id: UserId,
    amount: f64,
    connection: &Connection,
) -> Result<SavingsGoal, Error> {
    connection
        .prepare(&format!(
            "UPDATE savings_goal
            SET current_amount = current_amount + ?1,
                is_completed = CASE
                    WHEN current_amount + ?1 >= target_amount THEN 1
                    ELSE is_completed
                END
            WHERE id = ?2 AND user_id = ?3
            RETURNING {GOAL_COLUMNS}"
        ))?
        .query_row(params![amount, goal_id, user_id], map_goal_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::GoalNotFound,
            error => error.into(),
        })
}

/// Aggregate figures across the user's goals, all zero when there are none.
pub fn get_goal_summary(user_id: UserId, connection: &Connection) -> Result<GoalSummary, Error> {
    let summary = connection.query_row(
        "SELECT
            COUNT(*),
            COALESCE(SUM(is_completed), 0),
            COALESCE(SUM(target_amount), 0),
            COALESCE(SUM(current_amount), 0)
        FROM savings_goal
        WHERE user_id = ?1",
        params![user_id],
        |row| {
            Ok(GoalSummary {
                total_goals: row.get(0)?,
                completed_goals: row.get(1)?,
                total_target: row.get(2)?,
                total_saved: row.get(3)?,
            })
        },
    )?;

    Ok(summary)
}

// ============================================================================
// TESTS
// ============================================================================
