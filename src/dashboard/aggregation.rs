//! The read-only aggregate queries behind the dashboard widgets.
//!
//! Every query filters by user, defaults to zero or an empty set when there
//! is no data, and has no side effects.

use rusqlite::{Connection, params};
use time::Date;

use crate::{Error, session::UserId, transaction::month_bounds};

/// Income and expense totals over some period.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct PeriodTotals {
    pub income: f64,
    pub expense: f64,
}

impl PeriodTotals {
    /// Income minus expenses.
    pub fn net(&self) -> f64 {
        self.income - self.expense
    }
}

/// Today's recorded activity.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct TodayActivity {
    pub transaction_count: i64,
    pub income: f64,
    pub expense: f64,
}

/// One category's expense total for the top categories widget.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CategoryTotal {
    pub name: String,
    pub total: f64,
    pub transaction_count: i64,
}

/// One month's totals for the trend chart.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct MonthlyTrendPoint {
    /// The month formatted as "YYYY-MM".
    pub month: String,
    pub income: f64,
    pub expense: f64,
}

/// Income and expense totals across the user's whole history.
pub(super) fn get_lifetime_totals(
    user_id: UserId,
    connection: &Connection,
) -> Result<PeriodTotals, Error> {
    let totals = connection.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN kind = 'income' THEN amount ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount ELSE 0 END), 0)
        FROM \"transaction\"
        WHERE user_id = ?1",
        params![user_id],
        |row| {
            Ok(PeriodTotals {
                income: row.get(0)?,
                expense: row.get(1)?,
            })
        },
    )?;

    Ok(totals)
}

/// Income and expense totals for the month containing `date`.
pub(super) fn get_month_totals(
    user_id: UserId,
    date: Date,
    connection: &Connection,
) -> Result<PeriodTotals, Error> {
    let (first, last) = month_bounds(date);

    let totals = connection.query_row(
        "SELECT
            COALESCE(SUM(CASE WHEN kind = 'income' THEN amount ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount ELSE 0 END), 0)
        FROM \"transaction\"
        WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
        params![user_id, first, last],
        |row| {
            Ok(PeriodTotals {
                income: row.get(0)?,
                expense: row.get(1)?,
            })
        },
    )?;

    Ok(totals)
}

/// The count and totals of transactions recorded for `today`.
pub(super) fn get_today_activity(
    user_id: UserId,
    today: Date,
    connection: &Connection,
) -> Result<TodayActivity, Error> {
    let activity = connection.query_row(
        "SELECT
            COUNT(id),
            COALESCE(SUM(CASE WHEN kind = 'income' THEN amount ELSE 0 END), 0),
            COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount ELSE 0 END), 0)
        FROM \"transaction\"
        WHERE user_id = ?1 AND date = ?2",
        params![user_id, today],
        |row| {
            Ok(TodayActivity {
                transaction_count: row.get(0)?,
                income: row.get(1)?,
                expense: row.get(2)?,
            })
        },
    )?;

    Ok(activity)
}

/// The average of the daily expense totals over the `days` days up to and
/// including `today`. Days without spending do not count towards the average.
pub(super) fn get_average_daily_expense(
    user_id: UserId,
    today: Date,
    days: i64,
    connection: &Connection,
) -> Result<f64, Error> {
    let since = today - time::Duration::days(days - 1);

    let average = connection.query_row(
        "SELECT COALESCE(AVG(daily_total), 0) FROM (
            SELECT SUM(amount) AS daily_total
            FROM \"transaction\"
            WHERE user_id = ?1 AND kind = 'expense' AND date BETWEEN ?2 AND ?3
            GROUP BY date
        )",
        params![user_id, since, today],
        |row| row.get(0),
    )?;

    Ok(average)
}

/// The categories with the highest expense totals for the month containing
/// `date`.
pub(super) fn get_top_expense_categories(
    user_id: UserId,
    date: Date,
    limit: u64,
    connection: &Connection,
) -> Result<Vec<CategoryTotal>, Error> {
    let (first, last) = month_bounds(date);

    connection
        .prepare(
            "SELECT c.name, SUM(t.amount) AS total, COUNT(t.id)
            FROM \"transaction\" t
            JOIN transaction_category c ON c.id = t.category_id
            WHERE t.user_id = ?1 AND t.kind = 'expense' AND t.date BETWEEN ?2 AND ?3
            GROUP BY c.name
            ORDER BY total DESC
            LIMIT ?4",
        )?
        .query_map(params![user_id, first, last, limit as i64], |row| {
            Ok(CategoryTotal {
                name: row.get(0)?,
                total: row.get(1)?,
                transaction_count: row.get(2)?,
            })
        })?
        .map(|maybe_total| maybe_total.map_err(Error::SqlError))
        .collect()
}

/// Monthly income/expense totals for the `months` months up to and
/// including the month containing `today`, oldest first.
///
/// Months without transactions appear as zero so the chart axis is
/// continuous.
pub(super) fn get_monthly_trend(
    user_id: UserId,
    today: Date,
    months: u32,
    connection: &Connection,
) -> Result<Vec<MonthlyTrendPoint>, Error> {
    let labels = trailing_month_labels(today, months);
    let since = format!("{}-01", labels[0]);

    let mut points: Vec<MonthlyTrendPoint> = labels
        .iter()
        .map(|label| MonthlyTrendPoint {
            month: label.clone(),
            income: 0.0,
            expense: 0.0,
        })
        .collect();

    connection
        .prepare(
            "SELECT substr(date, 1, 7) AS month,
                COALESCE(SUM(CASE WHEN kind = 'income' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN kind = 'expense' THEN amount ELSE 0 END), 0)
            FROM \"transaction\"
            WHERE user_id = ?1 AND date >= ?2
            GROUP BY month",
        )?
        .query_map(params![user_id, since], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, f64>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .for_each(|(month, income, expense)| {
            if let Some(point) = points.iter_mut().find(|point| point.month == month) {
                point.income = income;
                point.expense = expense;
            }
        });

    Ok(points)
}

/// The "YYYY-MM" labels for the `months` months ending at `today`, oldest
/// first.
fn trailing_month_labels(today: Date, months: u32) -> Vec<String> {
    let mut year = today.year();
    let mut month = i32::from(u8::from(today.month()));

    let mut labels = Vec::with_capacity(months as usize);
    for _ in 0..months {
        labels.push(format!("{year:04}-{month:02}"));

        month -= 1;
        if month == 0 {
            month = 12;
            year -= 1;
        }
    }

    labels.reverse();
    labels
}
