//! Read-only spending aggregates for one user.

pub mod shops;

use std::path::Path;

use chrono::{DateTime, Months, Utc};
use rusqlite::{Connection, params};

pub use shops::{Pagination, RowWindow, ShopSort, ShopSortKey, spending_by_shop};

use crate::contracts::types::{MonthlyRow, TopProductRow, TotalSpending};
use crate::ingest::persist::format_timestamp;
use crate::state::map_sqlite_error;
use crate::{ClientError, ClientResult};

pub const DEFAULT_TOP_PRODUCTS_LIMIT: i64 = 10;
pub const MAX_TOP_PRODUCTS_LIMIT: i64 = 50;

/// Lifetime totals. Zero-filled when the user has no receipts.
pub fn total_spending(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
) -> ClientResult<TotalSpending> {
    connection
        .query_row(
            "SELECT
                COALESCE(SUM(total_sum), 0),
                COALESCE(SUM(cash_total_sum), 0),
                COALESCE(SUM(ecash_total_sum), 0),
                COALESCE(SUM(credit_sum), 0),
                COALESCE(SUM(prepaid_sum), 0),
                COUNT(receipt_id)
             FROM receipts
             WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(TotalSpending {
                    total_sum: row.get(0)?,
                    cash_total_sum: row.get(1)?,
                    ecash_total_sum: row.get(2)?,
                    credit_sum: row.get(3)?,
                    prepaid_sum: row.get(4)?,
                    receipts_count: row.get(5)?,
                })
            },
        )
        .map_err(|error| map_sqlite_error(db_path, &error))
}

/// Per-month totals for `year`. Months without receipts are absent.
pub fn monthly_dynamics(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    year: i32,
) -> ClientResult<Vec<MonthlyRow>> {
    let mut statement = connection
        .prepare(
            "SELECT
                CAST(strftime('%m', date_time) AS INTEGER) AS month,
                COALESCE(SUM(total_sum), 0),
                COALESCE(SUM(cash_total_sum), 0),
                COALESCE(SUM(ecash_total_sum), 0),
                COUNT(receipt_id)
             FROM receipts
             WHERE user_id = ?1
               AND strftime('%Y', date_time) = ?2
             GROUP BY month
             ORDER BY month ASC",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows = statement
        .query_map(params![user_id, format!("{year:04}")], |row| {
            Ok(MonthlyRow {
                month: row.get(0)?,
                total_sum: row.get(1)?,
                cash_total_sum: row.get(2)?,
                ecash_total_sum: row.get(3)?,
                receipts_count: row.get(4)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut months = Vec::new();
    for row in rows {
        months.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(months)
}

pub fn top_products(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    months_back: Option<u32>,
    limit: i64,
) -> ClientResult<Vec<TopProductRow>> {
    top_products_as_of(connection, db_path, user_id, months_back, limit, Utc::now())
}

/// Items grouped by `(name, measure)` and ranked by spend. With `months_back`
/// only receipts dated from midnight N calendar months before `as_of` up to
/// `as_of` count.
pub fn top_products_as_of(
    connection: &Connection,
    db_path: &Path,
    user_id: &str,
    months_back: Option<u32>,
    limit: i64,
    as_of: DateTime<Utc>,
) -> ClientResult<Vec<TopProductRow>> {
    if !(1..=MAX_TOP_PRODUCTS_LIMIT).contains(&limit) {
        return Err(ClientError::invalid_argument_for_command(
            &format!("Top products limit must be between 1 and {MAX_TOP_PRODUCTS_LIMIT}."),
            Some("analytics top-products"),
        ));
    }

    let (window_start, window_end) = match months_back {
        Some(months) => {
            let Some(start_date) = as_of.date_naive().checked_sub_months(Months::new(months))
            else {
                return Err(ClientError::invalid_argument_for_command(
                    "The months-back window reaches before the supported calendar range.",
                    Some("analytics top-products"),
                ));
            };
            let start = start_date.and_time(chrono::NaiveTime::MIN).and_utc();
            (Some(format_timestamp(&start)), Some(format_timestamp(&as_of)))
        }
        None => (None, None),
    };

    let mut statement = connection
        .prepare(
            "SELECT
                i.name,
                i.measure,
                SUM(i.sum) AS total_sum,
                SUM(i.quantity) AS total_quantity
             FROM receipt_items i
             JOIN receipts r ON r.receipt_id = i.receipt_id
             WHERE r.user_id = ?1
               AND (?2 IS NULL OR r.date_time >= ?2)
               AND (?3 IS NULL OR r.date_time <= ?3)
             GROUP BY i.name, i.measure
             ORDER BY total_sum DESC, i.name ASC, i.measure ASC
             LIMIT ?4",
        )
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let rows = statement
        .query_map(params![user_id, window_start, window_end, limit], |row| {
            Ok(TopProductRow {
                name: row.get(0)?,
                measure: row.get(1)?,
                total_sum: row.get(2)?,
                total_quantity: row.get(3)?,
            })
        })
        .map_err(|error| map_sqlite_error(db_path, &error))?;

    let mut products = Vec::new();
    for row in rows {
        products.push(row.map_err(|error| map_sqlite_error(db_path, &error))?);
    }
    Ok(products)
}
