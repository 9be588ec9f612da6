// 📊 Aggregation Operations - totals per category over a date or month range
//
// Both ranges are inclusive and compared as ISO text, so a backwards range
// (start after end) matches nothing. Categories group by exact label.

use crate::db::Database;
use crate::error::Result;
use chrono::NaiveDate;
use rusqlite::{params, ToSql};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Strip the binary noise SUM leaves over REAL amounts. Stored amounts are whole
/// cents (see `NewExpense::validate`), so no stored value is lost here.
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Reduce a date string to its first 7 characters (`YYYY-MM`); shorter input is kept whole
pub fn year_month(date: &str) -> &str {
    match date.char_indices().nth(7) {
        Some((idx, _)) => &date[..idx],
        None => date,
    }
}

fn totals_by_category(
    db: &Database,
    sql: &'static str,
    bounds: &[&dyn ToSql],
) -> Result<Vec<CategoryTotal>> {
    db.with_cursor(false, |conn| {
        let mut stmt = conn.prepare(sql)?;

        let totals = stmt
            .query_map(bounds, |row| {
                let total: f64 = row.get("total")?;
                Ok(CategoryTotal {
                    category: row.get("category")?,
                    total: round_cents(total),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(totals)
    })
}

/// Sum of amounts per category for expenses dated within `[start, end]`
pub fn fetch_expense_summary(
    db: &Database,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<CategoryTotal>> {
    let totals = totals_by_category(
        db,
        "SELECT category, SUM(amount) AS total
         FROM expenses
         WHERE expense_date BETWEEN ?1 AND ?2
         GROUP BY category
         ORDER BY category",
        params![start, end],
    )?;

    debug!(%start, %end, categories = totals.len(), "fetched expense summary");
    Ok(totals)
}

/// Sum of amounts per category for expenses whose year-month lies within the
/// year-months of `start` and `end`. The day of month of both inputs is ignored.
pub fn fetch_expenses_by_month_range(
    db: &Database,
    start: &str,
    end: &str,
) -> Result<Vec<CategoryTotal>> {
    let start_month = year_month(start);
    let end_month = year_month(end);

    debug!(start_month, end_month, "fetching expense summary for month range");

    let totals = totals_by_category(
        db,
        "SELECT category, SUM(amount) AS total
         FROM expenses
         WHERE strftime('%Y-%m', expense_date) BETWEEN ?1 AND ?2
         GROUP BY category
         ORDER BY category",
        params![start_month, end_month],
    )?;

    debug!(categories = totals.len(), "fetched month range summary");
    Ok(totals)
}
