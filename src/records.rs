// 📋 Record Operations - insert, delete-by-date, fetch
//
// Each function is one unit of work on its own connection (see db::Database::with_cursor).
// There is no update: callers replace a day's expenses with delete_expenses_for_date
// followed by fresh inserts, which are two separately committed units.

use crate::db::Database;
use crate::error::{ExpenseError, Result};
use crate::expense::{Expense, ExpenseEntry, NewExpense};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

fn expense_from_row(row: &Row<'_>) -> rusqlite::Result<Expense> {
    Ok(Expense {
        id: row.get("id")?,
        expense_date: row.get("expense_date")?,
        amount: row.get("amount")?,
        category: row.get("category")?,
        notes: row.get("notes")?,
    })
}

fn select_all(conn: &Connection) -> Result<Vec<Expense>> {
    let mut stmt =
        conn.prepare("SELECT id, expense_date, amount, category, notes FROM expenses")?;

    let expenses = stmt
        .query_map([], expense_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(expenses)
}

/// Every expense in store order
pub fn all_expenses(db: &Database) -> Result<Vec<Expense>> {
    db.with_cursor(false, select_all)
}

/// Write every expense as CSV to `out`. Returns the number of rows written.
pub fn fetch_all_records<W: Write>(db: &Database, out: W) -> Result<usize> {
    let expenses = all_expenses(db)?;

    let mut writer = csv::Writer::from_writer(out);
    for expense in &expenses {
        writer.serialize(expense)?;
    }
    writer.flush()?;

    debug!(rows = expenses.len(), "emitted all records");
    Ok(expenses.len())
}

/// Amount, category and notes of every expense on `expense_date`
pub fn fetch_expenses_for_date(db: &Database, expense_date: NaiveDate) -> Result<Vec<ExpenseEntry>> {
    db.with_cursor(false, |conn| {
        let mut stmt = conn.prepare(
            "SELECT amount, category, notes FROM expenses WHERE expense_date = ?1",
        )?;

        let entries = stmt
            .query_map(params![expense_date], |row| {
                Ok(ExpenseEntry {
                    amount: row.get("amount")?,
                    category: row.get("category")?,
                    notes: row.get("notes")?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(%expense_date, rows = entries.len(), "fetched expenses for date");
        Ok(entries)
    })
}

/// Remove every expense on `expense_date` and commit. Returns rows removed.
pub fn delete_expenses_for_date(db: &Database, expense_date: NaiveDate) -> Result<usize> {
    let deleted = db.with_cursor(true, |conn| {
        Ok(conn.execute(
            "DELETE FROM expenses WHERE expense_date = ?1",
            params![expense_date],
        )?)
    })?;

    info!(%expense_date, deleted, "deleted expenses for date");
    Ok(deleted)
}

/// Append one expense and commit. Returns the store-assigned id.
///
/// Input that fails validation comes back as `InvalidExpense` without touching the store,
/// a failed INSERT as `InsertFailed`, and a database that cannot be opened as `Connection`.
pub fn insert_expense(db: &Database, expense: &NewExpense) -> Result<i64> {
    if let Err(e) = expense.validate() {
        warn!(error = %e, "rejected expense");
        return Err(e);
    }

    let result = db.with_cursor(true, |conn| {
        conn.execute(
            "INSERT INTO expenses (expense_date, amount, category, notes) VALUES (?1, ?2, ?3, ?4)",
            params![
                expense.expense_date,
                expense.amount,
                expense.category,
                expense.notes,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    });

    match result {
        Ok(id) => {
            info!(
                id,
                expense_date = %expense.expense_date,
                amount = expense.amount,
                category = %expense.category,
                "inserted expense"
            );
            Ok(id)
        }
        Err(ExpenseError::Query(e)) => {
            warn!(error = %e, "insert failed");
            Err(ExpenseError::insert_failed(e.to_string()))
        }
        Err(e) => Err(e),
    }
}

/// Read `expense_date,amount,category,notes` rows from a CSV file
pub fn load_csv(csv_path: &Path) -> Result<Vec<NewExpense>> {
    let mut rdr = csv::Reader::from_path(csv_path)?;

    let mut expenses = Vec::new();
    for result in rdr.deserialize() {
        let expense: NewExpense = result?;
        expenses.push(expense);
    }

    Ok(expenses)
}

/// Insert every row of a CSV file, one committed unit per row.
///
/// Stops at the first failure; rows inserted before it stay committed.
pub fn import_csv(db: &Database, csv_path: &Path) -> Result<usize> {
    let expenses = load_csv(csv_path)?;

    let mut inserted = 0;
    for expense in &expenses {
        insert_expense(db, expense)?;
        inserted += 1;
    }

    info!(path = %csv_path.display(), inserted, "imported expenses");
    Ok(inserted)
}
