// 💰 Expense - the only entity in the store, plus the row shapes queries return

use crate::error::{ExpenseError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A persisted expense row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Store-assigned surrogate key
    pub id: i64,
    pub expense_date: NaiveDate,
    pub amount: f64,
    pub category: String,
    pub notes: Option<String>,
}

/// An expense that has not been stored yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub expense_date: NaiveDate,
    pub amount: f64,
    pub category: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewExpense {
    pub fn new(
        expense_date: NaiveDate,
        amount: f64,
        category: impl Into<String>,
        notes: Option<String>,
    ) -> Self {
        NewExpense {
            expense_date,
            amount,
            category: category.into(),
            notes,
        }
    }

    /// Check the persistence invariants: positive finite amount in whole cents,
    /// non-empty category
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(ExpenseError::invalid(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }

        if !is_whole_cents(self.amount) {
            return Err(ExpenseError::invalid(format!(
                "amount must have at most 2 decimal places, got {}",
                self.amount
            )));
        }

        if self.category.is_empty() {
            return Err(ExpenseError::invalid("category must not be empty"));
        }

        Ok(())
    }
}

/// Stored amounts are whole cents, so per-category totals can be read back at cent precision
fn is_whole_cents(amount: f64) -> bool {
    let cents = amount * 100.0;
    (cents - cents.round()).abs() < 1e-6
}

/// Row returned by the per-date lookup (date and id are implied by the query)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseEntry {
    pub amount: f64,
    pub category: String,
    pub notes: Option<String>,
}

/// Parse an ISO `YYYY-MM-DD` date
pub fn parse_date(input: &str) -> std::result::Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
}
