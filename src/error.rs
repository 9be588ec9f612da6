// Error taxonomy for the data-access layer
// Every operation reports failures through ExpenseError; nothing is swallowed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExpenseError {
    /// Opening the database failed. No connection exists to release.
    #[error("failed to connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: rusqlite::Error,
    },

    /// A statement failed on an open connection
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// The expense failed validation and never reached the store
    #[error("invalid expense: {reason}")]
    InvalidExpense { reason: String },

    /// The INSERT statement failed on an open connection
    #[error("failed to insert expense: {reason}")]
    InsertFailed { reason: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExpenseError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ExpenseError::InvalidExpense {
            reason: reason.into(),
        }
    }

    pub fn insert_failed(reason: impl Into<String>) -> Self {
        ExpenseError::InsertFailed {
            reason: reason.into(),
        }
    }

    /// True when the caller's input was rejected before any statement ran
    pub fn is_rejected_input(&self) -> bool {
        matches!(self, ExpenseError::InvalidExpense { .. })
    }
}

pub type Result<T> = std::result::Result<T, ExpenseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_expense_is_rejected_input() {
        let err = ExpenseError::invalid("amount must be positive");
        assert_eq!(err.to_string(), "invalid expense: amount must be positive");
        assert!(err.is_rejected_input());
    }

    #[test]
    fn test_store_side_insert_failure_is_not_rejected_input() {
        let err = ExpenseError::insert_failed("no such table: expenses");
        assert_eq!(
            err.to_string(),
            "failed to insert expense: no such table: expenses"
        );
        assert!(!err.is_rejected_input());
    }

    #[test]
    fn test_query_error_is_not_rejected_input() {
        let err = ExpenseError::from(rusqlite::Error::InvalidQuery);
        assert!(err.to_string().starts_with("query failed"));
        assert!(!err.is_rejected_input());
    }
}
