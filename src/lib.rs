// Expense Manager - Core Library
// Exposes the data-access layer for the CLI, the terminal dashboard and the web server

pub mod config;
pub mod db;
pub mod error;
pub mod expense;
pub mod logging;
pub mod records;
pub mod summary;

// Re-export commonly used types
pub use config::{AppConfig, ConfigError, DatabaseConfig, ServerConfig};
pub use db::{setup_database, Database};
pub use error::{ExpenseError, Result};
pub use expense::{parse_date, Expense, ExpenseEntry, NewExpense};
pub use records::{
    all_expenses, delete_expenses_for_date, fetch_all_records, fetch_expenses_for_date,
    import_csv, insert_expense, load_csv,
};
pub use summary::{fetch_expense_summary, fetch_expenses_by_month_range, year_month, CategoryTotal};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
