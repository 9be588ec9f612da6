// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

mod cli;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use cli::Command;
use expense_manager::{
    delete_expenses_for_date, fetch_all_records, fetch_expense_summary,
    fetch_expenses_by_month_range, fetch_expenses_for_date, import_csv, insert_expense,
    logging, AppConfig, CategoryTotal, Database,
};
use std::env;

fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_tracing(&config.log_level);

    let args: Vec<String> = env::args().skip(1).collect();
    let command = cli::parse_args(&args)?;

    let db = Database::new(config.database);
    run(command, &db)
}

fn run(command: Command, db: &Database) -> Result<()> {
    match command {
        Command::Init => {
            db.setup().context("Failed to create expenses table")?;
            println!("✓ Database ready: {}", db.config().database);
        }
        Command::Add(expense) => {
            let id = insert_expense(db, &expense)?;
            println!(
                "✓ Added expense #{}: {} {:.2} {}",
                id, expense.expense_date, expense.amount, expense.category
            );
        }
        Command::Delete(date) => {
            let deleted = delete_expenses_for_date(db, date)?;
            println!("✓ Deleted {} expenses for {}", deleted, date);
        }
        Command::Show(date) => {
            let entries = fetch_expenses_for_date(db, date)?;
            if entries.is_empty() {
                println!("No expenses on {}", date);
            }
            for entry in entries {
                println!(
                    "{:>12.2}  {:<20} {}",
                    entry.amount,
                    entry.category,
                    entry.notes.unwrap_or_default()
                );
            }
        }
        Command::List => {
            fetch_all_records(db, std::io::stdout().lock())?;
        }
        Command::Summary { start, end } => {
            let totals = fetch_expense_summary(db, start, end)?;
            print_totals(&format!("{} → {}", start, end), &totals);
        }
        Command::Months { start, end } => {
            let totals = fetch_expenses_by_month_range(db, &start, &end)?;
            print_totals(
                &format!(
                    "{} → {}",
                    expense_manager::year_month(&start),
                    expense_manager::year_month(&end)
                ),
                &totals,
            );
        }
        Command::Import(path) => {
            let inserted = import_csv(db, &path)
                .with_context(|| format!("Import from {} failed", path.display()))?;
            println!("✓ Imported {} expenses from {}", inserted, path.display());
        }
        Command::Dashboard { start, end } => run_ui_mode(db, start, end)?,
        Command::Help => println!("{}\n\n{}", cli::version_line(), cli::USAGE),
        Command::Version => println!("{}", cli::version_line()),
    }

    Ok(())
}

fn print_totals(range: &str, totals: &[CategoryTotal]) {
    if totals.is_empty() {
        println!("No expenses found for {}", range);
        return;
    }

    println!("Expenses by category, {}", range);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for row in totals {
        println!("{:<20} {:>12.2}", row.category, row.total);
    }
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let grand: f64 = totals.iter().map(|t| t.total).sum();
    println!("{:<20} {:>12.2}", "Total", grand);
}

#[cfg(feature = "tui")]
fn run_ui_mode(db: &Database, start: NaiveDate, end: NaiveDate) -> Result<()> {
    let mut app = ui::App::load(db, start, end).context("Failed to load dashboard data")?;
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_db: &Database, _start: NaiveDate, _end: NaiveDate) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use web UI: cargo run --bin expense-server --features server");
    std::process::exit(1);
}
