// Command-line parsing for the expense-manager binary

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, Local, NaiveDate};
use expense_manager::{parse_date, NewExpense, VERSION};
use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: expense-manager <command>

Commands:
  init                                   Create the expenses table
  add <date> <amount> <category> [notes] Record one expense
  delete <date>                          Delete every expense on a date
  show <date>                            List expenses on a date
  list                                   Print all expenses as CSV
  summary <start> <end>                  Totals per category for a date range
  months <start> <end>                   Totals per category for a month range (YYYY-MM)
  import <file.csv>                      Insert rows from expense_date,amount,category,notes CSV
  dashboard [start] [end]                Terminal dashboard (default command)
  version                                Print the version

Dates are YYYY-MM-DD. Amounts have at most 2 decimal places.";

/// `expense-manager <version>`, printed by `version` and above the help text
pub fn version_line() -> String {
    format!("expense-manager {}", VERSION)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Init,
    Add(NewExpense),
    Delete(NaiveDate),
    Show(NaiveDate),
    List,
    Summary { start: NaiveDate, end: NaiveDate },
    Months { start: String, end: String },
    Import(PathBuf),
    Dashboard { start: NaiveDate, end: NaiveDate },
    Help,
    Version,
}

fn date_arg(args: &[String], idx: usize, name: &str) -> Result<NaiveDate> {
    let raw = args
        .get(idx)
        .ok_or_else(|| anyhow!("missing <{}>", name))?;
    parse_date(raw).with_context(|| format!("invalid <{}> '{}', expected YYYY-MM-DD", name, raw))
}

fn string_arg(args: &[String], idx: usize, name: &str) -> Result<String> {
    args.get(idx)
        .cloned()
        .ok_or_else(|| anyhow!("missing <{}>", name))
}

/// First day of the current month through today
fn current_month() -> (NaiveDate, NaiveDate) {
    let today = Local::now().date_naive();
    let first = today.with_day(1).unwrap_or(today);
    (first, today)
}

/// Parse the arguments after the program name
pub fn parse_args(args: &[String]) -> Result<Command> {
    let Some(name) = args.first() else {
        let (start, end) = current_month();
        return Ok(Command::Dashboard { start, end });
    };

    let command = match name.as_str() {
        "init" => Command::Init,
        "add" => {
            let expense_date = date_arg(args, 1, "date")?;
            let raw_amount = string_arg(args, 2, "amount")?;
            let amount: f64 = raw_amount
                .parse()
                .with_context(|| format!("invalid <amount> '{}'", raw_amount))?;
            let category = string_arg(args, 3, "category")?;
            let notes = args.get(4).cloned();
            Command::Add(NewExpense::new(expense_date, amount, category, notes))
        }
        "delete" => Command::Delete(date_arg(args, 1, "date")?),
        "show" => Command::Show(date_arg(args, 1, "date")?),
        "list" => Command::List,
        "summary" => Command::Summary {
            start: date_arg(args, 1, "start")?,
            end: date_arg(args, 2, "end")?,
        },
        "months" => Command::Months {
            start: string_arg(args, 1, "start")?,
            end: string_arg(args, 2, "end")?,
        },
        "import" => Command::Import(PathBuf::from(string_arg(args, 1, "file.csv")?)),
        "dashboard" => {
            let (default_start, default_end) = current_month();
            let start = match args.get(1) {
                Some(_) => date_arg(args, 1, "start")?,
                None => default_start,
            };
            let end = match args.get(2) {
                Some(_) => date_arg(args, 2, "end")?,
                None => default_end,
            };
            Command::Dashboard { start, end }
        }
        "help" | "-h" | "--help" => Command::Help,
        "version" | "-V" | "--version" => Command::Version,
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    };

    Ok(command)
}
