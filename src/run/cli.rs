use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::ledger::{Ledger, LedgerError};
use crate::models::{now_timestamp, EntryKind, UNCATEGORIZED};
use crate::store::Database;
use crate::ui::commands::{parse_entry_args, split_amount};
use crate::ui::util::format_amount;

pub(crate) fn as_cli(args: &[String], ledger: &mut Ledger<Database>, currency: &str) -> Result<()> {
    let rest = &args[2..];
    match args[1].as_str() {
        "summary" | "s" => cli_summary(ledger, currency),
        "budgets" => cli_budgets(ledger, currency),
        "history" => cli_history(ledger, currency),
        "categories" => {
            for category in ledger.expense_categories() {
                println!("{category}");
            }
            Ok(())
        }
        "income" => cli_income(rest, ledger, currency),
        "budget" => cli_budget(rest, ledger, currency),
        "expense" => cli_expense(rest, ledger, currency),
        "edit-budget" => cli_edit_budget(rest, ledger),
        "delete-budget" => cli_delete_budget(rest, ledger),
        "edit" => cli_edit(rest, ledger),
        "delete" => cli_delete(rest, ledger),
        "check" => cli_check(ledger, currency),
        "export" => cli_export(rest, ledger),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("fintrack {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("FinTrack - local-only income, budget and expense tracker");
    println!();
    println!("Usage: fintrack [command]");
    println!();
    println!("Commands:");
    println!("  (none)                                  Launch interactive TUI");
    println!("  summary, s                              Print income, spending and balance");
    println!("  budgets                                 List budgets with remaining amounts");
    println!("  history                                 List incomes then expenses with indexes");
    println!("  categories                              List expense category choices");
    println!("  income <description> <amount>           Record an income");
    println!("  budget <category> <amount>              Allocate a budget");
    println!("  expense <description> <amount> [cat]    Record an expense (default: uncategorized)");
    println!("  edit-budget <index> <category> <amount> Rename or reallocate a budget");
    println!("  delete-budget <index> [--yes]           Delete a budget");
    println!("  edit <index> <description> <amount> [cat]  Edit a history entry");
    println!("  delete <index> [--yes]                  Delete a history entry");
    println!("  check                                   Report budgets out of step with expenses");
    println!("  export [path]                           Export history to CSV");
    println!("  --help, -h                              Show this help");
    println!("  --version, -V                           Show version");
}

// ── Reports ──────────────────────────────────────────────────

fn cli_summary(ledger: &Ledger<Database>, currency: &str) -> Result<()> {
    let summary = ledger.summary();
    println!("FinTrack summary");
    println!("{}", "─".repeat(44));
    println!(
        "  Income:              {:>20}",
        format_amount(summary.total_income, currency)
    );
    println!(
        "  Budgeted expenses:   {:>20}",
        format_amount(summary.total_budgeted_expenses, currency)
    );
    println!(
        "  Uncategorized:       {:>20}",
        format_amount(summary.total_uncategorized_expenses, currency)
    );
    println!(
        "  Remaining balance:   {:>20}",
        format_amount(summary.remaining_balance, currency)
    );

    let records = ledger.snapshot();
    println!(
        "  Records:             {} incomes, {} budgets, {} expenses",
        records.incomes.len(),
        records.budgets.len(),
        records.expenses.len()
    );
    Ok(())
}

fn cli_budgets(ledger: &Ledger<Database>, currency: &str) -> Result<()> {
    let budgets = ledger.budgets_with_progress();
    if budgets.is_empty() {
        println!("No budgets");
        return Ok(());
    }

    println!(
        "{:<4} {:<20} {:>18} {:>18} {:>7}",
        "#", "Category", "Remaining", "Amount", "Left"
    );
    println!("{}", "─".repeat(71));
    for (i, b) in budgets.iter().enumerate() {
        let left = b
            .fraction_remaining
            .and_then(|f| f.checked_mul(Decimal::ONE_HUNDRED))
            .map(|pct| format!("{pct:.0}%"))
            .unwrap_or_else(|| "n/a".into());
        println!(
            "{:<4} {:<20} {:>18} {:>18} {:>7}",
            i,
            b.category,
            format_amount(b.remaining, currency),
            format_amount(b.amount, currency),
            left,
        );
    }
    Ok(())
}

fn cli_history(ledger: &Ledger<Database>, currency: &str) -> Result<()> {
    let history = ledger.history();
    if history.is_empty() {
        println!("No entries");
        return Ok(());
    }

    println!(
        "{:<4} {:<8} {:<28} {:>18} {:<16} Timestamp",
        "#", "Type", "Description", "Amount", "Category"
    );
    println!("{}", "─".repeat(100));
    for entry in &history {
        println!(
            "{:<4} {:<8} {:<28} {:>18} {:<16} {}",
            entry.index,
            entry.kind,
            entry.description,
            format_amount(entry.amount, currency),
            entry.category.as_deref().unwrap_or("-"),
            entry.timestamp,
        );
    }
    Ok(())
}

fn cli_check(ledger: &Ledger<Database>, currency: &str) -> Result<()> {
    let drifted: Vec<_> = ledger
        .budget_drift()
        .into_iter()
        .filter(|d| !d.is_consistent())
        .collect();
    if drifted.is_empty() {
        println!("All budgets match their recorded expenses");
        return Ok(());
    }

    println!(
        "{:<20} {:>18} {:>18} {:>18}",
        "Category", "Depleted", "Recorded", "Difference"
    );
    for d in &drifted {
        println!(
            "{:<20} {:>18} {:>18} {:>18}",
            d.category,
            format_amount(d.depleted, currency),
            format_amount(d.recorded, currency),
            format_amount(d.difference(), currency),
        );
    }
    Ok(())
}

fn cli_export(args: &[String], ledger: &Ledger<Database>) -> Result<()> {
    let output_path = args
        .first()
        .filter(|a| !a.starts_with('-'))
        .map(|a| shellexpand(a))
        .unwrap_or_else(crate::export::default_export_path);

    let count = crate::export::export_history(Path::new(&output_path), &ledger.history())?;
    println!("Exported {count} entries to {output_path}");
    Ok(())
}

// ── Mutations ────────────────────────────────────────────────

fn cli_income(args: &[String], ledger: &mut Ledger<Database>, currency: &str) -> Result<()> {
    let joined = args.join(" ");
    let (description, amount) = split_amount(&joined)
        .context("Usage: fintrack income <description> <amount>")?;
    ledger.add_income(description, amount, &now_timestamp())?;
    println!("Added income: {description} {}", format_amount(amount, currency));
    Ok(())
}

fn cli_budget(args: &[String], ledger: &mut Ledger<Database>, currency: &str) -> Result<()> {
    let joined = args.join(" ");
    let (category, amount) =
        split_amount(&joined).context("Usage: fintrack budget <category> <amount>")?;
    ledger.set_budget(category, amount)?;
    println!("Budget set: {category} = {}", format_amount(amount, currency));
    Ok(())
}

fn cli_expense(args: &[String], ledger: &mut Ledger<Database>, currency: &str) -> Result<()> {
    let parsed = parse_entry_args(&args.join(" "), &ledger.expense_categories())
        .context("Usage: fintrack expense <description> <amount> [category]")?;
    let category = parsed.category.as_deref().unwrap_or(UNCATEGORIZED);
    require_known_category(ledger, category)?;
    ledger.add_expense(&parsed.description, parsed.amount, category, &now_timestamp())?;
    println!(
        "Added expense: {} {} ({category})",
        parsed.description,
        format_amount(parsed.amount, currency)
    );
    Ok(())
}

fn cli_edit_budget(args: &[String], ledger: &mut Ledger<Database>) -> Result<()> {
    const USAGE: &str = "Usage: fintrack edit-budget <index> <category> <amount>";
    let (index, rest) = split_index(args).context(USAGE)?;
    let joined = rest.join(" ");
    let (category, amount) = split_amount(&joined).context(USAGE)?;
    ledger.edit_budget_at(index, category, amount)?;
    println!("Budget {index} updated: {category}");
    Ok(())
}

fn cli_delete_budget(args: &[String], ledger: &mut Ledger<Database>) -> Result<()> {
    let (index, rest) = split_index(args).context("Usage: fintrack delete-budget <index> [--yes]")?;
    let category = ledger
        .budgets_with_progress()
        .into_iter()
        .nth(index)
        .map(|b| b.category);

    if let Some(category) = category {
        if !confirmed(rest, &format!("Delete budget '{category}'?"))? {
            println!("Cancelled");
            return Ok(());
        }
    }
    let budget = ledger.delete_budget_at(index)?;
    println!("Deleted budget: {}", budget.category);
    Ok(())
}

fn cli_edit(args: &[String], ledger: &mut Ledger<Database>) -> Result<()> {
    const USAGE: &str = "Usage: fintrack edit <index> <description> <amount> [category]";
    let (index, rest) = split_index(args).context(USAGE)?;
    let joined = rest.join(" ");
    let id = ledger.entry_id_at(index)?;
    let current = ledger
        .history()
        .into_iter()
        .find(|e| e.id == id)
        .ok_or(LedgerError::UnknownRecord(id))?;

    match current.kind {
        EntryKind::Income => {
            let (description, amount) = split_amount(&joined).context(USAGE)?;
            ledger.edit_history_entry(index, description, amount, None)?;
        }
        EntryKind::Expense => {
            let mut categories = ledger.expense_categories();
            categories.extend(current.category.clone());
            let parsed = parse_entry_args(&joined, &categories).context(USAGE)?;
            if let Some(category) = parsed.category.as_deref() {
                if current.category.as_deref() != Some(category) {
                    require_known_category(ledger, category)?;
                }
            }
            ledger.edit_history_entry(
                index,
                &parsed.description,
                parsed.amount,
                parsed.category.as_deref(),
            )?;
        }
    }
    println!("Updated {} {index}", current.kind.as_str().to_lowercase());
    Ok(())
}

fn cli_delete(args: &[String], ledger: &mut Ledger<Database>) -> Result<()> {
    let (index, rest) = split_index(args).context("Usage: fintrack delete <index> [--yes]")?;
    let description = ledger
        .history()
        .into_iter()
        .nth(index)
        .map(|e| e.description);

    if let Some(description) = &description {
        if !confirmed(rest, &format!("Delete '{description}'?"))? {
            println!("Cancelled");
            return Ok(());
        }
    }
    let kind = ledger.delete_history_entry(index)?;
    println!(
        "Deleted {}: {}",
        kind.as_str().to_lowercase(),
        description.unwrap_or_default()
    );
    Ok(())
}

// ── Helpers ──────────────────────────────────────────────────

fn require_known_category(ledger: &Ledger<Database>, category: &str) -> Result<(), LedgerError> {
    if ledger.is_known_category(category) {
        return Ok(());
    }
    Err(LedgerError::Validation(format!(
        "unknown category '{category}'. Choices: {}",
        ledger.expense_categories().join(", ")
    )))
}

/// Leading positional index followed by the remaining arguments.
fn split_index(args: &[String]) -> Result<(usize, &[String])> {
    let (first, rest) = args
        .split_first()
        .ok_or_else(|| anyhow::anyhow!("Missing index"))?;
    let index = first
        .parse::<usize>()
        .with_context(|| format!("Invalid index: {first}"))?;
    Ok((index, rest))
}

fn confirmed(flags: &[String], prompt: &str) -> Result<bool> {
    if flags.iter().any(|f| f == "--yes" || f == "-y") {
        return Ok(true);
    }
    print!("{prompt} [y/N] ");
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let stdin = std::io::stdin();
    read_confirmation(stdin.lock())
}

/// Read one line; only `y` or `yes` (any case) confirms. End of input declines.
pub(crate) fn read_confirmation<R: BufRead>(mut reader: R) -> Result<bool> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("Failed to read confirmation")?;
    let answer = line.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_read_confirmation() {
        assert!(read_confirmation("y\n".as_bytes()).unwrap());
        assert!(read_confirmation("YES\n".as_bytes()).unwrap());
        assert!(!read_confirmation("n\n".as_bytes()).unwrap());
        assert!(!read_confirmation("sure\n".as_bytes()).unwrap());
        assert!(!read_confirmation("".as_bytes()).unwrap());
    }

    #[test]
    fn test_split_index() {
        let args = strings(&["2", "Lunch", "50"]);
        let (index, rest) = split_index(&args).unwrap();
        assert_eq!(index, 2);
        assert_eq!(rest, &args[1..]);

        assert!(split_index(&[]).is_err());
        assert!(split_index(&strings(&["-1"])).is_err());
        assert!(split_index(&strings(&["two"])).is_err());
    }

    #[test]
    fn test_yes_flag_skips_prompt() {
        assert!(confirmed(&strings(&["--yes"]), "Delete?").unwrap());
    }

    #[test]
    fn test_shellexpand_leaves_plain_paths() {
        assert_eq!(shellexpand("/tmp/out.csv"), "/tmp/out.csv");
        assert!(!shellexpand("~/out.csv").starts_with('~'));
    }

    #[test]
    fn test_cli_edit_and_delete_by_index() {
        let mut ledger = Ledger::open(Database::open_in_memory().unwrap()).unwrap();
        as_cli(&strings(&["fintrack", "budget", "food", "300"]), &mut ledger, "MVR").unwrap();
        as_cli(&strings(&["fintrack", "income", "Salary", "1000"]), &mut ledger, "MVR").unwrap();
        as_cli(
            &strings(&["fintrack", "expense", "Lunch", "50", "food"]),
            &mut ledger,
            "MVR",
        )
        .unwrap();

        as_cli(
            &strings(&["fintrack", "edit", "1", "Dinner", "80"]),
            &mut ledger,
            "MVR",
        )
        .unwrap();
        let history = ledger.history();
        assert_eq!(history[1].description, "Dinner");
        assert_eq!(history[1].category.as_deref(), Some("food"));

        as_cli(&strings(&["fintrack", "delete", "0", "--yes"]), &mut ledger, "MVR").unwrap();
        assert_eq!(ledger.history().len(), 1);
        assert!(as_cli(&strings(&["fintrack", "delete", "5", "--yes"]), &mut ledger, "MVR").is_err());
    }

    #[test]
    fn test_cli_numeric_category_survives_expense_and_edit() {
        let mut ledger = Ledger::open(Database::open_in_memory().unwrap()).unwrap();
        as_cli(&strings(&["fintrack", "budget", "2024", "300"]), &mut ledger, "MVR").unwrap();
        as_cli(
            &strings(&["fintrack", "expense", "Rent", "50", "2024"]),
            &mut ledger,
            "MVR",
        )
        .unwrap();
        as_cli(
            &strings(&["fintrack", "edit", "0", "Rent", "60", "2024"]),
            &mut ledger,
            "MVR",
        )
        .unwrap();

        let entry = &ledger.history()[0];
        assert_eq!(entry.description, "Rent");
        assert_eq!(entry.amount, Decimal::from(60));
        assert_eq!(entry.category.as_deref(), Some("2024"));
        assert_eq!(ledger.budgets_with_progress()[0].remaining, Decimal::from(250));
    }

    #[test]
    fn test_cli_rejects_unknown_category_and_command() {
        let mut ledger = Ledger::open(Database::open_in_memory().unwrap()).unwrap();
        assert!(as_cli(
            &strings(&["fintrack", "expense", "Lunch", "50", "food"]),
            &mut ledger,
            "MVR"
        )
        .is_err());
        assert!(ledger.history().is_empty());
        assert!(as_cli(&strings(&["fintrack", "frobnicate"]), &mut ledger, "MVR").is_err());
    }
}
