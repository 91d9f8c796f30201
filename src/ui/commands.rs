use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use rust_decimal::Decimal;

use super::app::{App, AppLedger, InputMode, PendingAction, Screen};
use super::util::format_amount;
use crate::ledger::validate::parse_amount;
use crate::ledger::LedgerError;
use crate::models::{now_timestamp, UNCATEGORIZED};

pub(crate) struct Command {
    pub(crate) description: &'static str,
    pub(crate) run: fn(&str, &mut App, &mut AppLedger) -> anyhow::Result<()>,
}

macro_rules! register_command {
    ($name:expr, $desc:expr, $func:expr, $registry:expr) => {{
        $registry.insert(
            $name,
            Command {
                description: $desc,
                run: $func,
            },
        );
    }};
}

pub(crate) static COMMANDS: LazyLock<HashMap<&str, Command>> = LazyLock::new(|| {
    let mut r: HashMap<&str, Command> = HashMap::new();

    register_command!("q", "Quit FinTrack", cmd_quit, r);
    register_command!("quit", "Quit FinTrack", cmd_quit, r);
    register_command!("d", "Go to Dashboard", cmd_dashboard, r);
    register_command!("dashboard", "Go to Dashboard", cmd_dashboard, r);
    register_command!("b", "Go to Budgets", cmd_budgets, r);
    register_command!("budgets", "Go to Budgets", cmd_budgets, r);
    register_command!("t", "Go to History", cmd_history, r);
    register_command!("history", "Go to History", cmd_history, r);
    register_command!("help", "Show available commands", cmd_help, r);
    register_command!("h", "Show available commands", cmd_help, r);
    register_command!(
        "income",
        "Add income (e.g. :income Salary 15000)",
        cmd_income,
        r
    );
    register_command!("i", "Add income (e.g. :i Salary 15000)", cmd_income, r);
    register_command!(
        "expense",
        "Add expense (e.g. :expense Lunch 120 food)",
        cmd_expense,
        r
    );
    register_command!("x", "Add expense (e.g. :x Lunch 120 food)", cmd_expense, r);
    register_command!(
        "budget",
        "Set budget (e.g. :budget groceries 3000)",
        cmd_budget,
        r
    );
    register_command!(
        "edit",
        "Edit selected history entry (e.g. :edit Lunch 95 food)",
        cmd_edit,
        r
    );
    register_command!("e", "Edit selected history entry", cmd_edit, r);
    register_command!(
        "edit-budget",
        "Edit selected budget (e.g. :edit-budget groceries 3500)",
        cmd_edit_budget,
        r
    );
    register_command!("delete", "Delete selected history entry", cmd_delete, r);
    register_command!(
        "delete-budget",
        "Delete selected budget",
        cmd_delete_budget,
        r
    );
    register_command!(
        "categories",
        "List expense categories",
        cmd_categories,
        r
    );
    register_command!("c", "List expense categories", cmd_categories, r);
    register_command!(
        "check",
        "Compare budget depletion with recorded expenses",
        cmd_check,
        r
    );
    register_command!(
        "export",
        "Export history to CSV (e.g. :export ~/fintrack.csv)",
        cmd_export,
        r
    );

    r
});

pub(crate) fn handle_command(
    input: &str,
    app: &mut App,
    ledger: &mut AppLedger,
) -> anyhow::Result<()> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    let mut parts = trimmed.splitn(2, ' ');
    let cmd_name = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    if let Some(cmd) = COMMANDS.get(cmd_name) {
        (cmd.run)(args, app, ledger)?;
    } else {
        let suggestion = find_closest(cmd_name);
        app.set_status(format!(
            "Unknown command: :{cmd_name}. Did you mean :{suggestion}?"
        ));
    }

    Ok(())
}

/// Run the action waiting on a `[y/N]` answer.
pub(crate) fn confirm_pending(app: &mut App, ledger: &mut AppLedger) {
    let outcome = match app.pending_action.take() {
        Some(PendingAction::DeleteEntry { id, description }) => ledger
            .delete_entry(id)
            .map(|kind| format!("Deleted {}: {description}", kind.as_str().to_lowercase())),
        Some(PendingAction::DeleteBudget { id, category }) => ledger
            .delete_budget(id)
            .map(|_| format!("Deleted budget: {category}")),
        None => Ok(String::new()),
    };
    app.input_mode = InputMode::Normal;
    app.confirm_message.clear();
    finish(app, ledger, outcome);
}

fn find_closest(input: &str) -> String {
    COMMANDS
        .keys()
        .filter(|k| k.len() > 1) // skip single-letter aliases for suggestions
        .min_by_key(|k| levenshtein(input, k))
        .unwrap_or(&"help")
        .to_string()
}

fn levenshtein(a: &str, b: &str) -> usize {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Show the outcome of a ledger operation, refreshing the views on success.
fn finish(app: &mut App, ledger: &AppLedger, outcome: Result<String, LedgerError>) {
    match outcome {
        Ok(msg) => {
            app.refresh(ledger);
            if !msg.is_empty() {
                app.set_status(msg);
            }
        }
        Err(err) => app.set_status(format!("Error: {err}")),
    }
}

// ── Argument parsing ─────────────────────────────────────────

/// `<text> <amount>`: the last token is the amount.
pub(crate) fn split_amount(args: &str) -> Result<(&str, Decimal), LedgerError> {
    let (text, amount) = args
        .trim()
        .rsplit_once(' ')
        .ok_or_else(|| LedgerError::Validation("expected <name> <amount>".into()))?;
    Ok((text.trim(), parse_amount(amount)?))
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct EntryArgs {
    pub(crate) description: String,
    pub(crate) amount: Decimal,
    pub(crate) category: Option<String>,
}

/// `<description> <amount> [category]`.
///
/// A trailing run of tokens naming one of `categories`, directly after a
/// numeric token, is taken as the category even when it looks like a number
/// itself. Otherwise the rightmost numeric token after the first is the
/// amount and anything after it is the category.
pub(crate) fn parse_entry_args(
    args: &str,
    categories: &[String],
) -> Result<EntryArgs, LedgerError> {
    let tokens: Vec<&str> = args.split_whitespace().collect();
    let is_amount = |t: &str| t.parse::<Decimal>().is_ok();

    let known_category = (2..tokens.len()).find(|&start| {
        let suffix = tokens[start..].join(" ");
        is_amount(tokens[start - 1]) && categories.iter().any(|c| *c == suffix)
    });
    let pos = known_category
        .map(|start| start - 1)
        .or_else(|| {
            tokens
                .iter()
                .enumerate()
                .skip(1)
                .rev()
                .find(|(_, t)| is_amount(t.trim()))
                .map(|(i, _)| i)
        })
        .ok_or_else(|| {
            LedgerError::Validation("expected <description> <amount> [category]".into())
        })?;

    let category = tokens[pos + 1..].join(" ");
    Ok(EntryArgs {
        description: tokens[..pos].join(" "),
        amount: parse_amount(tokens[pos])?,
        category: (!category.is_empty()).then_some(category),
    })
}

fn check_category(ledger: &AppLedger, category: &str) -> Result<(), LedgerError> {
    if ledger.is_known_category(category) {
        Ok(())
    } else {
        Err(LedgerError::Validation(format!(
            "unknown category '{category}'. Choices: {}",
            ledger.expense_categories().join(", ")
        )))
    }
}

// ── Command implementations ──────────────────────────────────

fn cmd_quit(_args: &str, app: &mut App, _ledger: &mut AppLedger) -> anyhow::Result<()> {
    app.running = false;
    Ok(())
}

fn cmd_dashboard(_args: &str, app: &mut App, ledger: &mut AppLedger) -> anyhow::Result<()> {
    app.screen = Screen::Dashboard;
    app.refresh(ledger);
    Ok(())
}

fn cmd_budgets(_args: &str, app: &mut App, ledger: &mut AppLedger) -> anyhow::Result<()> {
    app.screen = Screen::Budgets;
    app.refresh(ledger);
    Ok(())
}

fn cmd_history(_args: &str, app: &mut App, ledger: &mut AppLedger) -> anyhow::Result<()> {
    app.screen = Screen::History;
    app.refresh(ledger);
    Ok(())
}

fn cmd_help(_args: &str, app: &mut App, _ledger: &mut AppLedger) -> anyhow::Result<()> {
    app.show_help = true;
    Ok(())
}

fn cmd_income(args: &str, app: &mut App, ledger: &mut AppLedger) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :income <description> <amount>. Example: :income Salary 15000");
        return Ok(());
    }

    let outcome = split_amount(args).and_then(|(description, amount)| {
        ledger.add_income(description, amount, &now_timestamp())?;
        Ok(format!(
            "Added income: {description} {}",
            format_amount(amount, &app.currency)
        ))
    });
    finish(app, ledger, outcome);
    Ok(())
}

fn cmd_expense(args: &str, app: &mut App, ledger: &mut AppLedger) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status(
            "Usage: :expense <description> <amount> [category]. Example: :expense Lunch 120 food",
        );
        return Ok(());
    }

    let outcome = parse_entry_args(args, &ledger.expense_categories()).and_then(|parsed| {
        let category = parsed.category.as_deref().unwrap_or(UNCATEGORIZED);
        check_category(ledger, category)?;
        ledger.add_expense(&parsed.description, parsed.amount, category, &now_timestamp())?;
        Ok(format!(
            "Added expense: {} {} ({category})",
            parsed.description,
            format_amount(parsed.amount, &app.currency)
        ))
    });
    finish(app, ledger, outcome);
    Ok(())
}

fn cmd_budget(args: &str, app: &mut App, ledger: &mut AppLedger) -> anyhow::Result<()> {
    if args.is_empty() {
        app.set_status("Usage: :budget <category> <amount>. Example: :budget groceries 3000");
        return Ok(());
    }

    let outcome = split_amount(args).and_then(|(category, amount)| {
        ledger.set_budget(category, amount)?;
        Ok(format!(
            "Budget set: {category} = {}",
            format_amount(amount, &app.currency)
        ))
    });
    if outcome.is_ok() {
        app.screen = Screen::Budgets;
    }
    finish(app, ledger, outcome);
    Ok(())
}

fn cmd_edit(args: &str, app: &mut App, ledger: &mut AppLedger) -> anyhow::Result<()> {
    let Some(entry) = app
        .selected_entry()
        .filter(|_| app.screen == Screen::History)
        .cloned()
    else {
        app.set_status("Navigate to History and select an entry first");
        return Ok(());
    };

    if args.is_empty() {
        let mut text = format!("edit {} {}", entry.description, entry.amount);
        if let Some(category) = &entry.category {
            text.push(' ');
            text.push_str(category);
        }
        app.prefill_command(text);
        app.set_status("Change the values and press Enter");
        return Ok(());
    }

    let outcome = if entry.is_income() {
        split_amount(args).and_then(|(description, amount)| {
            ledger.edit_entry(entry.id, description, amount, None)?;
            Ok(format!("Updated income: {description}"))
        })
    } else {
        let mut categories = ledger.expense_categories();
        categories.extend(entry.category.clone());
        parse_entry_args(args, &categories).and_then(|parsed| {
            if let Some(category) = parsed.category.as_deref() {
                if entry.category.as_deref() != Some(category) {
                    check_category(ledger, category)?;
                }
            }
            ledger.edit_entry(
                entry.id,
                &parsed.description,
                parsed.amount,
                parsed.category.as_deref(),
            )?;
            Ok(format!("Updated expense: {}", parsed.description))
        })
    };
    finish(app, ledger, outcome);
    Ok(())
}

fn cmd_edit_budget(args: &str, app: &mut App, ledger: &mut AppLedger) -> anyhow::Result<()> {
    let Some(budget) = app
        .selected_budget()
        .filter(|_| app.screen == Screen::Budgets)
        .cloned()
    else {
        app.set_status("Navigate to Budgets and select one first");
        return Ok(());
    };

    if args.is_empty() {
        app.prefill_command(format!("edit-budget {} {}", budget.category, budget.amount));
        app.set_status("Change the category or amount and press Enter");
        return Ok(());
    }

    let outcome = split_amount(args).and_then(|(category, amount)| {
        ledger.edit_budget(budget.id, category, amount)?;
        Ok(format!(
            "Budget updated: {category} = {}",
            format_amount(amount, &app.currency)
        ))
    });
    finish(app, ledger, outcome);
    Ok(())
}

fn cmd_delete(_args: &str, app: &mut App, _ledger: &mut AppLedger) -> anyhow::Result<()> {
    if app.screen != Screen::History {
        app.set_status("Navigate to History and select an entry first");
        return Ok(());
    }

    if let Some(entry) = app.selected_entry() {
        let id = entry.id;
        let description = entry.description.clone();
        let message = format!("Delete {} '{description}'?", entry.kind.as_str().to_lowercase());
        app.ask_confirm(message, PendingAction::DeleteEntry { id, description });
    } else {
        app.set_status("No entries to delete");
    }

    Ok(())
}

fn cmd_delete_budget(_args: &str, app: &mut App, _ledger: &mut AppLedger) -> anyhow::Result<()> {
    if app.screen != Screen::Budgets {
        app.set_status("Navigate to Budgets and select one first");
        return Ok(());
    }

    if let Some(budget) = app.selected_budget() {
        let id = budget.id;
        let category = budget.category.clone();
        let message = format!("Delete budget '{category}'?");
        app.ask_confirm(message, PendingAction::DeleteBudget { id, category });
    } else {
        app.set_status("No budgets to delete");
    }

    Ok(())
}

fn cmd_categories(_args: &str, app: &mut App, ledger: &mut AppLedger) -> anyhow::Result<()> {
    app.refresh(ledger);
    app.set_status(format!("Categories: {}", app.categories.join(", ")));
    Ok(())
}

fn cmd_check(_args: &str, app: &mut App, ledger: &mut AppLedger) -> anyhow::Result<()> {
    let drifted: Vec<String> = ledger
        .budget_drift()
        .iter()
        .filter(|d| !d.is_consistent())
        .map(|d| {
            let diff = d.difference();
            let sign = if diff > Decimal::ZERO { "+" } else { "" };
            format!(
                "{} {sign}{}",
                d.category,
                format_amount(diff, &app.currency)
            )
        })
        .collect();

    if drifted.is_empty() {
        app.set_status("All budgets match their recorded expenses");
    } else {
        app.set_status(format!("Budget drift: {}", drifted.join(", ")));
    }
    Ok(())
}

fn cmd_export(args: &str, app: &mut App, ledger: &mut AppLedger) -> anyhow::Result<()> {
    let path = if args.is_empty() {
        crate::export::default_export_path()
    } else {
        crate::run::shellexpand(args)
    };

    match crate::export::export_history(Path::new(&path), &ledger.history()) {
        Ok(0) => app.set_status(format!("No entries to export; wrote header to {path}")),
        Ok(count) => app.set_status(format!("Exported {count} entries to {path}")),
        Err(e) => app.set_status(format!("Export failed: {e:#}")),
    }
    Ok(())
}
