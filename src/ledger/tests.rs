#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::store::Database;

const T: &str = "2024-01-01 10:00:00";

fn ledger() -> Ledger<Database> {
    Ledger::open(Database::open_in_memory().unwrap()).unwrap()
}

/// In-memory store whose next save can be made to fail.
#[derive(Default)]
struct FlakyStore {
    saved: Snapshot,
    saves: usize,
    fail_next: bool,
}

impl Store for FlakyStore {
    fn load(&self) -> anyhow::Result<Snapshot> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, snapshot: &Snapshot) -> anyhow::Result<()> {
        if std::mem::take(&mut self.fail_next) {
            anyhow::bail!("disk full");
        }
        self.saves += 1;
        self.saved = snapshot.clone();
        Ok(())
    }
}

fn flaky_ledger() -> Ledger<FlakyStore> {
    Ledger::open(FlakyStore::default()).unwrap()
}

// ── Incomes ───────────────────────────────────────────────────

#[test]
fn test_total_income_is_exact_sum() {
    let mut ledger = ledger();
    let amounts = [dec!(0.10), dec!(0.20), dec!(1000), dec!(33.33), Decimal::ZERO];
    for amount in amounts {
        ledger.add_income("Pay", amount, T).unwrap();
    }
    assert_eq!(ledger.summary().total_income, dec!(1033.63));
}

#[test]
fn test_add_income_rejects_negative_amount() {
    let mut ledger = ledger();
    let err = ledger.add_income("Refund", dec!(-5), T).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert!(ledger.history().is_empty());
}

#[test]
fn test_add_income_rejects_blank_description() {
    let mut ledger = ledger();
    let err = ledger.add_income("   ", dec!(5), T).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert!(ledger.snapshot().incomes.is_empty());
}

// ── Budgets ───────────────────────────────────────────────────

#[test]
fn test_set_budget_starts_with_full_remaining() {
    let mut ledger = ledger();
    ledger.set_budget("food", dec!(300)).unwrap();
    let budgets = ledger.snapshot().budgets;
    assert_eq!(budgets, vec![Budget::new("food".into(), dec!(300))]);
}

#[test]
fn test_duplicate_category_leaves_budgets_unchanged() {
    let mut ledger = ledger();
    ledger.set_budget("food", dec!(300)).unwrap();
    ledger.set_budget("rent", dec!(800)).unwrap();
    ledger.add_expense("Lunch", dec!(40), "food", T).unwrap();
    let before = ledger.snapshot().budgets;

    let err = ledger.set_budget("food", dec!(999)).unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateCategory(ref c) if c == "food"));
    assert_eq!(ledger.snapshot().budgets, before);
}

#[test]
fn test_category_match_is_case_sensitive() {
    let mut ledger = ledger();
    ledger.set_budget("food", dec!(300)).unwrap();
    ledger.set_budget("Food", dec!(100)).unwrap();
    assert_eq!(ledger.snapshot().budgets.len(), 2);
}

#[test]
fn test_edit_budget_preserves_spent() {
    let mut ledger = ledger();
    ledger.set_budget("groceries", dec!(100)).unwrap();
    ledger.add_expense("Market", dec!(40), "groceries", T).unwrap();

    ledger.edit_budget_at(0, "food", dec!(80)).unwrap();

    let budget = &ledger.snapshot().budgets[0];
    assert_eq!(budget.category, "food");
    assert_eq!(budget.amount, dec!(80));
    assert_eq!(budget.remaining, dec!(40));
}

#[test]
fn test_edit_budget_rename_does_not_reattribute_expenses() {
    let mut ledger = ledger();
    ledger.set_budget("groceries", dec!(100)).unwrap();
    ledger.add_expense("Market", dec!(40), "groceries", T).unwrap();
    ledger.edit_budget_at(0, "food", dec!(100)).unwrap();

    assert_eq!(ledger.snapshot().expenses[0].category, "groceries");
    // New expenses follow the new name.
    ledger.add_expense("Lunch", dec!(10), "food", T).unwrap();
    assert_eq!(ledger.snapshot().budgets[0].remaining, dec!(50));
}

#[test]
fn test_edit_budget_invalid_input_is_noop() {
    let mut ledger = ledger();
    ledger.set_budget("food", dec!(100)).unwrap();
    let before = ledger.snapshot();

    assert!(ledger.edit_budget_at(0, "", dec!(50)).is_err());
    assert!(ledger.edit_budget_at(0, "food", dec!(-1)).is_err());
    assert_eq!(ledger.snapshot(), before);
}

#[test]
fn test_edit_budget_cannot_take_another_category() {
    let mut ledger = ledger();
    ledger.set_budget("food", dec!(100)).unwrap();
    ledger.set_budget("rent", dec!(800)).unwrap();

    let err = ledger.edit_budget_at(1, "food", dec!(800)).unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateCategory(_)));
    // Keeping its own name is fine.
    ledger.edit_budget_at(1, "rent", dec!(900)).unwrap();
    assert_eq!(ledger.snapshot().budgets[1].amount, dec!(900));
}

#[test]
fn test_edit_budget_out_of_range_fails_closed() {
    let mut ledger = ledger();
    ledger.set_budget("food", dec!(100)).unwrap();
    let err = ledger.edit_budget_at(3, "x", dec!(1)).unwrap_err();
    assert!(matches!(err, LedgerError::IndexOutOfRange { index: 3, len: 1 }));
}

#[test]
fn test_delete_budget_orphans_expenses() {
    let mut ledger = ledger();
    ledger.set_budget("food", dec!(300)).unwrap();
    ledger.add_expense("Lunch", dec!(50), "food", T).unwrap();

    let removed = ledger.delete_budget_at(0).unwrap();
    assert_eq!(removed.category, "food");

    let snapshot = ledger.snapshot();
    assert!(snapshot.budgets.is_empty());
    assert_eq!(snapshot.expenses[0].category, "food");
    // Orphaned expense is neither budgeted nor uncategorized.
    let summary = ledger.summary();
    assert_eq!(summary.total_budgeted_expenses, Decimal::ZERO);
    assert_eq!(summary.total_uncategorized_expenses, Decimal::ZERO);
}

#[test]
fn test_delete_budget_out_of_range() {
    let mut ledger = ledger();
    assert!(matches!(
        ledger.delete_budget_at(0),
        Err(LedgerError::IndexOutOfRange { index: 0, len: 0 })
    ));
}

#[test]
fn test_budget_progress_fraction() {
    let mut ledger = ledger();
    ledger.set_budget("food", dec!(200)).unwrap();
    ledger.set_budget("zero", Decimal::ZERO).unwrap();
    ledger.add_expense("Dinner", dec!(250), "food", T).unwrap();

    let progress = ledger.budgets_with_progress();
    assert_eq!(progress[0].remaining, dec!(-50));
    assert_eq!(progress[0].fraction_remaining, Some(dec!(-0.25)));
    assert_eq!(progress[1].fraction_remaining, None);
}

// ── Expenses ──────────────────────────────────────────────────

#[test]
fn test_categorized_expense_charges_budget() {
    let mut ledger = ledger();
    ledger.set_budget("groceries", dec!(500)).unwrap();
    ledger.add_expense("Market", dec!(123.45), "groceries", T).unwrap();
    assert_eq!(ledger.snapshot().budgets[0].remaining, dec!(376.55));
}

#[test]
fn test_uncategorized_expense_never_touches_budgets() {
    let mut ledger = ledger();
    ledger.set_budget("groceries", dec!(500)).unwrap();
    ledger.set_budget(UNCATEGORIZED, dec!(100)).unwrap();
    ledger
        .add_expense("Misc", dec!(20), UNCATEGORIZED, T)
        .unwrap();

    let budgets = ledger.snapshot().budgets;
    assert_eq!(budgets[0].remaining, dec!(500));
    assert_eq!(budgets[1].remaining, dec!(100));
}

#[test]
fn test_unknown_category_touches_no_budget() {
    let mut ledger = ledger();
    ledger.set_budget("food", dec!(100)).unwrap();
    ledger.add_expense("Taxi", dec!(15), "transport", T).unwrap();

    let snapshot = ledger.snapshot();
    assert_eq!(snapshot.budgets[0].remaining, dec!(100));
    assert_eq!(snapshot.expenses[0].category, "transport");
}

#[test]
fn test_expense_can_overspend() {
    let mut ledger = ledger();
    ledger.set_budget("fun", dec!(10)).unwrap();
    ledger.add_expense("Concert", dec!(75), "fun", T).unwrap();
    assert_eq!(ledger.snapshot().budgets[0].remaining, dec!(-65));
}

// ── Amount bounds ─────────────────────────────────────────────

#[test]
fn test_amount_cap_is_inclusive() {
    let mut ledger = ledger();
    ledger.add_income("Windfall", validate::MAX_AMOUNT, T).unwrap();
    for amount in [validate::MAX_AMOUNT + dec!(0.01), Decimal::MAX] {
        let err = ledger.add_income("Too much", amount, T).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        let err = ledger.set_budget("huge", amount).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
    assert_eq!(ledger.history().len(), 1);
    assert!(ledger.snapshot().budgets.is_empty());
}

#[test]
fn test_repeated_max_expenses_stay_in_range() {
    let mut ledger = ledger();
    ledger.set_budget("food", Decimal::ZERO).unwrap();
    for _ in 0..3 {
        ledger
            .add_expense("Feast", validate::MAX_AMOUNT, "food", T)
            .unwrap();
    }
    let summary = ledger.summary();
    assert_eq!(summary.total_budgeted_expenses, validate::MAX_AMOUNT * dec!(3));
    assert_eq!(summary.remaining_balance, -(validate::MAX_AMOUNT * dec!(3)));
}

fn ledger_with_saved(saved: Snapshot) -> Ledger<FlakyStore> {
    Ledger::open(FlakyStore {
        saved,
        ..FlakyStore::default()
    })
    .unwrap()
}

#[test]
fn test_budget_overflow_from_stored_data_rolls_back() {
    let mut ledger = ledger_with_saved(Snapshot {
        budgets: vec![Budget {
            category: "food".into(),
            amount: Decimal::ZERO,
            remaining: Decimal::MIN,
        }],
        ..Snapshot::default()
    });

    let err = ledger.add_expense("Snack", dec!(1), "food", T).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert!(ledger.history().is_empty());
    assert_eq!(ledger.snapshot().budgets[0].remaining, Decimal::MIN);
    assert_eq!(ledger.store_mut().saves, 0);
}

#[test]
fn test_totals_over_oversized_stored_amounts_saturate() {
    let income = Income::new("Legacy".into(), Decimal::MAX, T.into());
    let ledger = ledger_with_saved(Snapshot {
        incomes: vec![income.clone(), income],
        budgets: vec![Budget::new("food".into(), Decimal::MAX)],
        expenses: vec![
            Expense::new("a".into(), Decimal::MAX, "food".into(), T.into()),
            Expense::new("b".into(), Decimal::MAX, "food".into(), T.into()),
        ],
    });

    let summary = ledger.summary();
    assert_eq!(summary.total_income, Decimal::MAX);
    assert_eq!(summary.remaining_balance, Decimal::MAX);

    let drift = &ledger.budget_drift()[0];
    assert_eq!(drift.recorded, Decimal::MAX);
    assert_eq!(drift.difference(), Decimal::MIN);
}

// ── History ───────────────────────────────────────────────────

fn two_incomes_three_expenses() -> Ledger<Database> {
    let mut ledger = ledger();
    ledger.add_expense("E0", dec!(1), UNCATEGORIZED, T).unwrap();
    ledger.add_income("I0", dec!(100), T).unwrap();
    ledger.add_expense("E1", dec!(2), UNCATEGORIZED, T).unwrap();
    ledger.add_income("I1", dec!(200), T).unwrap();
    ledger.add_expense("E2", dec!(3), UNCATEGORIZED, T).unwrap();
    ledger
}

#[test]
fn test_history_index_resolution() {
    let ledger = two_incomes_three_expenses();
    assert_eq!(ledger.resolve_history_index(0).unwrap(), HistoryLocation::Income(0));
    assert_eq!(ledger.resolve_history_index(1).unwrap(), HistoryLocation::Income(1));
    assert_eq!(ledger.resolve_history_index(2).unwrap(), HistoryLocation::Expense(0));
    assert_eq!(ledger.resolve_history_index(3).unwrap(), HistoryLocation::Expense(1));
    assert_eq!(ledger.resolve_history_index(4).unwrap(), HistoryLocation::Expense(2));
    assert!(matches!(
        ledger.resolve_history_index(5),
        Err(LedgerError::IndexOutOfRange { index: 5, len: 5 })
    ));
}

#[test]
fn test_history_lists_incomes_before_expenses() {
    let ledger = two_incomes_three_expenses();
    let history = ledger.history();
    let labels: Vec<(usize, &str, EntryKind)> = history
        .iter()
        .map(|e| (e.index, e.description.as_str(), e.kind))
        .collect();
    assert_eq!(
        labels,
        vec![
            (0, "I0", EntryKind::Income),
            (1, "I1", EntryKind::Income),
            (2, "E0", EntryKind::Expense),
            (3, "E1", EntryKind::Expense),
            (4, "E2", EntryKind::Expense),
        ]
    );
    assert_eq!(history[0].category, None);
    assert_eq!(history[2].category.as_deref(), Some(UNCATEGORIZED));
}

#[test]
fn test_delete_income_shifts_indices_and_spares_expenses() {
    let mut ledger = two_incomes_three_expenses();
    let expenses_before = ledger.snapshot().expenses;
    let shifted_id = ledger.entry_id_at(2).unwrap();

    assert_eq!(ledger.delete_history_entry(0).unwrap(), EntryKind::Income);

    let snapshot = ledger.snapshot();
    assert_eq!(snapshot.incomes.len(), 1);
    assert_eq!(snapshot.incomes[0].description, "I1");
    assert_eq!(snapshot.expenses, expenses_before);
    assert_eq!(ledger.entry_id_at(1).unwrap(), shifted_id);
    assert!(ledger.resolve_history_index(4).is_err());
}

#[test]
fn test_delete_history_entry_out_of_range_is_noop() {
    let mut ledger = two_incomes_three_expenses();
    let before = ledger.snapshot();
    assert!(matches!(
        ledger.delete_history_entry(9),
        Err(LedgerError::IndexOutOfRange { .. })
    ));
    assert_eq!(ledger.snapshot(), before);
}

#[test]
fn test_edit_income_ignores_category() {
    let mut ledger = two_incomes_three_expenses();
    let kind = ledger
        .edit_history_entry(1, "Salary", dec!(250), Some("food"))
        .unwrap();
    assert_eq!(kind, EntryKind::Income);

    let income = &ledger.snapshot().incomes[1];
    assert_eq!(income.description, "Salary");
    assert_eq!(income.amount, dec!(250));
}

#[test]
fn test_edit_expense_updates_all_fields_but_not_budget() {
    let mut ledger = ledger();
    ledger.set_budget("food", dec!(300)).unwrap();
    ledger.add_expense("Lunch", dec!(50), "food", T).unwrap();

    ledger
        .edit_history_entry(0, "Dinner", dec!(80), Some(UNCATEGORIZED))
        .unwrap();

    let snapshot = ledger.snapshot();
    assert_eq!(
        snapshot.expenses[0],
        Expense::new("Dinner".into(), dec!(80), UNCATEGORIZED.into(), T.into())
    );
    assert_eq!(snapshot.budgets[0].remaining, dec!(250));
}

#[test]
fn test_edit_expense_without_category_keeps_it() {
    let mut ledger = ledger();
    ledger.add_expense("Lunch", dec!(50), "food", T).unwrap();
    ledger.edit_history_entry(0, "Brunch", dec!(55), None).unwrap();
    assert_eq!(ledger.snapshot().expenses[0].category, "food");
}

#[test]
fn test_edit_entry_validation_commits_nothing() {
    let mut ledger = two_incomes_three_expenses();
    let before = ledger.snapshot();
    assert!(ledger.edit_history_entry(3, "", dec!(1), None).is_err());
    assert!(ledger
        .edit_history_entry(3, "E1", dec!(1), Some("  "))
        .is_err());
    assert_eq!(ledger.snapshot(), before);
}

#[test]
fn test_delete_expense_does_not_restore_budget() {
    let mut ledger = ledger();
    ledger.set_budget("food", dec!(300)).unwrap();
    ledger.add_expense("Lunch", dec!(50), "food", T).unwrap();

    assert_eq!(ledger.delete_history_entry(0).unwrap(), EntryKind::Expense);
    assert_eq!(ledger.snapshot().budgets[0].remaining, dec!(250));
    assert_eq!(ledger.summary().total_budgeted_expenses, dec!(50));
}

// ── Ids ───────────────────────────────────────────────────────

#[test]
fn test_ids_survive_other_deletions() {
    let mut ledger = two_incomes_three_expenses();
    let target = ledger.entry_id_at(4).unwrap();

    ledger.delete_history_entry(0).unwrap();
    ledger.delete_history_entry(1).unwrap();

    ledger.edit_entry(target, "Last", dec!(9), None).unwrap();
    let history = ledger.history();
    let edited = history.iter().find(|e| e.id == target).unwrap();
    assert_eq!(edited.description, "Last");
    assert_eq!(edited.index, 2);
}

#[test]
fn test_stale_id_fails_closed() {
    let mut ledger = two_incomes_three_expenses();
    let id = ledger.entry_id_at(0).unwrap();
    ledger.delete_entry(id).unwrap();
    let before = ledger.snapshot();

    assert!(matches!(
        ledger.delete_entry(id),
        Err(LedgerError::UnknownRecord(stale)) if stale == id
    ));
    assert_eq!(ledger.snapshot(), before);
}

#[test]
fn test_ids_are_unique_across_collections() {
    let mut ledger = ledger();
    let a = ledger.add_income("I", dec!(1), T).unwrap();
    let b = ledger.set_budget("food", dec!(1)).unwrap();
    let c = ledger.add_expense("E", dec!(1), "food", T).unwrap();
    assert!(a != b && b != c && a != c);
    assert!(matches!(
        ledger.delete_entry(b),
        Err(LedgerError::UnknownRecord(_))
    ));
}

// ── Summary ───────────────────────────────────────────────────

#[test]
fn test_summary_scenario() {
    let mut ledger = ledger();
    ledger.add_income("Salary", dec!(1000), T).unwrap();
    ledger.set_budget("food", dec!(300)).unwrap();
    ledger.add_expense("Lunch", dec!(50), "food", T).unwrap();
    ledger.add_expense("Misc", dec!(20), UNCATEGORIZED, T).unwrap();

    assert_eq!(
        ledger.summary(),
        Summary {
            total_income: dec!(1000),
            total_budgeted_expenses: dec!(50),
            total_uncategorized_expenses: dec!(20),
            remaining_balance: dec!(930),
        }
    );
}

#[test]
fn test_summary_follows_budget_depletion_after_edit() {
    let mut ledger = ledger();
    ledger.set_budget("food", dec!(300)).unwrap();
    ledger.add_expense("Lunch", dec!(50), "food", T).unwrap();
    ledger.edit_history_entry(0, "Lunch", dec!(5), None).unwrap();

    let summary = ledger.summary();
    assert_eq!(summary.total_budgeted_expenses, dec!(50));
    assert_eq!(summary.remaining_balance, dec!(-50));
}

// ── Drift ─────────────────────────────────────────────────────

#[test]
fn test_budget_drift_consistent_after_adds() {
    let mut ledger = ledger();
    ledger.set_budget("food", dec!(300)).unwrap();
    ledger.add_expense("Lunch", dec!(50), "food", T).unwrap();
    ledger.add_expense("Dinner", dec!(30), "food", T).unwrap();

    let drift = ledger.budget_drift();
    assert_eq!(drift.len(), 1);
    assert!(drift[0].is_consistent());
    assert_eq!(drift[0].recorded, dec!(80));
}

#[test]
fn test_budget_drift_after_edit_and_delete() {
    let mut ledger = ledger();
    ledger.set_budget("food", dec!(300)).unwrap();
    ledger.add_expense("Lunch", dec!(50), "food", T).unwrap();
    ledger.add_expense("Dinner", dec!(30), "food", T).unwrap();

    ledger.edit_history_entry(0, "Lunch", dec!(45), None).unwrap();
    ledger.delete_history_entry(1).unwrap();

    let drift = &ledger.budget_drift()[0];
    assert!(!drift.is_consistent());
    assert_eq!(drift.depleted, dec!(80));
    assert_eq!(drift.recorded, dec!(45));
    assert_eq!(drift.difference(), dec!(35));
}

// ── Categories ────────────────────────────────────────────────

#[test]
fn test_expense_categories_start_with_uncategorized() {
    let mut ledger = ledger();
    assert_eq!(ledger.expense_categories(), vec![UNCATEGORIZED.to_string()]);
    ledger.set_budget("food", dec!(1)).unwrap();
    ledger.set_budget("rent", dec!(1)).unwrap();
    assert_eq!(
        ledger.expense_categories(),
        vec![UNCATEGORIZED.to_string(), "food".into(), "rent".into()]
    );
}

#[test]
fn test_known_categories() {
    let mut ledger = ledger();
    ledger.set_budget("food", dec!(1)).unwrap();
    assert!(ledger.is_known_category(UNCATEGORIZED));
    assert!(ledger.is_known_category("food"));
    assert!(!ledger.is_known_category("Food"));
    assert!(!ledger.is_known_category("rent"));
}

// ── Persistence ───────────────────────────────────────────────

#[test]
fn test_every_mutation_is_saved() {
    let mut ledger = flaky_ledger();
    ledger.add_income("Salary", dec!(1000), T).unwrap();
    ledger.set_budget("food", dec!(300)).unwrap();
    ledger.add_expense("Lunch", dec!(50), "food", T).unwrap();
    ledger.edit_budget_at(0, "food", dec!(350)).unwrap();
    ledger.delete_history_entry(0).unwrap();

    let snapshot = ledger.snapshot();
    let store = ledger.store_mut();
    assert_eq!(store.saves, 5);
    assert_eq!(store.saved, snapshot);
}

#[test]
fn test_rejected_mutation_is_not_saved() {
    let mut ledger = flaky_ledger();
    ledger.set_budget("food", dec!(300)).unwrap();
    let _ = ledger.set_budget("food", dec!(1));
    assert_eq!(ledger.store_mut().saves, 1);
}

#[test]
fn test_failed_save_rolls_back() {
    let mut ledger = flaky_ledger();
    ledger.set_budget("food", dec!(300)).unwrap();
    let before = ledger.snapshot();

    ledger.store_mut().fail_next = true;
    let err = ledger.add_expense("Lunch", dec!(50), "food", T).unwrap_err();

    assert!(matches!(err, LedgerError::Persistence(_)));
    assert_eq!(ledger.snapshot(), before);
    assert_eq!(ledger.store_mut().saved, before);
}

#[test]
fn test_failed_delete_keeps_record_addressable() {
    let mut ledger = flaky_ledger();
    let id = ledger.add_income("Salary", dec!(1000), T).unwrap();

    ledger.store_mut().fail_next = true;
    assert!(ledger.delete_entry(id).is_err());

    ledger.edit_entry(id, "Wages", dec!(900), None).unwrap();
    assert_eq!(ledger.snapshot().incomes[0].description, "Wages");
}

#[test]
fn test_reopen_restores_working_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fintrack.db");

    let expected = {
        let mut ledger = Ledger::open(Database::open(&path).unwrap()).unwrap();
        ledger.add_income("Salary", dec!(1000), T).unwrap();
        ledger.set_budget("food", dec!(300)).unwrap();
        ledger.add_expense("Lunch", dec!(50), "food", T).unwrap();
        ledger.add_expense("Misc", dec!(20), UNCATEGORIZED, T).unwrap();
        ledger.snapshot()
    };

    let reopened = Ledger::open(Database::open(&path).unwrap()).unwrap();
    assert_eq!(reopened.snapshot(), expected);
    assert_eq!(reopened.summary().remaining_balance, dec!(930));
}
