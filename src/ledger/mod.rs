//! Ledger state manager.
//!
//! Owns the income, budget and expense collections, keeps budget `remaining`
//! in step with expenses as they are added, and writes a full snapshot to the
//! store after every successful mutation. A mutation whose save fails is
//! rolled back, so memory and storage never disagree.
//!
//! Records are addressed by [`RecordId`]. The `*_at` methods accept the
//! positional indexes shown by the presentation layers instead and resolve
//! them to ids first.

mod error;
pub(crate) mod validate;

use anyhow::Result;
use rust_decimal::Decimal;

use crate::models::{
    Budget, EntryKind, Expense, HistoryEntry, HistoryLocation, Income, RecordId, UNCATEGORIZED,
};
use crate::store::{Snapshot, Store};

pub(crate) use error::LedgerError;

/// Totals shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) total_income: Decimal,
    /// Derived from budget depletion, not from expense records.
    pub(crate) total_budgeted_expenses: Decimal,
    pub(crate) total_uncategorized_expenses: Decimal,
    pub(crate) remaining_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BudgetProgress {
    pub(crate) id: RecordId,
    pub(crate) category: String,
    pub(crate) amount: Decimal,
    pub(crate) remaining: Decimal,
    /// `remaining / amount`; `None` when `amount` is zero. Not clamped.
    pub(crate) fraction_remaining: Option<Decimal>,
}

/// Budget depletion compared with the expenses actually recorded against the
/// category. The two drift apart when expenses are edited or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BudgetDrift {
    pub(crate) id: RecordId,
    pub(crate) category: String,
    pub(crate) depleted: Decimal,
    pub(crate) recorded: Decimal,
}

impl BudgetDrift {
    pub(crate) fn difference(&self) -> Decimal {
        self.depleted.saturating_sub(self.recorded)
    }

    pub(crate) fn is_consistent(&self) -> bool {
        self.depleted == self.recorded
    }
}

#[derive(Debug, Clone)]
struct Tracked<T> {
    id: RecordId,
    record: T,
}

#[derive(Debug, Clone, Default)]
struct State {
    incomes: Vec<Tracked<Income>>,
    budgets: Vec<Tracked<Budget>>,
    expenses: Vec<Tracked<Expense>>,
    next_id: u64,
}

impl State {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut state = Self::default();
        for record in snapshot.incomes {
            let id = state.issue_id();
            state.incomes.push(Tracked { id, record });
        }
        for record in snapshot.budgets {
            let id = state.issue_id();
            state.budgets.push(Tracked { id, record });
        }
        for record in snapshot.expenses {
            let id = state.issue_id();
            state.expenses.push(Tracked { id, record });
        }
        state
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            incomes: self.incomes.iter().map(|t| t.record.clone()).collect(),
            budgets: self.budgets.iter().map(|t| t.record.clone()).collect(),
            expenses: self.expenses.iter().map(|t| t.record.clone()).collect(),
        }
    }

    fn issue_id(&mut self) -> RecordId {
        self.next_id += 1;
        RecordId(self.next_id)
    }

    fn history_len(&self) -> usize {
        self.incomes.len() + self.expenses.len()
    }

    fn budget_position(&self, id: RecordId) -> Result<usize, LedgerError> {
        self.budgets
            .iter()
            .position(|t| t.id == id)
            .ok_or(LedgerError::UnknownRecord(id))
    }

    fn locate_entry(&self, id: RecordId) -> Result<HistoryLocation, LedgerError> {
        if let Some(pos) = self.incomes.iter().position(|t| t.id == id) {
            return Ok(HistoryLocation::Income(pos));
        }
        self.expenses
            .iter()
            .position(|t| t.id == id)
            .map(HistoryLocation::Expense)
            .ok_or(LedgerError::UnknownRecord(id))
    }

    fn has_category(&self, category: &str, except: Option<RecordId>) -> bool {
        self.budgets
            .iter()
            .any(|t| t.record.category == category && Some(t.id) != except)
    }
}

pub(crate) struct Ledger<S: Store> {
    store: S,
    state: State,
}

impl<S: Store> Ledger<S> {
    /// Load the working set from `store`.
    pub(crate) fn open(store: S) -> Result<Self> {
        let snapshot = store.load()?;
        let state = State::from_snapshot(snapshot);
        tracing::info!(
            incomes = state.incomes.len(),
            budgets = state.budgets.len(),
            expenses = state.expenses.len(),
            "ledger opened"
        );
        Ok(Self { store, state })
    }

    #[cfg(test)]
    pub(crate) fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Apply `op` to the working set and persist the result. Any failure,
    /// in `op` or in the save, restores the previous state.
    fn commit<T>(
        &mut self,
        action: &'static str,
        op: impl FnOnce(&mut State) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let before = self.state.clone();

        let value = match op(&mut self.state) {
            Ok(value) => value,
            Err(err) => {
                self.state = before;
                tracing::warn!(action, error = %err, "rejected");
                return Err(err);
            }
        };

        if let Err(err) = self.store.save(&self.state.snapshot()) {
            self.state = before;
            tracing::error!(action, error = %format!("{err:#}"), "save failed, change rolled back");
            return Err(LedgerError::Persistence(err));
        }

        Ok(value)
    }

    // ── Incomes and expenses ──────────────────────────────────

    pub(crate) fn add_income(
        &mut self,
        description: &str,
        amount: Decimal,
        timestamp: &str,
    ) -> Result<RecordId, LedgerError> {
        let id = self.commit("add_income", |state| {
            let description = validate::require_text("description", description)?;
            validate::check_amount(amount)?;
            let id = state.issue_id();
            state.incomes.push(Tracked {
                id,
                record: Income::new(description.to_string(), amount, timestamp.to_string()),
            });
            Ok(id)
        })?;
        tracing::info!(%id, %amount, "income added");
        Ok(id)
    }

    /// Record an expense. A category naming an existing budget charges that
    /// budget; `uncategorized` or an unknown category touches no budget.
    pub(crate) fn add_expense(
        &mut self,
        description: &str,
        amount: Decimal,
        category: &str,
        timestamp: &str,
    ) -> Result<RecordId, LedgerError> {
        let id = self.commit("add_expense", |state| {
            let description = validate::require_text("description", description)?;
            let category = validate::require_text("category", category)?;
            validate::check_amount(amount)?;

            if category != UNCATEGORIZED {
                if let Some(budget) = state
                    .budgets
                    .iter_mut()
                    .find(|t| t.record.category == category)
                {
                    budget.record.charge(amount).ok_or_else(|| {
                        LedgerError::Validation(format!(
                            "expense would overflow the '{category}' budget"
                        ))
                    })?;
                }
            }

            let id = state.issue_id();
            state.expenses.push(Tracked {
                id,
                record: Expense::new(
                    description.to_string(),
                    amount,
                    category.to_string(),
                    timestamp.to_string(),
                ),
            });
            Ok(id)
        })?;
        tracing::info!(%id, %amount, category, "expense added");
        Ok(id)
    }

    /// Update an income or expense in place. `category` is ignored for
    /// incomes and keeps the current value when `None`. Budgets are not
    /// adjusted.
    pub(crate) fn edit_entry(
        &mut self,
        id: RecordId,
        description: &str,
        amount: Decimal,
        category: Option<&str>,
    ) -> Result<EntryKind, LedgerError> {
        let kind = self.commit("edit_entry", |state| {
            let description = validate::require_text("description", description)?;
            validate::check_amount(amount)?;

            match state.locate_entry(id)? {
                HistoryLocation::Income(pos) => {
                    let income = &mut state.incomes[pos].record;
                    income.description = description.to_string();
                    income.amount = amount;
                    Ok(EntryKind::Income)
                }
                HistoryLocation::Expense(pos) => {
                    let category = category
                        .map(|c| validate::require_text("category", c))
                        .transpose()?;
                    let expense = &mut state.expenses[pos].record;
                    expense.description = description.to_string();
                    expense.amount = amount;
                    if let Some(category) = category {
                        expense.category = category.to_string();
                    }
                    Ok(EntryKind::Expense)
                }
            }
        })?;
        tracing::info!(%id, %kind, "entry edited");
        Ok(kind)
    }

    /// Remove an income or expense. Budgets are not restored.
    pub(crate) fn delete_entry(&mut self, id: RecordId) -> Result<EntryKind, LedgerError> {
        let kind = self.commit("delete_entry", |state| match state.locate_entry(id)? {
            HistoryLocation::Income(pos) => {
                state.incomes.remove(pos);
                Ok(EntryKind::Income)
            }
            HistoryLocation::Expense(pos) => {
                state.expenses.remove(pos);
                Ok(EntryKind::Expense)
            }
        })?;
        tracing::info!(%id, %kind, "entry deleted");
        Ok(kind)
    }

    pub(crate) fn edit_history_entry(
        &mut self,
        index: usize,
        description: &str,
        amount: Decimal,
        category: Option<&str>,
    ) -> Result<EntryKind, LedgerError> {
        let id = self.entry_id_at(index)?;
        self.edit_entry(id, description, amount, category)
    }

    pub(crate) fn delete_history_entry(&mut self, index: usize) -> Result<EntryKind, LedgerError> {
        let id = self.entry_id_at(index)?;
        self.delete_entry(id)
    }

    // ── Budgets ───────────────────────────────────────────────

    pub(crate) fn set_budget(
        &mut self,
        category: &str,
        amount: Decimal,
    ) -> Result<RecordId, LedgerError> {
        let id = self.commit("set_budget", |state| {
            let category = validate::require_text("category", category)?;
            validate::check_amount(amount)?;
            if state.has_category(category, None) {
                return Err(LedgerError::DuplicateCategory(category.to_string()));
            }
            let id = state.issue_id();
            state.budgets.push(Tracked {
                id,
                record: Budget::new(category.to_string(), amount),
            });
            Ok(id)
        })?;
        tracing::info!(%id, category, %amount, "budget set");
        Ok(id)
    }

    /// Rename and reallocate a budget, preserving the amount already spent.
    pub(crate) fn edit_budget(
        &mut self,
        id: RecordId,
        category: &str,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        self.commit("edit_budget", |state| {
            let category = validate::require_text("category", category)?;
            validate::check_amount(amount)?;
            let pos = state.budget_position(id)?;
            if state.has_category(category, Some(id)) {
                return Err(LedgerError::DuplicateCategory(category.to_string()));
            }
            state.budgets[pos]
                .record
                .reallocate(category.to_string(), amount)
                .ok_or_else(|| {
                    LedgerError::Validation(format!(
                        "reallocating '{category}' to {amount} is out of range"
                    ))
                })
        })?;
        tracing::info!(%id, category, %amount, "budget edited");
        Ok(())
    }

    /// Remove a budget. Expenses recorded against it keep their category.
    pub(crate) fn delete_budget(&mut self, id: RecordId) -> Result<Budget, LedgerError> {
        let budget = self.commit("delete_budget", |state| {
            let pos = state.budget_position(id)?;
            Ok(state.budgets.remove(pos).record)
        })?;
        tracing::info!(%id, category = %budget.category, "budget deleted");
        Ok(budget)
    }

    pub(crate) fn edit_budget_at(
        &mut self,
        index: usize,
        category: &str,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        let id = self.budget_id_at(index)?;
        self.edit_budget(id, category, amount)
    }

    pub(crate) fn delete_budget_at(&mut self, index: usize) -> Result<Budget, LedgerError> {
        let id = self.budget_id_at(index)?;
        self.delete_budget(id)
    }

    // ── Index resolution ──────────────────────────────────────

    /// Map a position in `incomes ++ expenses` to its collection and offset.
    pub(crate) fn resolve_history_index(
        &self,
        index: usize,
    ) -> Result<HistoryLocation, LedgerError> {
        let incomes = self.state.incomes.len();
        if index < incomes {
            Ok(HistoryLocation::Income(index))
        } else if index < self.state.history_len() {
            Ok(HistoryLocation::Expense(index - incomes))
        } else {
            Err(LedgerError::IndexOutOfRange {
                index,
                len: self.state.history_len(),
            })
        }
    }

    pub(crate) fn entry_id_at(&self, index: usize) -> Result<RecordId, LedgerError> {
        Ok(match self.resolve_history_index(index)? {
            HistoryLocation::Income(pos) => self.state.incomes[pos].id,
            HistoryLocation::Expense(pos) => self.state.expenses[pos].id,
        })
    }

    pub(crate) fn budget_id_at(&self, index: usize) -> Result<RecordId, LedgerError> {
        self.state
            .budgets
            .get(index)
            .map(|t| t.id)
            .ok_or(LedgerError::IndexOutOfRange {
                index,
                len: self.state.budgets.len(),
            })
    }

    // ── Derived views ─────────────────────────────────────────

    /// Totals saturate at the `Decimal` bounds, so stored data written
    /// before amounts were capped still renders.
    pub(crate) fn summary(&self) -> Summary {
        let total_income = total(self.state.incomes.iter().map(|t| t.record.amount));
        let total_budgeted_expenses = total(self.state.budgets.iter().map(|t| t.record.spent()));
        let total_uncategorized_expenses = total(
            self.state
                .expenses
                .iter()
                .filter(|t| t.record.is_uncategorized())
                .map(|t| t.record.amount),
        );

        Summary {
            total_income,
            total_budgeted_expenses,
            total_uncategorized_expenses,
            remaining_balance: total_income
                .saturating_sub(total_budgeted_expenses)
                .saturating_sub(total_uncategorized_expenses),
        }
    }

    pub(crate) fn budgets_with_progress(&self) -> Vec<BudgetProgress> {
        self.state
            .budgets
            .iter()
            .map(|t| BudgetProgress {
                id: t.id,
                category: t.record.category.clone(),
                amount: t.record.amount,
                remaining: t.record.remaining,
                fraction_remaining: t.record.fraction_remaining(),
            })
            .collect()
    }

    /// Incomes then expenses, each in insertion order.
    pub(crate) fn history(&self) -> Vec<HistoryEntry> {
        let incomes = self.state.incomes.iter().map(|t| HistoryEntry {
            id: t.id,
            index: 0,
            kind: EntryKind::Income,
            description: t.record.description.clone(),
            amount: t.record.amount,
            category: None,
            timestamp: t.record.timestamp.clone(),
        });
        let expenses = self.state.expenses.iter().map(|t| HistoryEntry {
            id: t.id,
            index: 0,
            kind: EntryKind::Expense,
            description: t.record.description.clone(),
            amount: t.record.amount,
            category: Some(t.record.category.clone()),
            timestamp: t.record.timestamp.clone(),
        });

        incomes
            .chain(expenses)
            .enumerate()
            .map(|(index, entry)| HistoryEntry { index, ..entry })
            .collect()
    }

    /// Choices for an expense's category: `uncategorized` first, then every
    /// budget category.
    pub(crate) fn expense_categories(&self) -> Vec<String> {
        std::iter::once(UNCATEGORIZED.to_string())
            .chain(self.state.budgets.iter().map(|t| t.record.category.clone()))
            .collect()
    }

    /// Whether `category` is one of [`Self::expense_categories`].
    pub(crate) fn is_known_category(&self, category: &str) -> bool {
        category == UNCATEGORIZED || self.state.has_category(category, None)
    }

    pub(crate) fn budget_drift(&self) -> Vec<BudgetDrift> {
        self.state
            .budgets
            .iter()
            .map(|t| {
                let recorded = total(
                    self.state
                        .expenses
                        .iter()
                        .filter(|e| e.record.category == t.record.category)
                        .map(|e| e.record.amount),
                );
                BudgetDrift {
                    id: t.id,
                    category: t.record.category.clone(),
                    depleted: t.record.spent(),
                    recorded,
                }
            })
            .collect()
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }
}

fn total(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, Decimal::saturating_add)
}

#[cfg(test)]
mod tests;
