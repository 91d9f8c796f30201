use crate::ledger::{BudgetProgress, Ledger, Summary};
use crate::models::{HistoryEntry, RecordId};
use crate::store::Database;

pub(crate) type AppLedger = Ledger<Database>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Dashboard,
    Budgets,
    History,
}

impl Screen {
    pub(crate) fn all() -> &'static [Screen] {
        &[Self::Dashboard, Self::Budgets, Self::History]
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dashboard => write!(f, "Dashboard"),
            Self::Budgets => write!(f, "Budgets"),
            Self::History => write!(f, "History"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InputMode {
    Normal,
    Command,
    Confirm,
}

impl std::fmt::Display for InputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Command => write!(f, "COMMAND"),
            Self::Confirm => write!(f, "CONFIRM"),
        }
    }
}

/// Pending action that requires user confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingAction {
    DeleteEntry { id: RecordId, description: String },
    DeleteBudget { id: RecordId, category: String },
}

pub(crate) struct App {
    pub(crate) running: bool,
    pub(crate) screen: Screen,
    pub(crate) input_mode: InputMode,
    pub(crate) command_input: String,
    pub(crate) status_message: String,
    pub(crate) show_help: bool,
    pub(crate) currency: String,

    // Dashboard
    pub(crate) summary: Summary,

    // Budgets
    pub(crate) budgets: Vec<BudgetProgress>,
    pub(crate) budget_index: usize,
    pub(crate) budget_scroll: usize,

    // History
    pub(crate) history: Vec<HistoryEntry>,
    pub(crate) history_index: usize,
    pub(crate) history_scroll: usize,

    /// Expense category choices, `uncategorized` first.
    pub(crate) categories: Vec<String>,

    // Confirmation
    pub(crate) pending_action: Option<PendingAction>,
    pub(crate) confirm_message: String,

    // Layout (updated each render frame)
    pub(crate) visible_rows: usize,
}

impl App {
    pub(crate) fn new(currency: String) -> Self {
        Self {
            running: true,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            status_message: String::new(),
            show_help: false,
            currency,

            summary: Summary::default(),

            budgets: Vec::new(),
            budget_index: 0,
            budget_scroll: 0,

            history: Vec::new(),
            history_index: 0,
            history_scroll: 0,

            categories: Vec::new(),

            pending_action: None,
            confirm_message: String::new(),

            visible_rows: 20,
        }
    }

    /// Re-read every derived view from the ledger and keep cursors in range.
    pub(crate) fn refresh(&mut self, ledger: &AppLedger) {
        self.summary = ledger.summary();
        self.budgets = ledger.budgets_with_progress();
        self.history = ledger.history();
        self.categories = ledger.expense_categories();

        clamp_cursor(&mut self.budget_index, &mut self.budget_scroll, self.budgets.len());
        clamp_cursor(&mut self.history_index, &mut self.history_scroll, self.history.len());
    }

    pub(crate) fn selected_entry(&self) -> Option<&HistoryEntry> {
        self.history.get(self.history_index)
    }

    pub(crate) fn selected_budget(&self) -> Option<&BudgetProgress> {
        self.budgets.get(self.budget_index)
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    pub(crate) fn ask_confirm(&mut self, message: String, action: PendingAction) {
        self.confirm_message = message;
        self.pending_action = Some(action);
        self.input_mode = InputMode::Confirm;
    }

    /// Open the command line with `text` already typed.
    pub(crate) fn prefill_command(&mut self, text: String) {
        self.command_input = text;
        self.input_mode = InputMode::Command;
    }
}

fn clamp_cursor(index: &mut usize, scroll: &mut usize, len: usize) {
    if *index >= len {
        *index = len.saturating_sub(1);
    }
    if *scroll > *index {
        *scroll = *index;
    }
}
