use rust_decimal::Decimal;

/// Stable handle for a tracked record. Unique across incomes, budgets and
/// expenses for the lifetime of a ledger, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(pub u64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the merged history: incomes first, then expenses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: RecordId,
    /// Position in `incomes ++ expenses`.
    pub index: usize,
    pub kind: EntryKind,
    pub description: String,
    pub amount: Decimal,
    /// `None` for incomes.
    pub category: Option<String>,
    pub timestamp: String,
}

impl HistoryEntry {
    pub fn is_income(&self) -> bool {
        self.kind == EntryKind::Income
    }
}

/// Where a history index points in the two underlying collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryLocation {
    Income(usize),
    Expense(usize),
}

/// Build a timestamp for a new record from the local clock.
pub fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
