mod budget;
mod expense;
mod history;
mod income;

pub use budget::Budget;
pub use expense::{Expense, UNCATEGORIZED};
pub use history::{now_timestamp, EntryKind, HistoryEntry, HistoryLocation, RecordId};
pub use income::Income;
