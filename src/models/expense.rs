use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Category for expenses that are not attributed to any budget.
pub const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub description: String,
    pub amount: Decimal,
    pub category: String,
    pub timestamp: String,
}

impl Expense {
    pub fn new(description: String, amount: Decimal, category: String, timestamp: String) -> Self {
        Self {
            description,
            amount,
            category,
            timestamp,
        }
    }

    pub fn is_uncategorized(&self) -> bool {
        self.category == UNCATEGORIZED
    }
}
