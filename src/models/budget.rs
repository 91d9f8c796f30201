use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub category: String,
    pub amount: Decimal,
    /// Allocation left after attributed expenses. Goes negative on overspend.
    pub remaining: Decimal,
}

impl Budget {
    pub fn new(category: String, amount: Decimal) -> Self {
        Self {
            category,
            amount,
            remaining: amount,
        }
    }

    /// Amount consumed by expenses recorded against this category.
    /// Saturates at the `Decimal` bounds.
    pub fn spent(&self) -> Decimal {
        self.amount.saturating_sub(self.remaining)
    }

    /// Replace category and allocation while keeping what was already spent.
    ///
    /// `spent` is taken from the values as they stood before this call, so
    /// `remaining` ends up as `new_amount - spent`. Returns `None` and leaves
    /// the budget untouched when that does not fit in a `Decimal`.
    pub fn reallocate(&mut self, category: String, amount: Decimal) -> Option<()> {
        let spent = self.amount.checked_sub(self.remaining)?;
        let remaining = amount.checked_sub(spent)?;
        self.category = category;
        self.amount = amount;
        self.remaining = remaining;
        Some(())
    }

    /// Deduct `amount`, returning the new `remaining`. `None` on overflow,
    /// with the budget unchanged.
    pub fn charge(&mut self, amount: Decimal) -> Option<Decimal> {
        self.remaining = self.remaining.checked_sub(amount)?;
        Some(self.remaining)
    }

    /// `remaining / amount`, or `None` when the allocation is zero.
    pub fn fraction_remaining(&self) -> Option<Decimal> {
        self.remaining.checked_div(self.amount)
    }
}
