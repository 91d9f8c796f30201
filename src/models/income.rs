use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Income {
    pub description: String,
    pub amount: Decimal,
    pub timestamp: String,
}

impl Income {
    pub fn new(description: String, amount: Decimal, timestamp: String) -> Self {
        Self {
            description,
            amount,
            timestamp,
        }
    }
}
