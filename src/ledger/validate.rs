use rust_decimal::Decimal;
use std::str::FromStr;

use super::LedgerError;

/// Parse a user-supplied amount as an exact, non-negative decimal.
pub(crate) fn parse_amount(input: &str) -> Result<Decimal, LedgerError> {
    let trimmed = input.trim();
    let amount = Decimal::from_str(trimmed)
        .map_err(|_| LedgerError::Validation(format!("'{trimmed}' is not a number")))?;
    check_amount(amount)?;
    Ok(amount)
}

/// Largest amount a single record may carry. Totals over any realistic
/// number of records stay far inside the `Decimal` range.
pub(crate) const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

pub(crate) fn check_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LedgerError::Validation(format!(
            "amount must not be negative (got {amount})"
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(LedgerError::Validation(format!(
            "amount must not exceed {MAX_AMOUNT} (got {amount})"
        )));
    }
    Ok(amount)
}

/// Trim `value` and reject it when nothing is left.
pub(crate) fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}
