//! Internal helpers for currency consistency checks.
//!
//! These utilities are **not** part of the public API.

use crate::{Currency, EngineError, Expense, Payment, ResultEngine};

/// Ensure a currency matches the expected one (a group, an amount...).
pub(crate) fn ensure_same_currency(expected: Currency, actual: Currency) -> ResultEngine<()> {
    if expected != actual {
        return Err(EngineError::CurrencyMismatch {
            expected,
            actual,
        });
    }
    Ok(())
}

/// Currency of the first record, or the default currency when there are
/// none.
pub(crate) fn group_currency(expenses: &[Expense], payments: &[Payment]) -> Currency {
    expenses
        .first()
        .map(|expense| expense.total_amount().currency())
        .or_else(|| payments.first().map(|payment| payment.amount().currency()))
        .unwrap_or_default()
}
