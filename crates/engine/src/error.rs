//! The module contains the errors the engine can return.
//!
//! Every variant is a business-rule failure caused by the data a caller
//! supplied, except two defect signals:
//!
//! - [`Overflow`] raised when minor-units arithmetic leaves the `i64` range.
//! - [`UnbalancedInput`] raised when balances do not sum to zero.
//!
//! Both should never happen on well-formed input; see
//! [`EngineError::is_defect`].
//!
//!  [`Overflow`]: EngineError::Overflow
//!  [`UnbalancedInput`]: EngineError::UnbalancedInput
use thiserror::Error;

use crate::{Currency, Money, Percent, UserId};

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("An expense needs at least one participant")]
    NoParticipants,
    #[error("Payer \"{0}\" is not a participant")]
    PayerNotParticipant(UserId),
    #[error("\"{0}\" appears more than once among the participants")]
    DuplicateParticipant(UserId),
    #[error("Exact split mismatch: amounts sum to {split_total}, expense total is {expense_total}")]
    ExactSplitMismatch {
        split_total: Money,
        expense_total: Money,
    },
    #[error("Percentage split mismatch: percentages sum to {0}, expected 100.00%")]
    PercentageSplitMismatch(Percent),
    #[error("Invalid percentage {percent} for \"{user_id}\": must be between 0 and 100")]
    InvalidPercentage { user_id: UserId, percent: Percent },
    #[error("Invalid share count {shares} for \"{user_id}\": must be >= 1")]
    InvalidShareCount { user_id: UserId, shares: i64 },
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),
    #[error("Currency mismatch: expected {expected}, got {actual}")]
    CurrencyMismatch { expected: Currency, actual: Currency },
    #[error("Unsupported currency: {0}")]
    InvalidCurrency(String),
    #[error("Invalid payment: {0}")]
    InvalidPayment(String),
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Arithmetic overflow on minor units")]
    Overflow,
    #[error("Unbalanced input: balances sum to {0} instead of zero")]
    UnbalancedInput(Money),
}

impl EngineError {
    /// Returns `true` for errors that point at corrupted input or an upstream
    /// bug rather than at a user mistake.
    #[must_use]
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::Overflow | Self::UnbalancedInput(_))
    }

    /// Emits the error on the `tracing` side: defects at `error`, validation
    /// failures at `warn`.
    pub(crate) fn logged(self, context: &str) -> Self {
        if self.is_defect() {
            tracing::error!(error = %self, "{context}: invariant violated");
        } else {
            tracing::warn!(error = %self, "{context}: rejected");
        }
        self
    }
}
