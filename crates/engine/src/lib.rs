//! Ledger & settlement engine for groups sharing expenses.
//!
//! The engine answers "who owes whom, and with how few transfers can
//! everybody be paid back". It is made of three pure stages:
//!
//! 1. [`compute_split`] validates how an expense total is divided among
//!    its participants and materializes each owed amount.
//! 2. [`compute_balances`] folds every expense and payment of a group into a
//!    net balance per member.
//! 3. [`generate_plan`] turns net balances into a short, deterministic list
//!    of transfers that zeroes everybody.
//!
//! All amounts are [`Money`] values in integer minor units; no floating
//! point is involved anywhere. Nothing here does I/O or keeps global state:
//! callers pass the full current set of records each time, or keep a
//! [`GroupLedger`] that memoizes balances per version.

pub use balances::{
    Balances, DebtMatrix, PairwiseDebt, compute_balances, compute_balances_by_currency,
    debt_matrix, ensure_zero_sum,
};
pub use currency::Currency;
pub use error::EngineError;
pub use expense::{Expense, ExpenseRecord};
pub use ids::{ExpenseId, GroupId, PaymentId, UserId};
pub use ledger::{BalanceSnapshot, GroupLedger};
pub use money::Money;
pub use payment::Payment;
pub use percent::Percent;
pub use settlement::{SettlementTransaction, apply_plan, generate_plan};
pub use split::{ExpenseParticipant, RawInput, SplitSpec, SplitType, compute_split};

mod balances;
mod currency;
mod error;
mod expense;
mod ids;
mod ledger;
mod money;
mod payment;
mod percent;
mod settlement;
mod split;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
