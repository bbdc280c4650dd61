//! Settlement planner.
//!
//! Finding the smallest set of transfers that zeroes a group is NP-hard in
//! general, so the planner is greedy: it keeps matching the largest
//! creditor with the largest debtor and moves the smaller of the two
//! amounts. Every step zeroes at least one member, so a plan has at most
//! `k - 1` transfers for `k` members with a non-zero balance, and it always
//! settles everybody exactly.
//!
//! Ties on amount are broken by member id (ascending), so identical input
//! yields an identical plan.

use std::{cmp::Reverse, collections::BinaryHeap};

use serde::{Deserialize, Serialize};

use crate::{Balances, EngineError, Money, ResultEngine, UserId, balances::ensure_zero_sum};

/// A suggested transfer: `from_user_id` pays `to_user_id` `amount`.
///
/// It stays a suggestion until a matching [`Payment`](crate::Payment) is
/// recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementTransaction {
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub amount: Money,
}

/// Builds the transfer list that brings every balance in `balances` to
/// zero.
///
/// Fails with `UnbalancedInput` when the balances do not sum to zero, which
/// means the aggregation upstream is broken.
///
/// ```rust
/// use engine::{Balances, Currency, Money, generate_plan};
///
/// let eur = |minor| Money::new(minor, Currency::Eur);
/// let balances = Balances::from_entries(
///     Currency::Eur,
///     [("A".into(), eur(30_00)), ("B".into(), eur(20_00)), ("C".into(), eur(-50_00))],
/// )
/// .unwrap();
///
/// let plan = generate_plan(&balances).unwrap();
/// assert_eq!(plan.len(), 2);
/// assert_eq!(plan[0].from_user_id.as_str(), "C");
/// assert_eq!(plan[0].to_user_id.as_str(), "A");
/// assert_eq!(plan[0].amount, eur(30_00));
/// ```
pub fn generate_plan(balances: &Balances) -> ResultEngine<Vec<SettlementTransaction>> {
    let plan = greedy_plan(balances).map_err(|err| err.logged("settlement"))?;
    tracing::debug!(
        members = balances.len(),
        transactions = plan.len(),
        "settlement plan generated"
    );
    Ok(plan)
}

fn greedy_plan(balances: &Balances) -> ResultEngine<Vec<SettlementTransaction>> {
    ensure_zero_sum(balances)?;
    let currency = balances.currency();

    // Max-heaps on amount; `Reverse` makes the smaller id win ties.
    let mut creditors: BinaryHeap<(i64, Reverse<UserId>)> = BinaryHeap::new();
    let mut debtors: BinaryHeap<(i64, Reverse<UserId>)> = BinaryHeap::new();
    for (user_id, net) in balances.iter() {
        if net.is_positive() {
            creditors.push((net.minor_units(), Reverse(user_id.clone())));
        } else if net.is_negative() {
            let owed = net.negate()?.minor_units();
            debtors.push((owed, Reverse(user_id.clone())));
        }
    }

    let mut plan = Vec::new();
    while let (Some((credit, Reverse(creditor))), Some((debt, Reverse(debtor)))) =
        (creditors.pop(), debtors.pop())
    {
        let amount = credit.min(debt);
        plan.push(SettlementTransaction {
            from_user_id: debtor.clone(),
            to_user_id: creditor.clone(),
            amount: Money::new(amount, currency),
        });
        if credit > amount {
            creditors.push((credit - amount, Reverse(creditor)));
        }
        if debt > amount {
            debtors.push((debt - amount, Reverse(debtor)));
        }
    }

    let settled = apply_plan(balances, &plan)?;
    if let Some((_, residual)) = settled.iter().find(|(_, amount)| !amount.is_zero()) {
        return Err(EngineError::UnbalancedInput(residual));
    }

    Ok(plan)
}

/// Applies `plan` to `balances` the way recorded payments would: the payer
/// moves up by the amount, the recipient down.
pub fn apply_plan(balances: &Balances, plan: &[SettlementTransaction]) -> ResultEngine<Balances> {
    let mut result = balances.clone();
    for transaction in plan {
        result.adjust(&transaction.from_user_id, transaction.amount)?;
        result.adjust(&transaction.to_user_id, transaction.amount.negate()?)?;
    }
    Ok(result)
}
