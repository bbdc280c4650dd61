//! Balance aggregator.
//!
//! Net balances are a view computed from the full set of expenses and
//! payments of a group; they are never edited directly.
//!
//! - paying an expense credits the payer with the whole total;
//! - every participant, the payer included, is debited their owed amount;
//! - a payment credits its payer and debits its recipient.
//!
//! Positive means "is owed", negative means "owes". The balances of a group
//! always sum to zero.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    Currency, EngineError, Expense, Money, Payment, ResultEngine, UserId,
    util::{ensure_same_currency, group_currency},
};

/// Net balance per member, ordered by member id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    currency: Currency,
    entries: BTreeMap<UserId, Money>,
}

impl Balances {
    pub fn new(currency: Currency) -> Self {
        Self {
            currency,
            entries: BTreeMap::new(),
        }
    }

    /// Builds balances from explicit `(member, net)` pairs, e.g. balances
    /// received from another system. Repeated members are summed.
    pub fn from_entries<I>(currency: Currency, entries: I) -> ResultEngine<Self>
    where
        I: IntoIterator<Item = (UserId, Money)>,
    {
        let mut balances = Self::new(currency);
        for (user_id, amount) in entries {
            balances.adjust(&user_id, amount)?;
        }
        Ok(balances)
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn get(&self, user_id: &UserId) -> Option<Money> {
        self.entries.get(user_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserId, Money)> {
        self.entries.iter().map(|(user_id, amount)| (user_id, *amount))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of every balance; zero for consistent input.
    ///
    /// Summed in `i128`, so partial sums may leave the `i64` range; only a
    /// residual that does not fit fails with `Overflow`.
    pub fn total(&self) -> ResultEngine<Money> {
        let total: i128 = self
            .entries
            .values()
            .map(|amount| i128::from(amount.minor_units()))
            .sum();
        let total = i64::try_from(total).map_err(|_| EngineError::Overflow)?;
        Ok(Money::new(total, self.currency))
    }

    /// `true` when nobody owes anything.
    pub fn is_settled(&self) -> bool {
        self.entries.values().all(|amount| amount.is_zero())
    }

    pub fn into_map(self) -> BTreeMap<UserId, Money> {
        self.entries
    }

    /// Adds `amount` (signed) to the balance of `user_id`, creating the entry
    /// at zero if needed.
    pub(crate) fn adjust(&mut self, user_id: &UserId, amount: Money) -> ResultEngine<()> {
        let current = self
            .entries
            .get(user_id)
            .copied()
            .unwrap_or(Money::zero(self.currency));
        let updated = current.add(amount)?;
        self.entries.insert(user_id.clone(), updated);
        Ok(())
    }
}

/// Fails with `UnbalancedInput` unless `balances` sum to zero.
pub fn ensure_zero_sum(balances: &Balances) -> ResultEngine<()> {
    let total = balances.total()?;
    if !total.is_zero() {
        return Err(EngineError::UnbalancedInput(total));
    }
    Ok(())
}

/// Aggregates a single-currency group.
///
/// The currency is taken from the first record; any record in another
/// currency fails with `CurrencyMismatch` (use
/// [`compute_balances_by_currency`] for mixed data). Every participant and
/// payment party gets an entry, even when it nets to zero.
///
/// ```rust
/// use chrono::NaiveDate;
/// use engine::{Currency, Expense, GroupId, Money, SplitSpec, compute_balances};
///
/// let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
/// let dinner = Expense::new(
///     GroupId::new(),
///     "alice".into(),
///     Money::new(90_00, Currency::Eur),
///     "Dinner",
///     &SplitSpec::Equal(vec!["alice".into(), "bob".into(), "carol".into()]),
///     date,
/// )
/// .unwrap();
///
/// let balances = compute_balances(&[dinner], &[]).unwrap();
/// assert_eq!(balances.get(&"alice".into()).unwrap().minor_units(), 60_00);
/// assert_eq!(balances.get(&"bob".into()).unwrap().minor_units(), -30_00);
/// ```
pub fn compute_balances(expenses: &[Expense], payments: &[Payment]) -> ResultEngine<Balances> {
    let currency = group_currency(expenses, payments);
    aggregate(currency, expenses.iter(), payments.iter())
}

/// Aggregates each currency found in the records independently.
pub fn compute_balances_by_currency(
    expenses: &[Expense],
    payments: &[Payment],
) -> ResultEngine<BTreeMap<Currency, Balances>> {
    let mut partitions: BTreeMap<Currency, (Vec<&Expense>, Vec<&Payment>)> = BTreeMap::new();
    for expense in expenses {
        partitions
            .entry(expense.total_amount().currency())
            .or_default()
            .0
            .push(expense);
    }
    for payment in payments {
        partitions
            .entry(payment.amount().currency())
            .or_default()
            .1
            .push(payment);
    }

    partitions
        .into_iter()
        .map(|(currency, (expenses, payments))| {
            aggregate(currency, expenses.into_iter(), payments.into_iter())
                .map(|balances| (currency, balances))
        })
        .collect()
}

pub(crate) fn aggregate<'a>(
    currency: Currency,
    expenses: impl Iterator<Item = &'a Expense>,
    payments: impl Iterator<Item = &'a Payment>,
) -> ResultEngine<Balances> {
    accumulate(currency, expenses, payments).map_err(|err| err.logged("balances"))
}

fn accumulate<'a>(
    currency: Currency,
    expenses: impl Iterator<Item = &'a Expense>,
    payments: impl Iterator<Item = &'a Payment>,
) -> ResultEngine<Balances> {
    let mut balances = Balances::new(currency);
    let mut expense_count = 0usize;
    let mut payment_count = 0usize;

    for expense in expenses {
        let total = expense.total_amount();
        ensure_same_currency(currency, total.currency())?;

        balances.adjust(expense.payer_id(), total)?;
        for participant in expense.participants() {
            balances.adjust(&participant.user_id, participant.owed_amount.negate()?)?;
        }
        expense_count += 1;
    }

    for payment in payments {
        let amount = payment.amount();
        ensure_same_currency(currency, amount.currency())?;

        balances.adjust(payment.payer_id(), amount)?;
        balances.adjust(payment.recipient_id(), amount.negate()?)?;
        payment_count += 1;
    }

    ensure_zero_sum(&balances)?;

    tracing::debug!(
        currency = %currency,
        members = balances.len(),
        expenses = expense_count,
        payments = payment_count,
        "balances computed"
    );
    Ok(balances)
}

/// Net debt between two members: `debtor` owes `creditor` `amount`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PairwiseDebt {
    pub debtor: UserId,
    pub creditor: UserId,
    pub amount: Money,
}

/// Who owes whom directly, before any simplification.
///
/// Each unordered pair of members appears at most once, netted in a single
/// direction. Summing a member's pairwise debts reproduces their net
/// balance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DebtMatrix {
    currency: Currency,
    debts: Vec<PairwiseDebt>,
}

impl DebtMatrix {
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Debts ordered by `(debtor, creditor)` pair.
    pub fn debts(&self) -> &[PairwiseDebt] {
        &self.debts
    }

    /// Amount `debtor` owes `creditor`, zero if none.
    pub fn owed(&self, debtor: &UserId, creditor: &UserId) -> Money {
        self.debts
            .iter()
            .find(|debt| &debt.debtor == debtor && &debt.creditor == creditor)
            .map(|debt| debt.amount)
            .unwrap_or(Money::zero(self.currency))
    }

    /// What `user_id` is owed minus what they owe.
    pub fn net_for(&self, user_id: &UserId) -> ResultEngine<Money> {
        self.debts
            .iter()
            .try_fold(Money::zero(self.currency), |acc, debt| {
                if &debt.creditor == user_id {
                    acc.add(debt.amount)
                } else if &debt.debtor == user_id {
                    acc.subtract(debt.amount)
                } else {
                    Ok(acc)
                }
            })
    }
}

/// Builds the pairwise view of a single-currency group.
///
/// Every non-payer participant owes the payer their share; a payment from
/// `a` to `b` counts as `b` owing `a` the amount, which cancels existing
/// debt of `a` towards `b`.
pub fn debt_matrix(expenses: &[Expense], payments: &[Payment]) -> ResultEngine<DebtMatrix> {
    let currency = group_currency(expenses, payments);

    // Keyed by (low, high) member id; positive = low owes high.
    let mut pairs: BTreeMap<(UserId, UserId), Money> = BTreeMap::new();
    let mut record = |debtor: &UserId, creditor: &UserId, amount: Money| -> ResultEngine<()> {
        ensure_same_currency(currency, amount.currency())?;
        let (key, signed) = if debtor < creditor {
            ((debtor.clone(), creditor.clone()), amount)
        } else {
            ((creditor.clone(), debtor.clone()), amount.negate()?)
        };
        let entry = pairs.entry(key).or_insert(Money::zero(currency));
        *entry = entry.add(signed)?;
        Ok(())
    };

    for expense in expenses {
        for participant in expense.participants() {
            if &participant.user_id != expense.payer_id() && !participant.owed_amount.is_zero() {
                record(&participant.user_id, expense.payer_id(), participant.owed_amount)?;
            }
        }
    }
    for payment in payments {
        record(payment.recipient_id(), payment.payer_id(), payment.amount())?;
    }

    let mut debts = Vec::new();
    for ((low, high), net) in pairs {
        if net.is_positive() {
            debts.push(PairwiseDebt {
                debtor: low,
                creditor: high,
                amount: net,
            });
        } else if net.is_negative() {
            debts.push(PairwiseDebt {
                debtor: high,
                creditor: low,
                amount: net.negate()?,
            });
        }
    }
    debts.sort_by(|a, b| (&a.debtor, &a.creditor).cmp(&(&b.debtor, &b.creditor)));

    Ok(DebtMatrix { currency, debts })
}
