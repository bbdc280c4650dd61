//! The `GroupLedger` holds the expenses and payments of one group and
//! answers balance and settlement queries about them.
//!
//! Every mutation bumps a monotonic `version` and drops the memoized
//! balances in the same `&mut self` call, so a cached [`BalanceSnapshot`] is
//! never served for a state it was not computed from. Callers holding an
//! older snapshot can tell with [`GroupLedger::is_current`].

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    Balances, Currency, DebtMatrix, EngineError, Expense, ExpenseId, GroupId, Money, Payment,
    PaymentId, ResultEngine, SettlementTransaction, SplitSpec, UserId, balances, generate_plan,
    util::ensure_same_currency,
};

/// Balances tagged with the ledger version they were computed from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BalanceSnapshot {
    pub version: u64,
    pub balances: Balances,
}

#[derive(Debug)]
pub struct GroupLedger {
    group_id: GroupId,
    currency: Currency,
    version: u64,
    expenses: Vec<Expense>,
    payments: Vec<Payment>,
    cache: Option<BalanceSnapshot>,
}

impl GroupLedger {
    pub fn new(group_id: GroupId, currency: Currency) -> Self {
        Self {
            group_id,
            currency,
            version: 0,
            expenses: Vec::new(),
            payments: Vec::new(),
            cache: None,
        }
    }

    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Incremented by every successful mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn expense(&self, expense_id: ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|expense| expense.id() == expense_id)
    }

    pub fn payment(&self, payment_id: PaymentId) -> Option<&Payment> {
        self.payments.iter().find(|payment| payment.id() == payment_id)
    }

    /// Validates a new split and adds the resulting expense.
    pub fn create_expense(
        &mut self,
        payer_id: UserId,
        total_amount: Money,
        description: &str,
        spec: &SplitSpec,
        date: NaiveDate,
    ) -> ResultEngine<ExpenseId> {
        let expense = Expense::new(self.group_id, payer_id, total_amount, description, spec, date)?;
        let expense_id = expense.id();
        self.add_expense(expense)?;
        Ok(expense_id)
    }

    pub fn add_expense(&mut self, expense: Expense) -> ResultEngine<u64> {
        self.check_expense(&expense)?;
        if self.expense(expense.id()).is_some() {
            return Err(EngineError::ExistingKey(expense.id().to_string()));
        }
        self.expenses.push(expense);
        self.bump()
    }

    /// Swaps the stored expense with the same id for `expense`, typically
    /// the output of [`Expense::resplit`].
    pub fn replace_expense(&mut self, expense: Expense) -> ResultEngine<u64> {
        self.check_expense(&expense)?;
        let slot = self
            .expenses
            .iter_mut()
            .find(|stored| stored.id() == expense.id())
            .ok_or_else(|| EngineError::KeyNotFound(expense.id().to_string()))?;
        *slot = expense;
        self.bump()
    }

    pub fn remove_expense(&mut self, expense_id: ExpenseId) -> ResultEngine<Expense> {
        let index = self
            .expenses
            .iter()
            .position(|expense| expense.id() == expense_id)
            .ok_or_else(|| EngineError::KeyNotFound(expense_id.to_string()))?;
        let expense = self.expenses.remove(index);
        self.bump()?;
        Ok(expense)
    }

    pub fn record_payment(&mut self, payment: Payment) -> ResultEngine<u64> {
        self.check_group(payment.group_id())?;
        ensure_same_currency(self.currency, payment.amount().currency())?;
        if self.payment(payment.id()).is_some() {
            return Err(EngineError::ExistingKey(payment.id().to_string()));
        }
        self.payments.push(payment);
        self.bump()
    }

    /// Records a plan transfer as an executed payment.
    pub fn settle(
        &mut self,
        transaction: &SettlementTransaction,
        date: NaiveDate,
    ) -> ResultEngine<PaymentId> {
        let payment = Payment::from_transaction(self.group_id, transaction, date)?;
        let payment_id = payment.id();
        self.record_payment(payment)?;
        Ok(payment_id)
    }

    pub fn remove_payment(&mut self, payment_id: PaymentId) -> ResultEngine<Payment> {
        let index = self
            .payments
            .iter()
            .position(|payment| payment.id() == payment_id)
            .ok_or_else(|| EngineError::KeyNotFound(payment_id.to_string()))?;
        let payment = self.payments.remove(index);
        self.bump()?;
        Ok(payment)
    }

    /// Current balances, recomputed only when the ledger changed since the
    /// last call.
    pub fn balances(&mut self) -> ResultEngine<&BalanceSnapshot> {
        let snapshot = match self.cache.take() {
            Some(snapshot) if snapshot.version == self.version => snapshot,
            _ => BalanceSnapshot {
                version: self.version,
                balances: balances::aggregate(
                    self.currency,
                    self.expenses.iter(),
                    self.payments.iter(),
                )?,
            },
        };
        Ok(self.cache.insert(snapshot))
    }

    /// `true` if `snapshot` reflects the current state of the ledger.
    pub fn is_current(&self, snapshot: &BalanceSnapshot) -> bool {
        snapshot.version == self.version
    }

    pub fn settlement_plan(&mut self) -> ResultEngine<Vec<SettlementTransaction>> {
        let snapshot = self.balances()?;
        generate_plan(&snapshot.balances)
    }

    pub fn debt_matrix(&self) -> ResultEngine<DebtMatrix> {
        let matrix = balances::debt_matrix(&self.expenses, &self.payments)?;
        if !self.expenses.is_empty() || !self.payments.is_empty() {
            ensure_same_currency(self.currency, matrix.currency())?;
        }
        Ok(matrix)
    }

    fn check_group(&self, group_id: GroupId) -> ResultEngine<()> {
        if group_id != self.group_id {
            return Err(EngineError::InvalidRecord(format!(
                "record belongs to group {group_id}, not {}",
                self.group_id
            )));
        }
        Ok(())
    }

    fn check_expense(&self, expense: &Expense) -> ResultEngine<()> {
        self.check_group(expense.group_id())?;
        ensure_same_currency(self.currency, expense.total_amount().currency())
    }

    fn bump(&mut self) -> ResultEngine<u64> {
        self.version = self.version.checked_add(1).ok_or(EngineError::Overflow)?;
        self.cache = None;
        tracing::debug!(group = %self.group_id, version = self.version, "ledger changed");
        Ok(self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eur(minor: i64) -> Money {
        Money::new(minor, Currency::Eur)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()
    }

    fn equal(ids: &[&str]) -> SplitSpec {
        SplitSpec::Equal(ids.iter().map(|id| UserId::from(*id)).collect())
    }

    fn ledger() -> GroupLedger {
        GroupLedger::new(GroupId::new(), Currency::Eur)
    }

    #[test]
    fn mutations_bump_version() {
        let mut ledger = ledger();
        assert_eq!(ledger.version(), 0);
        let expense_id = ledger
            .create_expense("a".into(), eur(20_00), "Taxi", &equal(&["a", "b"]), date())
            .unwrap();
        assert_eq!(ledger.version(), 1);
        ledger.remove_expense(expense_id).unwrap();
        assert_eq!(ledger.version(), 2);
    }

    #[test]
    fn cached_balances_follow_version() {
        let mut ledger = ledger();
        ledger
            .create_expense("a".into(), eur(20_00), "Taxi", &equal(&["a", "b"]), date())
            .unwrap();

        let first = ledger.balances().unwrap().clone();
        assert!(ledger.is_current(&first));
        assert_eq!(first.balances.get(&"b".into()), Some(eur(-10_00)));

        let payment = Payment::new(ledger.group_id(), "b".into(), "a".into(), eur(10_00), date())
            .unwrap();
        ledger.record_payment(payment).unwrap();
        assert!(!ledger.is_current(&first));

        let second = ledger.balances().unwrap();
        assert_eq!(second.version, first.version + 1);
        assert!(second.balances.is_settled());
    }

    #[test]
    fn failed_mutation_keeps_version() {
        let mut ledger = ledger();
        let result =
            ledger.create_expense("c".into(), eur(20_00), "Taxi", &equal(&["a", "b"]), date());
        assert_eq!(result, Err(EngineError::PayerNotParticipant("c".into())));
        assert_eq!(ledger.version(), 0);

        let usd = Payment::new(
            ledger.group_id(),
            "b".into(),
            "a".into(),
            Money::new(1_00, Currency::Usd),
            date(),
        )
        .unwrap();
        assert!(matches!(
            ledger.record_payment(usd),
            Err(EngineError::CurrencyMismatch { .. })
        ));
        assert_eq!(ledger.version(), 0);
    }

    #[test]
    fn rejects_foreign_group_and_duplicates() {
        let mut ledger = ledger();
        let foreign = Expense::new(
            GroupId::new(),
            "a".into(),
            eur(5_00),
            "Coffee",
            &equal(&["a"]),
            date(),
        )
        .unwrap();
        assert!(matches!(
            ledger.add_expense(foreign),
            Err(EngineError::InvalidRecord(_))
        ));

        let own = Expense::new(
            ledger.group_id(),
            "a".into(),
            eur(5_00),
            "Coffee",
            &equal(&["a"]),
            date(),
        )
        .unwrap();
        ledger.add_expense(own.clone()).unwrap();
        assert!(matches!(
            ledger.add_expense(own),
            Err(EngineError::ExistingKey(_))
        ));
    }

    #[test]
    fn replace_expense_applies_edit() {
        let mut ledger = ledger();
        let expense_id = ledger
            .create_expense("a".into(), eur(30_00), "Lunch", &equal(&["a", "b", "c"]), date())
            .unwrap();
        let edited = ledger
            .expense(expense_id)
            .unwrap()
            .resplit(
                "a".into(),
                eur(30_00),
                &SplitSpec::Shares(vec![("a".into(), 1), ("b".into(), 2)]),
            )
            .unwrap();
        ledger.replace_expense(edited).unwrap();

        let snapshot = ledger.balances().unwrap();
        assert_eq!(snapshot.balances.get(&"b".into()), Some(eur(-20_00)));
        assert_eq!(snapshot.balances.get(&"c".into()), None);
        assert_eq!(ledger.expenses().len(), 1);
    }

    #[test]
    fn settling_the_plan_zeroes_the_group() {
        let mut ledger = ledger();
        ledger
            .create_expense("a".into(), eur(90_00), "Dinner", &equal(&["a", "b", "c"]), date())
            .unwrap();
        ledger
            .create_expense("b".into(), eur(30_00), "Wine", &equal(&["a", "b", "c"]), date())
            .unwrap();

        let plan = ledger.settlement_plan().unwrap();
        for transaction in &plan {
            ledger.settle(transaction, date()).unwrap();
        }
        assert!(ledger.balances().unwrap().balances.is_settled());
        assert!(ledger.settlement_plan().unwrap().is_empty());
    }

    #[test]
    fn missing_records_are_reported() {
        let mut ledger = ledger();
        assert!(matches!(
            ledger.remove_expense(ExpenseId::new()),
            Err(EngineError::KeyNotFound(_))
        ));
        assert!(matches!(
            ledger.remove_payment(PaymentId::new()),
            Err(EngineError::KeyNotFound(_))
        ));
    }
}
