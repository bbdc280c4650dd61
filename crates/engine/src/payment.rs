//! Direct payments between members.
//!
//! A [`Payment`] records money that already changed hands outside the
//! engine. It is data, not a computation result.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    EngineError, GroupId, Money, PaymentId, ResultEngine, SettlementTransaction, UserId,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Payment {
    id: PaymentId,
    group_id: GroupId,
    payer_id: UserId,
    recipient_id: UserId,
    amount: Money,
    date: NaiveDate,
}

impl Payment {
    pub fn new(
        group_id: GroupId,
        payer_id: UserId,
        recipient_id: UserId,
        amount: Money,
        date: NaiveDate,
    ) -> ResultEngine<Self> {
        Self::restore(PaymentId::new(), group_id, payer_id, recipient_id, amount, date)
    }

    /// Rebuilds a stored payment, checking the same rules as [`Payment::new`].
    pub fn restore(
        id: PaymentId,
        group_id: GroupId,
        payer_id: UserId,
        recipient_id: UserId,
        amount: Money,
        date: NaiveDate,
    ) -> ResultEngine<Self> {
        if payer_id == recipient_id {
            return Err(EngineError::InvalidPayment(format!(
                "\"{payer_id}\" cannot pay themselves"
            ))
            .logged("payment"));
        }
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(format!(
                "payment amount must be > 0, got {amount}"
            ))
            .logged("payment"));
        }
        Ok(Self {
            id,
            group_id,
            payer_id,
            recipient_id,
            amount,
            date,
        })
    }

    /// Records a suggested settlement transfer as executed.
    pub fn from_transaction(
        group_id: GroupId,
        transaction: &SettlementTransaction,
        date: NaiveDate,
    ) -> ResultEngine<Self> {
        Self::new(
            group_id,
            transaction.from_user_id.clone(),
            transaction.to_user_id.clone(),
            transaction.amount,
            date,
        )
    }

    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    pub fn payer_id(&self) -> &UserId {
        &self.payer_id
    }

    pub fn recipient_id(&self) -> &UserId {
        &self.recipient_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Currency;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()
    }

    #[test]
    fn rejects_self_payment() {
        let result = Payment::new(
            GroupId::new(),
            "bob".into(),
            "bob".into(),
            Money::new(10_00, Currency::Eur),
            date(),
        );
        assert!(matches!(result, Err(EngineError::InvalidPayment(_))));
    }

    #[test]
    fn rejects_non_positive_amount() {
        for minor in [0, -1] {
            let result = Payment::new(
                GroupId::new(),
                "bob".into(),
                "alice".into(),
                Money::new(minor, Currency::Eur),
                date(),
            );
            assert!(matches!(result, Err(EngineError::InvalidAmount(_))));
        }
    }

    #[test]
    fn records_settlement_transaction() {
        let group_id = GroupId::new();
        let transaction = SettlementTransaction {
            from_user_id: "bob".into(),
            to_user_id: "alice".into(),
            amount: Money::new(10_00, Currency::Eur),
        };
        let payment = Payment::from_transaction(group_id, &transaction, date()).unwrap();
        assert_eq!(payment.group_id(), group_id);
        assert_eq!(payment.payer_id(), &UserId::from("bob"));
        assert_eq!(payment.recipient_id(), &UserId::from("alice"));
        assert_eq!(payment.amount(), transaction.amount);
    }
}
