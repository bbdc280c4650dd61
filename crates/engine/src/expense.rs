//! Expense primitives.
//!
//! An [`Expense`] is money advanced by one member (the payer) on behalf of
//! its participants. Its split is validated when it is built and cannot be
//! changed afterwards: editing an expense produces a new, fully validated
//! value.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, ExpenseId, ExpenseParticipant, GroupId, Money, ResultEngine, SplitSpec,
    SplitType, UserId, compute_split,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Expense {
    id: ExpenseId,
    group_id: GroupId,
    payer_id: UserId,
    total_amount: Money,
    description: String,
    split_type: SplitType,
    participants: Vec<ExpenseParticipant>,
    date: NaiveDate,
    created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        group_id: GroupId,
        payer_id: UserId,
        total_amount: Money,
        description: &str,
        spec: &SplitSpec,
        date: NaiveDate,
    ) -> ResultEngine<Self> {
        let participants = compute_split(&payer_id, total_amount, spec)?;
        Ok(Self {
            id: ExpenseId::new(),
            group_id,
            payer_id,
            total_amount,
            description: description.trim().to_string(),
            split_type: spec.split_type(),
            participants,
            date,
            created_at: Utc::now(),
        })
    }

    /// Returns an edited copy carrying a newly validated split. The id, group,
    /// description and date are kept; `self` is left untouched.
    pub fn resplit(
        &self,
        payer_id: UserId,
        total_amount: Money,
        spec: &SplitSpec,
    ) -> ResultEngine<Self> {
        let participants = compute_split(&payer_id, total_amount, spec)?;
        Ok(Self {
            id: self.id,
            group_id: self.group_id,
            payer_id,
            total_amount,
            description: self.description.clone(),
            split_type: spec.split_type(),
            participants,
            date: self.date,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> ExpenseId {
        self.id
    }

    pub fn group_id(&self) -> GroupId {
        self.group_id
    }

    pub fn payer_id(&self) -> &UserId {
        &self.payer_id
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn split_type(&self) -> SplitType {
        self.split_type
    }

    pub fn participants(&self) -> &[ExpenseParticipant] {
        &self.participants
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// An expense as stored by the data layer, before its invariants are
/// checked again.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: ExpenseId,
    pub group_id: GroupId,
    pub payer_id: UserId,
    pub total_amount: Money,
    pub description: String,
    pub split_type: SplitType,
    pub participants: Vec<ExpenseParticipant>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<Expense> for ExpenseRecord {
    fn from(expense: Expense) -> Self {
        Self {
            id: expense.id,
            group_id: expense.group_id,
            payer_id: expense.payer_id,
            total_amount: expense.total_amount,
            description: expense.description,
            split_type: expense.split_type,
            participants: expense.participants,
            date: expense.date,
            created_at: expense.created_at,
        }
    }
}

impl TryFrom<ExpenseRecord> for Expense {
    type Error = EngineError;

    /// Rebuilds the split from the stored raw inputs and requires it to match
    /// the stored owed amounts exactly.
    fn try_from(record: ExpenseRecord) -> Result<Self, Self::Error> {
        let spec = SplitSpec::from_participants(record.split_type, &record.participants)?;
        let recomputed = compute_split(&record.payer_id, record.total_amount, &spec)?;
        if recomputed != record.participants {
            return Err(EngineError::InvalidRecord(format!(
                "expense {}: stored owed amounts differ from its split",
                record.id
            ))
            .logged("restore expense"));
        }

        Ok(Self {
            id: record.id,
            group_id: record.group_id,
            payer_id: record.payer_id,
            total_amount: record.total_amount,
            description: record.description,
            split_type: record.split_type,
            participants: record.participants,
            date: record.date,
            created_at: record.created_at,
        })
    }
}
