//! Split calculator.
//!
//! Turns an expense total and a [`SplitSpec`] into the list of
//! [`ExpenseParticipant`]s that owe a part of it. The function is pure: the
//! same input, in the same order, always yields the same output, so a caller
//! can preview a split and later commit the identical result.
//!
//! Structural checks run first, for every split type, in this order:
//! positive total, at least one participant, payer among the participants,
//! no duplicate participant. Type-specific arithmetic checks follow.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, Percent, ResultEngine, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitType {
    Equal,
    Exact,
    Percentage,
    Shares,
}

impl SplitType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::Exact => "exact",
            Self::Percentage => "percentage",
            Self::Shares => "shares",
        }
    }
}

impl TryFrom<&str> for SplitType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "equal" => Ok(Self::Equal),
            "exact" => Ok(Self::Exact),
            "percentage" => Ok(Self::Percentage),
            "shares" => Ok(Self::Shares),
            other => Err(EngineError::InvalidRecord(format!(
                "invalid split type: {other}"
            ))),
        }
    }
}

/// How an expense total is divided, with the per-participant input each
/// rule needs. Participant order matters: it drives remainder assignment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "participants", rename_all = "snake_case")]
pub enum SplitSpec {
    /// Everybody owes the same amount.
    Equal(Vec<UserId>),
    /// Everybody owes an explicit amount; amounts must add up to the total.
    Exact(Vec<(UserId, Money)>),
    /// Everybody owes a percentage; percentages must add up to 100.00.
    Percentage(Vec<(UserId, Percent)>),
    /// Everybody owes proportionally to a positive share count.
    Shares(Vec<(UserId, i64)>),
}

impl SplitSpec {
    pub fn split_type(&self) -> SplitType {
        match self {
            Self::Equal(_) => SplitType::Equal,
            Self::Exact(_) => SplitType::Exact,
            Self::Percentage(_) => SplitType::Percentage,
            Self::Shares(_) => SplitType::Shares,
        }
    }

    /// Participant ids in input order.
    pub fn participants(&self) -> Vec<&UserId> {
        match self {
            Self::Equal(users) => users.iter().collect(),
            Self::Exact(entries) => entries.iter().map(|(user, _)| user).collect(),
            Self::Percentage(entries) => entries.iter().map(|(user, _)| user).collect(),
            Self::Shares(entries) => entries.iter().map(|(user, _)| user).collect(),
        }
    }

    /// Rebuilds the spec that produced `participants`, from their raw inputs.
    pub(crate) fn from_participants(
        split_type: SplitType,
        participants: &[ExpenseParticipant],
    ) -> ResultEngine<Self> {
        let mismatch = |user: &UserId| {
            EngineError::InvalidRecord(format!(
                "raw input of \"{user}\" does not match a {} split",
                split_type.as_str()
            ))
        };
        let spec = match split_type {
            SplitType::Equal => Self::Equal(
                participants
                    .iter()
                    .map(|p| match p.raw_input {
                        None => Ok(p.user_id.clone()),
                        Some(_) => Err(mismatch(&p.user_id)),
                    })
                    .collect::<ResultEngine<_>>()?,
            ),
            SplitType::Exact => Self::Exact(
                participants
                    .iter()
                    .map(|p| match p.raw_input {
                        Some(RawInput::ExactAmount(amount)) => Ok((p.user_id.clone(), amount)),
                        _ => Err(mismatch(&p.user_id)),
                    })
                    .collect::<ResultEngine<_>>()?,
            ),
            SplitType::Percentage => Self::Percentage(
                participants
                    .iter()
                    .map(|p| match p.raw_input {
                        Some(RawInput::Percentage(percent)) => Ok((p.user_id.clone(), percent)),
                        _ => Err(mismatch(&p.user_id)),
                    })
                    .collect::<ResultEngine<_>>()?,
            ),
            SplitType::Shares => Self::Shares(
                participants
                    .iter()
                    .map(|p| match p.raw_input {
                        Some(RawInput::ShareCount(shares)) => Ok((p.user_id.clone(), shares)),
                        _ => Err(mismatch(&p.user_id)),
                    })
                    .collect::<ResultEngine<_>>()?,
            ),
        };
        Ok(spec)
    }
}

/// The value a participant typed in, kept next to the derived amount.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RawInput {
    ExactAmount(Money),
    Percentage(Percent),
    ShareCount(i64),
}

/// One participant's part of an expense.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseParticipant {
    pub user_id: UserId,
    pub owed_amount: Money,
    /// `None` for equal splits.
    pub raw_input: Option<RawInput>,
}

/// Validates `spec` against `total` and returns every participant's owed
/// amount, in input order. The owed amounts always sum to `total` exactly.
///
/// ```rust
/// use engine::{Currency, Money, SplitSpec, UserId, compute_split};
///
/// let payer = UserId::from("alice");
/// let spec = SplitSpec::Shares(vec![
///     ("alice".into(), 1),
///     ("bob".into(), 1),
///     ("carol".into(), 2),
/// ]);
/// let parts = compute_split(&payer, Money::new(40_00, Currency::Eur), &spec).unwrap();
/// let owed: Vec<i64> = parts.iter().map(|p| p.owed_amount.minor_units()).collect();
/// assert_eq!(owed, vec![10_00, 10_00, 20_00]);
/// ```
pub fn compute_split(
    payer: &UserId,
    total: Money,
    spec: &SplitSpec,
) -> ResultEngine<Vec<ExpenseParticipant>> {
    let participants = split_participants(payer, total, spec).map_err(|err| err.logged("split"))?;
    tracing::debug!(
        split_type = spec.split_type().as_str(),
        participants = participants.len(),
        total = %total,
        "split computed"
    );
    Ok(participants)
}

fn split_participants(
    payer: &UserId,
    total: Money,
    spec: &SplitSpec,
) -> ResultEngine<Vec<ExpenseParticipant>> {
    validate_structure(payer, total, &spec.participants())?;

    match spec {
        SplitSpec::Equal(users) => {
            let owed = total.distribute_proportionally(&vec![1; users.len()])?;
            Ok(users
                .iter()
                .zip(owed)
                .map(|(user, owed_amount)| ExpenseParticipant {
                    user_id: user.clone(),
                    owed_amount,
                    raw_input: None,
                })
                .collect())
        }
        SplitSpec::Exact(entries) => {
            for (_, amount) in entries {
                total.ensure_currency(amount.currency())?;
            }
            if let Some((user, amount)) = entries.iter().find(|(_, amount)| amount.is_negative()) {
                return Err(EngineError::InvalidAmount(format!(
                    "exact amount {amount} for \"{user}\" must not be negative"
                )));
            }
            let split_total =
                Money::sum(entries.iter().map(|(_, amount)| *amount), total.currency())?;
            if split_total != total {
                return Err(EngineError::ExactSplitMismatch {
                    split_total,
                    expense_total: total,
                });
            }
            Ok(entries
                .iter()
                .map(|(user, amount)| ExpenseParticipant {
                    user_id: user.clone(),
                    owed_amount: *amount,
                    raw_input: Some(RawInput::ExactAmount(*amount)),
                })
                .collect())
        }
        SplitSpec::Percentage(entries) => {
            if let Some((user, percent)) = entries.iter().find(|(_, p)| !p.is_valid_share()) {
                return Err(EngineError::InvalidPercentage {
                    user_id: user.clone(),
                    percent: *percent,
                });
            }
            let percent_total = entries
                .iter()
                .try_fold(Percent::ZERO, |acc, (_, percent)| acc.checked_add(*percent))?;
            if percent_total != Percent::HUNDRED {
                return Err(EngineError::PercentageSplitMismatch(percent_total));
            }
            let weights: Vec<i64> = entries.iter().map(|(_, p)| p.basis_points()).collect();
            let owed = total.distribute_proportionally(&weights)?;
            Ok(entries
                .iter()
                .zip(owed)
                .map(|((user, percent), owed_amount)| ExpenseParticipant {
                    user_id: user.clone(),
                    owed_amount,
                    raw_input: Some(RawInput::Percentage(*percent)),
                })
                .collect())
        }
        SplitSpec::Shares(entries) => {
            if let Some((user, shares)) = entries.iter().find(|(_, shares)| *shares < 1) {
                return Err(EngineError::InvalidShareCount {
                    user_id: user.clone(),
                    shares: *shares,
                });
            }
            let weights: Vec<i64> = entries.iter().map(|(_, shares)| *shares).collect();
            let owed = total.distribute_proportionally(&weights)?;
            Ok(entries
                .iter()
                .zip(owed)
                .map(|((user, shares), owed_amount)| ExpenseParticipant {
                    user_id: user.clone(),
                    owed_amount,
                    raw_input: Some(RawInput::ShareCount(*shares)),
                })
                .collect())
        }
    }
}

/// Checks shared by every split type.
fn validate_structure(payer: &UserId, total: Money, participants: &[&UserId]) -> ResultEngine<()> {
    if !total.is_positive() {
        return Err(EngineError::InvalidAmount(format!(
            "expense total must be > 0, got {total}"
        )));
    }
    if participants.is_empty() {
        return Err(EngineError::NoParticipants);
    }
    if !participants.contains(&payer) {
        return Err(EngineError::PayerNotParticipant(payer.clone()));
    }
    let mut seen = HashSet::with_capacity(participants.len());
    for user in participants {
        if !seen.insert(*user) {
            return Err(EngineError::DuplicateParticipant((*user).clone()));
        }
    }
    Ok(())
}
