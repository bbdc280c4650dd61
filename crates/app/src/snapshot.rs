//! Group snapshot file.
//!
//! The file lists expenses with the split as people type it (amounts and
//! percentages as decimal strings) plus direct payments. Amounts are parsed
//! straight into minor units; nothing goes through `f64`.

use chrono::NaiveDate;
use serde::Deserialize;

use engine::{Currency, GroupId, GroupLedger, Money, Payment, Percent, SplitSpec, UserId};

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize)]
pub struct GroupFile {
    pub currency: Option<String>,
    #[serde(default)]
    pub expenses: Vec<ExpenseInput>,
    #[serde(default)]
    pub payments: Vec<PaymentInput>,
}

#[derive(Debug, Deserialize)]
pub struct ExpenseInput {
    pub payer: String,
    pub amount: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    pub split: SplitInput,
}

#[derive(Debug, Deserialize)]
pub struct PaymentInput {
    pub payer: String,
    pub recipient: String,
    pub amount: String,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SplitInput {
    Equal { participants: Vec<String> },
    Exact { participants: Vec<ExactEntry> },
    Percentage { participants: Vec<PercentEntry> },
    Shares { participants: Vec<SharesEntry> },
}

#[derive(Debug, Deserialize)]
pub struct ExactEntry {
    pub user: String,
    pub amount: String,
}

#[derive(Debug, Deserialize)]
pub struct PercentEntry {
    pub user: String,
    pub percent: String,
}

#[derive(Debug, Deserialize)]
pub struct SharesEntry {
    pub user: String,
    pub shares: i64,
}

impl SplitInput {
    fn into_spec(self, currency: Currency) -> engine::ResultEngine<SplitSpec> {
        let spec = match self {
            Self::Equal { participants } => {
                SplitSpec::Equal(participants.into_iter().map(UserId::from).collect())
            }
            Self::Exact { participants } => SplitSpec::Exact(
                participants
                    .into_iter()
                    .map(|entry| {
                        let amount = Money::parse(&entry.amount, currency)?;
                        Ok((UserId::from(entry.user), amount))
                    })
                    .collect::<engine::ResultEngine<_>>()?,
            ),
            Self::Percentage { participants } => SplitSpec::Percentage(
                participants
                    .into_iter()
                    .map(|entry| {
                        let percent = entry.percent.parse::<Percent>()?;
                        Ok((UserId::from(entry.user), percent))
                    })
                    .collect::<engine::ResultEngine<_>>()?,
            ),
            Self::Shares { participants } => SplitSpec::Shares(
                participants
                    .into_iter()
                    .map(|entry| (UserId::from(entry.user), entry.shares))
                    .collect(),
            ),
        };
        Ok(spec)
    }
}

impl GroupFile {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Validates every record and loads it into a fresh ledger. The first
    /// invalid record aborts the load, naming its position in the file.
    pub fn into_ledger(self, default_currency: &str) -> Result<GroupLedger> {
        let code = self.currency.as_deref().unwrap_or(default_currency);
        let currency =
            Currency::try_from(code).map_err(|err| AppError::engine("currency", err))?;
        let mut ledger = GroupLedger::new(GroupId::new(), currency);

        for (index, input) in self.expenses.into_iter().enumerate() {
            let context = format!("expense #{} ({})", index + 1, input.description);
            load_expense(&mut ledger, input).map_err(|err| AppError::engine(context, err))?;
        }

        for (index, input) in self.payments.into_iter().enumerate() {
            load_payment(&mut ledger, input)
                .map_err(|err| AppError::engine(format!("payment #{}", index + 1), err))?;
        }

        tracing::info!(
            currency = %currency,
            expenses = ledger.expenses().len(),
            payments = ledger.payments().len(),
            "group loaded"
        );
        Ok(ledger)
    }
}

fn load_expense(ledger: &mut GroupLedger, input: ExpenseInput) -> engine::ResultEngine<()> {
    let currency = ledger.currency();
    let total = Money::parse(&input.amount, currency)?;
    let spec = input.split.into_spec(currency)?;
    ledger.create_expense(
        UserId::from(input.payer),
        total,
        &input.description,
        &spec,
        input.date,
    )?;
    Ok(())
}

fn load_payment(ledger: &mut GroupLedger, input: PaymentInput) -> engine::ResultEngine<()> {
    let amount = Money::parse(&input.amount, ledger.currency())?;
    let payment = Payment::new(
        ledger.group_id(),
        UserId::from(input.payer),
        UserId::from(input.recipient),
        amount,
        input.date,
    )?;
    ledger.record_payment(payment)?;
    Ok(())
}
