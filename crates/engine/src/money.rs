use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

use crate::{Currency, EngineError, ResultEngine, util::ensure_same_currency};

/// Signed money amount represented as **integer minor units** plus the
/// currency they belong to.
///
/// Use this type for **all** monetary values in the engine (expense totals,
/// owed amounts, balances, transfers) to avoid floating-point drift. There is
/// no conversion from or to `f64`.
///
/// The value is signed; in a balance:
/// - positive = is owed money
/// - negative = owes money
///
/// Arithmetic between two values requires the same currency and never wraps:
/// every operation is checked and returns
/// [`CurrencyMismatch`](EngineError::CurrencyMismatch) or
/// [`Overflow`](EngineError::Overflow).
///
/// # Examples
///
/// ```rust
/// use engine::{Currency, Money};
///
/// let amount = Money::new(12_34, Currency::Eur);
/// assert_eq!(amount.minor_units(), 1234);
/// assert_eq!(amount.to_string(), "12.34 EUR");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects
/// more decimals than the currency has):
///
/// ```rust
/// use engine::{Currency, Money};
///
/// assert_eq!(Money::parse("10", Currency::Eur).unwrap().minor_units(), 1000);
/// assert_eq!(Money::parse("10,5", Currency::Eur).unwrap().minor_units(), 1050);
/// assert!(Money::parse("12.345", Currency::Eur).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    minor_units: i64,
    currency: Currency,
}

impl Money {
    /// Creates a new amount from integer minor units.
    #[must_use]
    pub const fn new(minor_units: i64, currency: Currency) -> Self {
        Self {
            minor_units,
            currency,
        }
    }

    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self::new(0, currency)
    }

    /// Returns the raw value in minor units.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.minor_units
    }

    #[must_use]
    pub const fn currency(self) -> Currency {
        self.currency
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.minor_units == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.minor_units > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.minor_units < 0
    }

    /// Fails with `CurrencyMismatch` unless `other` uses the same currency.
    pub fn ensure_currency(self, other: Currency) -> ResultEngine<()> {
        ensure_same_currency(self.currency, other)
    }

    pub fn add(self, rhs: Money) -> ResultEngine<Money> {
        self.ensure_currency(rhs.currency)?;
        self.minor_units
            .checked_add(rhs.minor_units)
            .map(|value| Money::new(value, self.currency))
            .ok_or(EngineError::Overflow)
    }

    pub fn subtract(self, rhs: Money) -> ResultEngine<Money> {
        self.ensure_currency(rhs.currency)?;
        self.minor_units
            .checked_sub(rhs.minor_units)
            .map(|value| Money::new(value, self.currency))
            .ok_or(EngineError::Overflow)
    }

    pub fn negate(self) -> ResultEngine<Money> {
        self.minor_units
            .checked_neg()
            .map(|value| Money::new(value, self.currency))
            .ok_or(EngineError::Overflow)
    }

    pub fn abs(self) -> ResultEngine<Money> {
        self.minor_units
            .checked_abs()
            .map(|value| Money::new(value, self.currency))
            .ok_or(EngineError::Overflow)
    }

    /// Orders two amounts of the same currency.
    pub fn compare(self, rhs: Money) -> ResultEngine<Ordering> {
        self.ensure_currency(rhs.currency)?;
        Ok(self.minor_units.cmp(&rhs.minor_units))
    }

    /// Checked sum of `values`; an empty iterator sums to zero in `currency`.
    pub fn sum<I>(values: I, currency: Currency) -> ResultEngine<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        values
            .into_iter()
            .try_fold(Money::zero(currency), |acc, value| acc.add(value))
    }

    /// Splits `self` into `weights.len()` parts proportional to `weights`.
    ///
    /// The parts always sum to `self` exactly. Each part first gets the floor
    /// of its exact share; the minor units left over by integer division go
    /// one each to the parts with the largest fractional remainder, earliest
    /// index first on ties (largest-remainder method). With equal weights
    /// that means the first participants listed receive the extra unit.
    ///
    /// ```rust
    /// use engine::{Currency, Money};
    ///
    /// let parts = Money::new(100_00, Currency::Eur)
    ///     .distribute_proportionally(&[1, 1, 1])
    ///     .unwrap();
    /// let parts: Vec<i64> = parts.iter().map(|m| m.minor_units()).collect();
    /// assert_eq!(parts, vec![33_34, 33_33, 33_33]);
    /// ```
    ///
    /// Weights must be non-negative with a positive sum; a zero weight gets
    /// a zero part.
    pub fn distribute_proportionally(self, weights: &[i64]) -> ResultEngine<Vec<Money>> {
        if weights.is_empty() {
            return Err(EngineError::InvalidWeights("no weights given".to_string()));
        }
        if weights.iter().any(|weight| *weight < 0) {
            return Err(EngineError::InvalidWeights(
                "weights must not be negative".to_string(),
            ));
        }
        let weight_total: i128 = weights.iter().map(|weight| i128::from(*weight)).sum();
        if weight_total == 0 {
            return Err(EngineError::InvalidWeights(
                "weights sum to zero".to_string(),
            ));
        }

        let sign: i128 = if self.minor_units < 0 { -1 } else { 1 };
        let magnitude = i128::from(self.minor_units).abs();

        let mut parts: Vec<i128> = Vec::with_capacity(weights.len());
        let mut remainders: Vec<(i128, usize)> = Vec::with_capacity(weights.len());
        for (index, weight) in weights.iter().enumerate() {
            let exact = magnitude * i128::from(*weight);
            parts.push(exact / weight_total);
            remainders.push((exact % weight_total, index));
        }

        let allocated: i128 = parts.iter().sum();
        let leftover = usize::try_from(magnitude - allocated).map_err(|_| EngineError::Overflow)?;

        // Largest remainder first, then list order.
        remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        for (_, index) in remainders.iter().take(leftover) {
            parts[*index] += 1;
        }

        parts
            .into_iter()
            .map(|part| {
                i64::try_from(part * sign)
                    .map(|value| Money::new(value, self.currency))
                    .map_err(|_| EngineError::Overflow)
            })
            .collect()
    }

    /// Parses a decimal string in major units into minor units of
    /// `currency`.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    ///
    /// Validation rules:
    /// - at most `currency.minor_units()` fractional digits
    /// - rejects empty/invalid strings
    pub fn parse(s: &str, currency: Currency) -> ResultEngine<Money> {
        let empty = || EngineError::InvalidAmount("empty amount".to_string());
        let invalid = || EngineError::InvalidAmount(format!("invalid amount: {s}"));

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let major_str = parts.next().ok_or_else(invalid)?;
        let fraction_str = parts.next().unwrap_or("");

        if parts.next().is_some() {
            return Err(invalid());
        }
        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if !fraction_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let digits = usize::from(currency.minor_units());
        if fraction_str.len() > digits {
            return Err(EngineError::InvalidAmount(format!(
                "too many decimals for {currency}: {s}"
            )));
        }

        let major: i64 = major_str.parse().map_err(|_| EngineError::Overflow)?;
        let minor: i64 = if fraction_str.is_empty() {
            0
        } else {
            let padded = format!("{fraction_str:0<digits$}");
            padded.parse().map_err(|_| invalid())?
        };

        let total = major
            .checked_mul(currency.scale())
            .and_then(|value| value.checked_add(minor))
            .ok_or(EngineError::Overflow)?;

        Ok(Money::new(if negative { -total } else { total }, currency))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minor_units < 0 { "-" } else { "" };
        let abs = self.minor_units.unsigned_abs();
        let digits = usize::from(self.currency.minor_units());
        let scale = self.currency.scale().unsigned_abs();
        if digits == 0 {
            return write!(f, "{sign}{abs} {}", self.currency);
        }
        let major = abs / scale;
        let minor = abs % scale;
        write!(f, "{sign}{major}.{minor:0digits$} {}", self.currency)
    }
}
