use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// A percentage stored as an integer number of hundredths of a percent.
///
/// `100.00%` is `Percent::from_basis_points(10_000)`. Keeping the value in
/// integers makes the "percentages must sum to exactly 100" rule exact:
/// `99.99` and `100.01` are different values from `100.00`, with no float
/// epsilon involved.
///
/// ```rust
/// use engine::Percent;
///
/// let p: Percent = "33.5".parse().unwrap();
/// assert_eq!(p.basis_points(), 3_350);
/// assert_eq!(p.to_string(), "33.50%");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(i64);

impl Percent {
    pub const ZERO: Percent = Percent(0);
    pub const HUNDRED: Percent = Percent(10_000);

    #[must_use]
    pub const fn from_basis_points(basis_points: i64) -> Self {
        Self(basis_points)
    }

    /// Whole percent, e.g. `Percent::whole(50)` is `50.00%`. Saturates at
    /// the `i64` bounds; parse untrusted input with `str::parse` instead.
    #[must_use]
    pub const fn whole(percent: i64) -> Self {
        Self(percent.saturating_mul(100))
    }

    #[must_use]
    pub const fn basis_points(self) -> i64 {
        self.0
    }

    /// `true` when the value lies within `0.00..=100.00`.
    #[must_use]
    pub const fn is_valid_share(self) -> bool {
        self.0 >= 0 && self.0 <= Self::HUNDRED.0
    }

    pub(crate) fn checked_add(self, rhs: Percent) -> ResultEngine<Percent> {
        self.0
            .checked_add(rhs.0)
            .map(Percent)
            .ok_or(EngineError::Overflow)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}%", abs / 100, abs % 100)
    }
}

impl std::str::FromStr for Percent {
    type Err = EngineError;

    /// Parses `"50"`, `"+33.5"`, `"12,25"` or `"20%"`; at most two decimals.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(format!("invalid percentage: {s}"));

        let trimmed = s.trim();
        let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.replace(',', ".");
        let (whole_str, fraction_str) = rest.split_once('.').unwrap_or((rest.as_str(), ""));
        if whole_str.is_empty()
            || !whole_str.chars().all(|c| c.is_ascii_digit())
            || !fraction_str.chars().all(|c| c.is_ascii_digit())
            || fraction_str.len() > 2
        {
            return Err(invalid());
        }

        let whole: i64 = whole_str.parse().map_err(|_| EngineError::Overflow)?;
        let fraction: i64 = if fraction_str.is_empty() {
            0
        } else {
            format!("{fraction_str:0<2}").parse().map_err(|_| invalid())?
        };
        let value = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(fraction))
            .ok_or(EngineError::Overflow)?;

        Ok(Percent(if negative { -value } else { value }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_common_forms() {
        let parse = |s: &str| s.parse::<Percent>().unwrap().basis_points();
        assert_eq!(parse("50"), 5_000);
        assert_eq!(parse("33.5"), 3_350);
        assert_eq!(parse("12,25"), 1_225);
        assert_eq!(parse("20%"), 2_000);
        assert_eq!(parse("-1"), -100);
        assert_eq!(parse("+50"), 5_000);
        assert_eq!(parse("+12.5%"), 1_250);
    }

    #[test]
    fn parse_rejects_invalid_input() {
        assert!("".parse::<Percent>().is_err());
        assert!("1.234".parse::<Percent>().is_err());
        assert!("a5".parse::<Percent>().is_err());
        assert!("1.2.3".parse::<Percent>().is_err());
        assert!("- 5".parse::<Percent>().is_err());
        assert!("+-5".parse::<Percent>().is_err());
    }

    #[test]
    fn whole_saturates_instead_of_overflowing() {
        assert_eq!(Percent::whole(i64::MAX).basis_points(), i64::MAX);
        assert_eq!(Percent::whole(i64::MIN).basis_points(), i64::MIN);
    }

    #[test]
    fn display_uses_two_decimals() {
        assert_eq!(Percent::whole(99).to_string(), "99.00%");
        assert_eq!(Percent::from_basis_points(9_999).to_string(), "99.99%");
        assert_eq!(Percent::from_basis_points(-50).to_string(), "-0.50%");
    }

    #[test]
    fn valid_share_range() {
        assert!(Percent::ZERO.is_valid_share());
        assert!(Percent::HUNDRED.is_valid_share());
        assert!(!Percent::from_basis_points(10_001).is_valid_share());
        assert!(!Percent::from_basis_points(-1).is_valid_share());
    }
}
