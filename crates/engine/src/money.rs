use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use crate::EngineError;
use crate::policy::FULL_PERCENT_BP;

/// Signed money amount represented as **integer cents**.
///
/// Use this type for **all** monetary values in the engine (totals, shares,
/// tolerances) to avoid floating-point drift. Two decimals are the base
/// precision: every rounding step quantizes to cents with ties going up,
/// and amounts render with exactly two decimals and no currency symbol.
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// ```
///
/// Parsing from wire strings (accepts `.` or `,` as decimal separator;
/// rejects > 2 decimals):
///
/// ```rust
/// use engine::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().cents(), 1000);
/// assert_eq!("10,5".parse::<Money>().unwrap().cents(), 1050);
/// assert!("12.345".parse::<Money>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Checked multiplication by a scalar (returns `None` on overflow).
    #[must_use]
    pub fn checked_mul(self, factor: i64) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }

    /// Quantizes a decimal amount (e.g. `12.345` from a JSON payload) to
    /// cents, rounding halves away from zero.
    pub fn from_major_f64(value: f64) -> Result<Money, EngineError> {
        quantize_2dp(value)
            .map(Money)
            .ok_or_else(|| EngineError::InvalidRequest(format!("invalid amount: {value}")))
    }

    /// Divides into `count` parts, rounding half up.
    ///
    /// Returns `None` on a negative amount, a non-positive count, or when
    /// the quotient does not fit in an `i64`.
    pub(crate) fn div_round_half_up(self, count: i64) -> Option<Money> {
        if self.0 < 0 || count <= 0 {
            return None;
        }
        let twice = i128::from(self.0) * 2 + i128::from(count);
        i64::try_from(twice / (i128::from(count) * 2)).ok().map(Money)
    }

    /// Applies a percentage given in basis points (100.00% = 10 000),
    /// rounding half up. Returns `None` on negative inputs or overflow.
    pub(crate) fn percent_bp(self, bp: i64) -> Option<Money> {
        if self.0 < 0 || bp < 0 {
            return None;
        }
        let scaled = i128::from(self.0) * i128::from(bp) + i128::from(FULL_PERCENT_BP) / 2;
        i64::try_from(scaled / i128::from(FULL_PERCENT_BP)).ok().map(Money)
    }
}

/// Quantizes a float to two decimals, rounding halves away from zero.
///
/// Returns `None` when the value is not finite or falls outside the range
/// where an `f64` still holds integers exactly.
pub(crate) fn quantize_2dp(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let scaled = (value * 100.0).round();
    if scaled.abs() >= 9.0e15 {
        return None;
    }
    Some(scaled as i64)
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}{units}.{cents:02}")
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl FromStr for Money {
    type Err = EngineError;

    /// Parses a decimal string into cents.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidRequest(format!("invalid amount: {s:?}"));
        let overflow = || EngineError::InvalidRequest("amount too large".to_string());

        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        if unsigned.is_empty() {
            return Err(invalid());
        }

        let unsigned = unsigned.replace(',', ".");
        let (units_str, frac_str) = match unsigned.split_once('.') {
            Some((units, frac)) => (units, frac),
            None => (unsigned.as_str(), ""),
        };
        if units_str.is_empty() || !units_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac_str.len() > 2 || !frac_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let units: i64 = units_str.parse().map_err(|_| invalid())?;
        let cents: i64 = match frac_str.len() {
            0 => 0,
            1 => frac_str.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac_str.parse().map_err(|_| invalid())?,
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(overflow)?;
        let signed = if negative {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Money(signed))
    }
}
