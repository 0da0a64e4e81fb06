use std::fmt;

use crate::{EngineError, Money};
use crate::money::quantize_2dp;

/// Basis points in 100%. Percentages carry two decimals, so 40.00% = 4 000.
pub(crate) const FULL_PERCENT_BP: i64 = 10_000;

/// Rule governing how a total is divided among participants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SplitPolicy {
    /// Even shares; the last participant in order absorbs the rounding
    /// remainder so the shares always reconcile with the total.
    Equal,
    /// Shares proportional to declared percentages of the total.
    Percentage,
    /// Caller-specified absolute amounts.
    Exact,
}

impl SplitPolicy {
    /// Canonical wire name of the policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SplitPolicy::Equal => "equal",
            SplitPolicy::Percentage => "percentage",
            SplitPolicy::Exact => "exact",
        }
    }
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SplitPolicy {
    type Error = EngineError;

    /// Parses a wire name, ignoring surrounding whitespace and case.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "equal" => Ok(SplitPolicy::Equal),
            "percentage" => Ok(SplitPolicy::Percentage),
            "exact" => Ok(SplitPolicy::Exact),
            other => Err(EngineError::InvalidRequest(format!(
                "unsupported split policy: {other:?}"
            ))),
        }
    }
}

/// A participant's declared share of a split.
///
/// `Percentage` requests carry [`SplitValue::Percent`], `Exact` requests
/// carry [`SplitValue::Amount`]. `Equal` requests carry none.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitValue {
    /// Percentage of the total, in basis points (40.00% = 4 000).
    Percent(i64),
    /// Absolute amount owed.
    Amount(Money),
}

impl SplitValue {
    /// Quantizes a percentage from the wire (e.g. `40.0`) to basis points.
    pub fn percent_from_f64(value: f64) -> Result<SplitValue, EngineError> {
        quantize_2dp(value)
            .map(SplitValue::Percent)
            .ok_or_else(|| EngineError::InvalidRequest(format!("invalid percentage: {value}")))
    }

    /// Quantizes an amount from the wire (e.g. `12.5`) to cents.
    pub fn amount_from_f64(value: f64) -> Result<SplitValue, EngineError> {
        Money::from_major_f64(value).map(SplitValue::Amount)
    }
}

/// Renders basis points as a percentage with two decimals, e.g. `40.00`.
pub(crate) fn format_bp(bp: i64) -> String {
    let sign = if bp < 0 { "-" } else { "" };
    let abs = bp.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}
