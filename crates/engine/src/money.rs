use std::{
    fmt,
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};

/// Signed money amount represented as **integer cents**.
///
/// Balances and transaction magnitudes are stored as `Money` so that the
/// running totals never drift. Request payloads carry decimal numbers; they
/// are rounded to two places by [`validate_amount`] and converted with
/// [`Money::from_major`]. A single amount never exceeds [`Money::MAX_AMOUNT`]
/// in magnitude, and running totals use checked arithmetic.
///
/// The value is signed:
/// - positive = income / increase
/// - negative = expense / decrease
///
/// # Examples
///
/// ```rust
/// use engine::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// assert_eq!(Money::from_major(-0.5).map(Money::cents), Some(-50));
/// assert_eq!(Money::from_major(1e300), None);
/// ```
///
/// [`validate_amount`]: crate::validation::validate_amount
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);
    /// Largest magnitude a single amount may have: one trillion major units.
    pub const MAX_AMOUNT: Money = Money(100_000_000_000_000);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Converts a major-unit value (`12.34`) into cents, rounding to the
    /// nearest cent.
    ///
    /// Returns `None` for non-finite input and for magnitudes above
    /// [`Money::MAX_AMOUNT`].
    #[must_use]
    pub fn from_major(value: f64) -> Option<Self> {
        let cents = (value * 100.0).round();
        if !cents.is_finite() || cents.abs() > Self::MAX_AMOUNT.0 as f64 {
            return None;
        }
        Some(Self(cents as i64))
    }

    /// Returns the value in major units (`1234` cents -> `12.34`).
    #[must_use]
    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
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

    /// Returns `true` if the magnitude is at most [`Money::MAX_AMOUNT`].
    #[must_use]
    pub const fn is_within_limit(self) -> bool {
        self.0.unsigned_abs() <= Self::MAX_AMOUNT.0.unsigned_abs()
    }

    /// Absolute value (returns `None` for `i64::MIN`).
    #[must_use]
    pub const fn checked_abs(self) -> Option<Self> {
        match self.0.checked_abs() {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
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

    /// Checked negation (returns `None` for `i64::MIN`).
    #[must_use]
    pub fn checked_neg(self) -> Option<Money> {
        self.0.checked_neg().map(Money)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
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
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_two_decimals() {
        assert_eq!(Money::new(0).to_string(), "0.00");
        assert_eq!(Money::new(1).to_string(), "0.01");
        assert_eq!(Money::new(1050).to_string(), "10.50");
        assert_eq!(Money::new(-1050).to_string(), "-10.50");
    }

    #[test]
    fn from_major_rounds_to_cents() {
        assert_eq!(Money::from_major(12.35), Some(Money::new(1235)));
        assert_eq!(Money::from_major(0.1 + 0.2), Some(Money::new(30)));
        assert_eq!(Money::from_major(-20.0), Some(Money::new(-2000)));
        assert_eq!(Money::from_major(f64::NAN), None);
    }

    #[test]
    fn from_major_rejects_huge_values() {
        assert_eq!(Money::from_major(1e12), Some(Money::MAX_AMOUNT));
        assert_eq!(Money::from_major(-1e12), Some(-Money::MAX_AMOUNT));
        assert_eq!(Money::from_major(1e12 + 0.01), None);
        assert_eq!(Money::from_major(1e300), None);
        assert_eq!(Money::from_major(-1e300), None);
        assert_eq!(Money::from_major(f64::INFINITY), None);
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        let max = Money::new(i64::MAX);
        let min = Money::new(i64::MIN);
        assert_eq!(max.checked_add(Money::new(1)), None);
        assert_eq!(min.checked_sub(Money::new(1)), None);
        assert_eq!(min.checked_neg(), None);
        assert_eq!(min.checked_abs(), None);
        assert_eq!(Money::new(-7).checked_abs(), Some(Money::new(7)));
        assert!(!min.is_within_limit());
        assert!(Money::MAX_AMOUNT.is_within_limit());
    }

    #[test]
    fn sum_and_negation() {
        let total: Money = [Money::new(500), Money::new(-200), Money::new(25)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::new(325));
        assert_eq!(-total, Money::new(-325));
    }
}
