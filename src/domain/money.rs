//! Money types
//!
//! Domain primitives for monetary values held as integer minor units (cents).
//! Balances never pass through floating point; the only textual form is the
//! decimal string produced and parsed here with integer arithmetic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest absolute value accepted for any amount or balance (1 trillion units, in cents)
pub const MAX_CENTS: i64 = 100_000_000_000_000;

const CENTS_PER_UNIT: i64 = 100;

/// Errors that can occur when building or combining money values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0} cents)")]
    NotPositive(i64),

    #[error("Amount exceeds maximum allowed value ({MAX_CENTS} cents)")]
    Overflow,

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

/// Money is a signed amount of cents.
///
/// Account balances use it directly: they may be negative (credit lines).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Create money from cents, rejecting values outside `±MAX_CENTS`.
    pub fn from_cents(cents: i64) -> Result<Self, AmountError> {
        if cents.checked_abs().map_or(true, |abs| abs > MAX_CENTS) {
            return Err(AmountError::Overflow);
        }
        Ok(Self(cents))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Check if this value covers the given amount
    pub fn is_sufficient_for(&self, amount: &Amount) -> bool {
        self.0 >= amount.cents()
    }

    /// Add a positive amount
    pub fn credit(&self, amount: &Amount) -> Result<Money, AmountError> {
        let sum = self.0.checked_add(amount.cents()).ok_or(AmountError::Overflow)?;
        Money::from_cents(sum)
    }

    /// Subtract a positive amount; the result may be negative
    pub fn debit(&self, amount: &Amount) -> Result<Money, AmountError> {
        let difference = self.0.checked_sub(amount.cents()).ok_or(AmountError::Overflow)?;
        Money::from_cents(difference)
    }

    /// Signed difference `self - other`
    pub fn minus(&self, other: &Money) -> Result<Money, AmountError> {
        let difference = self.0.checked_sub(other.0).ok_or(AmountError::Overflow)?;
        Money::from_cents(difference)
    }

    /// Absolute value as an `Amount`, or `None` when zero
    pub fn magnitude(&self) -> Option<Amount> {
        Amount::new(self.0.abs()).ok()
    }

    /// Render as a decimal string with exactly two fractional digits (`-12.05`).
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_unit = CENTS_PER_UNIT as u64;
        format!("{}{}.{:02}", sign, abs / per_unit, abs % per_unit)
    }

    /// Parse a decimal string (`"12"`, `"12.5"`, `"-12.05"`) into cents without floating point.
    pub fn parse_decimal(input: &str) -> Result<Money, AmountError> {
        let parse_error = || AmountError::ParseError(input.to_string());
        let trimmed = input.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((_, "")) => return Err(parse_error()),
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        if whole.is_empty()
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || fraction.len() > 2
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(parse_error());
        }

        let units: i64 = whole.parse().map_err(|_| AmountError::Overflow)?;
        let fraction_cents: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| parse_error())? * 10,
            _ => fraction.parse().map_err(|_| parse_error())?,
        };

        let cents = units
            .checked_mul(CENTS_PER_UNIT)
            .and_then(|c| c.checked_add(fraction_cents))
            .ok_or(AmountError::Overflow)?;

        Money::from_cents(if negative { -cents } else { cents })
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl From<Amount> for Money {
    fn from(amount: Amount) -> Self {
        Money(amount.0)
    }
}

/// Amount represents a strictly positive number of cents.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - Value never exceeds `MAX_CENTS`
///
/// # Example
/// ```
/// use budget_core::domain::Amount;
///
/// let amount = Amount::new(2_000).unwrap();
/// assert_eq!(amount.cents(), 2_000);
/// assert!(Amount::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Amount(i64);

impl Amount {
    /// Create a new Amount with validation.
    pub fn new(cents: i64) -> Result<Self, AmountError> {
        if cents <= 0 {
            return Err(AmountError::NotPositive(cents));
        }
        if cents > MAX_CENTS {
            return Err(AmountError::Overflow);
        }
        Ok(Self(cents))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// The amount as a negative money value
    pub fn negated(&self) -> Money {
        Money(-self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Money::from(*self))
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let money = Money::parse_decimal(s)?;
        Amount::new(money.cents())
    }
}

impl TryFrom<i64> for Amount {
    type Error = AmountError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for i64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_positive() {
        let amount = Amount::new(100);
        assert_eq!(amount.unwrap().cents(), 100);
    }

    #[test]
    fn test_amount_zero_rejected() {
        assert!(matches!(Amount::new(0), Err(AmountError::NotPositive(0))));
    }

    #[test]
    fn test_amount_negative_rejected() {
        assert!(matches!(Amount::new(-5), Err(AmountError::NotPositive(-5))));
    }

    #[test]
    fn test_amount_overflow() {
        assert!(matches!(Amount::new(MAX_CENTS + 1), Err(AmountError::Overflow)));
        assert!(Amount::new(MAX_CENTS).is_ok());
    }

    #[test]
    fn test_amount_from_str() {
        let amount: Amount = "123.45".parse().unwrap();
        assert_eq!(amount.cents(), 12_345);

        let amount: Amount = "7.5".parse().unwrap();
        assert_eq!(amount.cents(), 750);

        assert!("0".parse::<Amount>().is_err());
        assert!("1.234".parse::<Amount>().is_err());
        assert!("abc".parse::<Amount>().is_err());
    }

    #[test]
    fn test_money_can_go_negative() {
        let balance = Money::from_cents(1_000).unwrap();
        let debited = balance.debit(&Amount::new(2_500).unwrap()).unwrap();
        assert_eq!(debited.cents(), -1_500);
        assert!(debited.is_negative());
    }

    #[test]
    fn test_money_credit_overflow() {
        let balance = Money::from_cents(MAX_CENTS).unwrap();
        let result = balance.credit(&Amount::new(1).unwrap());
        assert_eq!(result, Err(AmountError::Overflow));
    }

    #[test]
    fn test_decimal_string_rendering() {
        assert_eq!(Money::from_cents(0).unwrap().to_decimal_string(), "0.00");
        assert_eq!(Money::from_cents(5).unwrap().to_decimal_string(), "0.05");
        assert_eq!(Money::from_cents(-1_205).unwrap().to_decimal_string(), "-12.05");
        assert_eq!(Money::from_cents(100_000).unwrap().to_decimal_string(), "1000.00");
    }

    #[test]
    fn test_decimal_string_round_trip_edges() {
        // values that drift when divided by 100 in binary floating point
        for cents in [1, 10, 29, 57, 115, 1_005, 4_035, -7, -999_999, MAX_CENTS, -MAX_CENTS] {
            let money = Money::from_cents(cents).unwrap();
            let parsed = Money::parse_decimal(&money.to_decimal_string()).unwrap();
            assert_eq!(parsed, money, "round trip failed for {}", cents);
        }
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        for input in ["", "-", ".5", "1.", "1,00", "1e3", "--1", "12.345"] {
            assert!(Money::parse_decimal(input).is_err(), "accepted {:?}", input);
        }
    }

    #[test]
    fn test_magnitude() {
        assert_eq!(Money::from_cents(-300).unwrap().magnitude(), Some(Amount::new(300).unwrap()));
        assert_eq!(Money::ZERO.magnitude(), None);
    }
}
