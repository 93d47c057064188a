//! Lossless decimal numeric type backed by rust_decimal.
//!
//! Fixed-point values read from program logs convert exactly, and the ledger
//! stores decimals as canonical strings without exponent notation.

use rust_decimal::Decimal as RustDecimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Scale of base-asset sizes and prices in program logs (1e9).
pub const BASE_SCALE: u32 = 9;
/// Scale of quote-currency (USDC) amounts in program logs (1e6).
pub const QUOTE_SCALE: u32 = 6;
/// Scale of native SOL amounts (lamports, 1e9).
pub const LAMPORT_SCALE: u32 = 9;

/// Lossless decimal numeric type for ledger calculations.
///
/// Serializes to JSON number (not string) by default.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Decimal(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Decimal {
    /// Create a Decimal from a RustDecimal.
    pub fn new(value: RustDecimal) -> Self {
        Decimal(value)
    }

    /// Convert a raw fixed-point integer, i.e. `raw / 10^scale`.
    pub fn from_fixed(raw: i64, scale: u32) -> Self {
        Decimal(RustDecimal::new(raw, scale))
    }

    /// Convert a lamport amount to SOL.
    pub fn from_lamports(lamports: u64) -> Self {
        Decimal(RustDecimal::from(lamports) / RustDecimal::from(10u64.pow(LAMPORT_SCALE)))
    }

    /// Parse a Decimal from a string losslessly.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Decimal)
    }

    /// Format the Decimal as a canonical string (no exponent notation).
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    /// Get the underlying RustDecimal.
    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    /// The additive identity (0).
    pub fn zero() -> Self {
        Decimal(RustDecimal::ZERO)
    }

    /// Returns true if the value is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the value is > 0.
    pub fn is_positive(&self) -> bool {
        !self.is_zero() && self.0.is_sign_positive()
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Decimal(self.0.abs())
    }

    /// Smaller of two values.
    pub fn min(self, other: Decimal) -> Decimal {
        if other < self {
            other
        } else {
            self
        }
    }

    /// Division returning None for a zero divisor or overflow.
    pub fn checked_div(self, rhs: Decimal) -> Option<Decimal> {
        self.0.checked_div(rhs.0).map(Decimal)
    }

    /// True when `|self - other| < epsilon`.
    pub fn approx_eq(&self, other: Decimal, epsilon: Decimal) -> bool {
        (*self - other).abs() < epsilon
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Decimal {
    fn from(value: RustDecimal) -> Self {
        Decimal(value)
    }
}

impl From<u64> for Decimal {
    fn from(value: u64) -> Self {
        Decimal(RustDecimal::from(value))
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;

    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;

    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;

    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

impl std::ops::Div for Decimal {
    type Output = Decimal;

    fn div(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 / rhs.0)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;

    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

impl std::iter::Sum for Decimal {
    fn sum<I: Iterator<Item = Decimal>>(iter: I) -> Self {
        iter.fold(Decimal::zero(), |acc, d| acc + d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_from_fixed_is_exact() {
        assert_eq!(Decimal::from_fixed(1_500_000_000, BASE_SCALE), d("1.5"));
        assert_eq!(Decimal::from_fixed(-250_000, QUOTE_SCALE), d("-0.25"));
        assert_eq!(Decimal::from_fixed(1, BASE_SCALE).to_canonical_string(), "0.000000001");
    }

    #[test]
    fn test_from_lamports() {
        assert_eq!(Decimal::from_lamports(5000), d("0.000005"));
        assert_eq!(Decimal::from_lamports(0), Decimal::zero());
    }

    #[test]
    fn test_canonical_string_strips_trailing_zeros() {
        assert_eq!(d("3.000").to_canonical_string(), "3");
        assert_eq!(d("0.0100").to_canonical_string(), "0.01");
        assert!(!d("123").to_canonical_string().contains('e'));
    }

    #[test]
    fn test_arithmetic() {
        let a = d("10.5");
        let b = d("2.5");
        assert_eq!((a + b).to_canonical_string(), "13");
        assert_eq!((a - b).to_canonical_string(), "8");
        assert_eq!((a * b).to_canonical_string(), "26.25");
        assert_eq!((a / b).to_canonical_string(), "4.2");
        assert_eq!(vec![a, b, -a].into_iter().sum::<Decimal>(), b);
    }

    #[test]
    fn test_min_and_checked_div() {
        assert_eq!(d("2").min(d("5")), d("2"));
        assert_eq!(d("5").min(d("2")), d("2"));
        assert_eq!(d("1").checked_div(Decimal::zero()), None);
        assert_eq!(d("1").checked_div(d("4")), Some(d("0.25")));
    }

    #[test]
    fn test_approx_eq() {
        let eps = d("0.000000001");
        assert!(d("2").approx_eq(d("2.0000000001"), eps));
        assert!(!d("2").approx_eq(d("2.00000001"), eps));
    }

    #[test]
    fn test_json_serialization_is_number() {
        let json = serde_json::to_value(d("123.456")).unwrap();
        assert!(json.is_number());
        assert_eq!(json.to_string(), "123.456");
    }
}
