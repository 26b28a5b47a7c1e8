//! Currency Amount
//!
//! Fixed-point amounts held as an integer count of the chain's smallest unit.
//! Conversions between the human unit and the smallest unit always name their
//! precision explicitly; nothing here goes through binary floating point.

use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::{BigInt, Sign};
use std::fmt;
use thiserror::Error;

/// Largest power of ten an amount may be scaled up by.
const MAX_SHIFT: u32 = 1024;

#[derive(Debug, Error)]
#[error("amount {value} at {decimal_places} decimal places is out of range")]
pub struct AmountOutOfRange {
    pub value: BigDecimal,
    pub decimal_places: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CurrencyAmount {
    smallest_units: BigInt,
}

impl CurrencyAmount {
    /// Builds an amount from a value that is already expressed in smallest units.
    /// Fractional input is floored, like `from(raw, 0)`.
    pub fn from_smallest_unit(raw: &BigDecimal) -> Result<Self, AmountOutOfRange> {
        Self::from(raw, 0)
    }

    /// Shifts `value` left by `decimal_places` digits and floors the result
    /// (toward negative infinity, so `-0.001` at 2 places becomes `-1`).
    ///
    /// Fails when the value would need to grow by more than 10^1024.
    pub fn from(value: &BigDecimal, decimal_places: u32) -> Result<Self, AmountOutOfRange> {
        let (digits, scale) = value.as_bigint_and_exponent();
        let shift = i128::from(decimal_places) - i128::from(scale);
        let out_of_range = || AmountOutOfRange {
            value: value.clone(),
            decimal_places,
        };

        let smallest_units = if shift >= 0 {
            let exponent = u32::try_from(shift)
                .ok()
                .filter(|exponent| *exponent <= MAX_SHIFT)
                .ok_or_else(out_of_range)?;
            digits * pow10(exponent)
        } else if shift.unsigned_abs() > u128::from(digits.bits()) {
            // |digits| < 2^bits <= 10^-shift
            if digits.sign() == Sign::Minus {
                BigInt::from(-1)
            } else {
                BigInt::from(0)
            }
        } else {
            let exponent = u32::try_from(shift.unsigned_abs()).map_err(|_| out_of_range())?;
            floor_div(&digits, &pow10(exponent))
        };

        Ok(Self { smallest_units })
    }

    /// Shifts the smallest-unit integer right by `decimal_places` digits.
    pub fn to(&self, decimal_places: u32) -> BigDecimal {
        BigDecimal::new(self.smallest_units.clone(), i64::from(decimal_places))
    }

    pub fn to_smallest_unit(&self) -> &BigInt {
        &self.smallest_units
    }

    pub fn is_positive(&self) -> bool {
        self.smallest_units.sign() == Sign::Plus
    }

    /// Renders the amount at the given precision, e.g. `"0.99"`.
    pub fn to_string_at(&self, decimal_places: u32) -> String {
        self.to(decimal_places).to_plain_string()
    }
}

impl fmt::Display for CurrencyAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.smallest_units)
    }
}

fn pow10(exponent: u32) -> BigInt {
    BigInt::from(10u32).pow(exponent)
}

/// Integer division rounding toward negative infinity. `divisor` is positive.
pub(crate) fn floor_div(dividend: &BigInt, divisor: &BigInt) -> BigInt {
    let quotient = dividend / divisor;
    let remainder = dividend % divisor;
    if remainder.sign() == Sign::Minus {
        quotient - BigInt::from(1)
    } else {
        quotient
    }
}
