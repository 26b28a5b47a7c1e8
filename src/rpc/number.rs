//! serde helpers for exact JSON numbers.
//!
//! serde_json is built with `arbitrary_precision`, so a [`Number`] keeps the
//! literal digits it was parsed from. These helpers move those digits into
//! `BigDecimal` (and back) without an `f64` in between.

use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::BigInt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Number;
use std::fmt::Display;
use std::str::FromStr;

/// Renders any decimal-like value as a JSON number literal.
pub fn to_number(value: &impl Display) -> Result<Number, serde_json::Error> {
    Number::from_str(&value.to_string())
}

fn parse(number: &Number) -> Result<BigDecimal, String> {
    BigDecimal::from_str(&number.to_string())
        .map_err(|e| format!("invalid decimal {number}: {e}"))
}

pub fn decimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    parse(&number).map_err(serde::de::Error::custom)
}

pub fn option_decimal<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Number>::deserialize(deserializer)?
        .map(|number| parse(&number).map_err(serde::de::Error::custom))
        .transpose()
}

pub fn serialize_integer<S>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    to_number(value)
        .map_err(serde::ser::Error::custom)?
        .serialize(serializer)
}
