//! Core data types for the Fund Dispatcher

use anyhow::{Result, bail};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub type Address = String;

/// One wallet node to sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletDispatchConfig {
    /// Unique; keys the per-wallet dispatch state.
    pub name: String,
    pub ticker: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    #[serde(rename = "connectionOptions")]
    pub connection: ConnectionOptions,
    #[serde(rename = "sendTo")]
    pub destination: SendingOptions,
    /// Digits between the human unit and the smallest on-chain unit.
    pub decimal_places: u32,
    /// Network fee in human units.
    #[serde(
        default,
        deserialize_with = "decimal_text::option",
        serialize_with = "decimal_text::serialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub fee: Option<BigDecimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionOptions {
    pub url: Url,
    pub cert_file_path: PathBuf,
    pub key_file_path: PathBuf,
}

/// Where swept funds go and how the amount is shaped. Amounts are human units.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendingOptions {
    pub address: Address,
    #[serde(
        default,
        deserialize_with = "decimal_text::option",
        serialize_with = "decimal_text::serialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub minimum_amount: Option<BigDecimal>,
    #[serde(
        default,
        deserialize_with = "decimal_text::option",
        serialize_with = "decimal_text::serialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub maximum_amount: Option<BigDecimal>,
    #[serde(
        default,
        deserialize_with = "decimal_text::option",
        serialize_with = "decimal_text::serialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub multiples_of: Option<BigDecimal>,
}

/// How long to keep re-polling the node while it syncs or a transaction confirms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// `None` polls until the condition holds.
    pub max_attempts: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_attempts: None,
        }
    }
}

impl PollPolicy {
    /// Sleeps one interval, or fails once `attempts` has used up the budget.
    pub async fn backoff(&self, attempts: &mut u32, waiting_for: &str) -> Result<()> {
        if let Some(max) = self.max_attempts {
            if *attempts >= max {
                bail!("gave up waiting for {} after {} polls", waiting_for, max);
            }
        }
        *attempts += 1;
        tokio::time::sleep(self.interval).await;
        Ok(())
    }
}

/// serde helpers for decimal settings.
///
/// YAML scalars are taken as their literal text, so `0.1` in the file is
/// exactly one tenth. Values are written back as plain numbers when a float
/// reproduces them exactly, and as strings otherwise.
mod decimal_text {
    use bigdecimal::BigDecimal;
    use serde::de::{self, Visitor};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::fmt;
    use std::str::FromStr;

    struct Decimal(BigDecimal);

    impl<'de> Deserialize<'de> for Decimal {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_str(DecimalVisitor).map(Decimal)
        }
    }

    struct DecimalVisitor;

    impl Visitor<'_> for DecimalVisitor {
        type Value = BigDecimal;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a decimal number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<BigDecimal, E> {
            BigDecimal::from_str(v.trim())
                .map_err(|e| E::custom(format!("invalid decimal {v:?}: {e}")))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<BigDecimal, E> {
            Ok(BigDecimal::from(v))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<BigDecimal, E> {
            Ok(BigDecimal::from(v))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<BigDecimal, E> {
            self.visit_str(&v.to_string())
        }
    }

    pub fn option<'de, D>(deserializer: D) -> Result<Option<BigDecimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Decimal>::deserialize(deserializer)?.map(|d| d.0))
    }

    pub fn serialize_option<S>(value: &Option<BigDecimal>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let Some(value) = value else {
            return serializer.serialize_none();
        };
        let text = value.to_plain_string();
        if let Ok(integer) = i64::from_str(&text) {
            return serializer.serialize_i64(integer);
        }
        match f64::from_str(&text) {
            Ok(float) if BigDecimal::from_str(&float.to_string()).ok().as_ref() == Some(value) => {
                serializer.serialize_f64(float)
            }
            _ => serializer.serialize_str(&text),
        }
    }
}
