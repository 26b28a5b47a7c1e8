//! Settings loading
//!
//! The settings file is a YAML document listing the wallets to sweep. On first
//! run it does not exist yet: a template is written and the caller is told to
//! stop so the operator can fill it in.

use crate::types::{ConnectionOptions, PollPolicy, SendingOptions, WalletDispatchConfig};
use anyhow::{Context, Result, bail, ensure};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::info;
use url::Url;

const DEFAULT_DISPATCH_INTERVAL_SECONDS: u64 = 10 * 60;
const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub wallets: Vec<WalletDispatchConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch_interval_in_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for_transaction_to_confirm: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval_in_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_poll_attempts: Option<u32>,
}

impl Settings {
    /// Reads the settings at `path`.
    ///
    /// Returns `Ok(None)` after writing the default template when the file is
    /// missing; the process is expected to exit in that case.
    pub async fn load_or_init(path: &Path) -> Result<Option<Self>> {
        if !fs::try_exists(path)
            .await
            .with_context(|| format!("Failed to check {}", path.display()))?
        {
            Self::default_template().save(path).await?;
            info!("Default config written to {}, exiting ..", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(Some(settings))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize configuration")?;
        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write configuration file {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for wallet in &self.wallets {
            ensure!(
                names.insert(wallet.name.as_str()),
                "wallet name {:?} is used more than once",
                wallet.name
            );

            let zero = BigDecimal::from(0);
            let send_to = &wallet.destination;
            if let Some(fee) = &wallet.fee {
                ensure!(*fee >= zero, "{}: fee must not be negative", wallet.name);
            }
            if let Some(multiples_of) = &send_to.multiples_of {
                ensure!(
                    *multiples_of > zero,
                    "{}: multiplesOf must be greater than zero",
                    wallet.name
                );
            }
            if let Some(minimum) = &send_to.minimum_amount {
                ensure!(
                    *minimum >= zero,
                    "{}: minimumAmount must not be negative",
                    wallet.name
                );
            }
            if let Some(maximum) = &send_to.maximum_amount {
                ensure!(
                    *maximum > zero,
                    "{}: maximumAmount must be greater than zero",
                    wallet.name
                );
            }
            if send_to.address.trim().is_empty() {
                bail!("{}: sendTo.address is empty", wallet.name);
            }
        }
        Ok(())
    }

    pub fn wallets(&self) -> &[WalletDispatchConfig] {
        &self.wallets
    }

    pub fn enabled_wallets(&self) -> impl Iterator<Item = &WalletDispatchConfig> {
        self.wallets.iter().filter(|wallet| !wallet.disabled)
    }

    /// Zero or absent means the default of ten minutes.
    pub fn dispatch_interval(&self) -> Duration {
        let seconds = self
            .dispatch_interval_in_seconds
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_DISPATCH_INTERVAL_SECONDS);
        Duration::from_secs(seconds)
    }

    pub fn wait_for_transaction_to_confirm(&self) -> bool {
        self.wait_for_transaction_to_confirm.unwrap_or(true)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        let seconds = self
            .poll_interval_in_seconds
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECONDS);
        PollPolicy {
            interval: Duration::from_secs(seconds),
            max_attempts: self.max_poll_attempts,
        }
    }

    /// A single Chia wallet using the node's default certificate location.
    pub fn default_template() -> Self {
        let ssl_dir = home_dir()
            .join(".chia")
            .join("mainnet")
            .join("config")
            .join("ssl")
            .join("wallet");

        Self {
            wallets: vec![WalletDispatchConfig {
                name: "Chia".to_string(),
                ticker: "XCH".to_string(),
                disabled: false,
                connection: ConnectionOptions {
                    url: Url::parse("https://127.0.0.1:9256").expect("valid default url"),
                    cert_file_path: ssl_dir.join("private_wallet.crt"),
                    key_file_path: ssl_dir.join("private_wallet.key"),
                },
                destination: SendingOptions {
                    address: "xch1063ymlv3saaxkh87h287nc3laelnxss0897xdw6g8zj6yvaa4elslg0xfa"
                        .to_string(),
                    minimum_amount: None,
                    maximum_amount: None,
                    multiples_of: None,
                },
                decimal_places: 12,
                fee: None,
            }],
            dispatch_interval_in_seconds: None,
            wait_for_transaction_to_confirm: None,
            poll_interval_in_seconds: None,
            max_poll_attempts: None,
        }
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}
