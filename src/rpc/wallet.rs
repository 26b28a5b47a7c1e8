//! Wallet RPC Client
//!
//! Typed façade over the wallet node endpoints the dispatcher needs.

use super::number;
use super::{RpcClient, RpcError};
use crate::types::ConnectionOptions;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Sub-wallet kinds reported by `get_wallets`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "u8")]
pub enum WalletType {
    StandardWallet,
    RateLimited,
    AtomicSwap,
    AuthorizedPayee,
    MultiSig,
    Custody,
    Cat,
    Recoverable,
    DistributedId,
    PoolingWallet,
    Unknown(u8),
}

impl From<u8> for WalletType {
    fn from(value: u8) -> Self {
        match value {
            0 => WalletType::StandardWallet,
            1 => WalletType::RateLimited,
            2 => WalletType::AtomicSwap,
            3 => WalletType::AuthorizedPayee,
            4 => WalletType::MultiSig,
            5 => WalletType::Custody,
            6 => WalletType::Cat,
            7 => WalletType::Recoverable,
            8 => WalletType::DistributedId,
            9 => WalletType::PoolingWallet,
            other => WalletType::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SyncStatus {
    pub syncing: bool,
    pub synced: bool,
}

impl SyncStatus {
    pub fn is_synced(&self) -> bool {
        !self.syncing && self.synced
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WalletInfo {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub wallet_type: WalletType,
    #[serde(default)]
    pub data: String,
}

/// Balances in smallest units.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WalletBalance {
    pub wallet_id: u32,
    #[serde(deserialize_with = "number::decimal")]
    pub confirmed_wallet_balance: BigDecimal,
    #[serde(deserialize_with = "number::decimal")]
    pub unconfirmed_wallet_balance: BigDecimal,
    #[serde(deserialize_with = "number::decimal")]
    pub spendable_balance: BigDecimal,
    #[serde(default, deserialize_with = "number::option_decimal")]
    pub max_send_amount: Option<BigDecimal>,
    #[serde(default, deserialize_with = "number::option_decimal")]
    pub pending_change: Option<BigDecimal>,
    #[serde(default)]
    pub unspent_coin_count: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transaction {
    /// Filled from the `transaction_id` next to the record.
    #[serde(skip)]
    pub id: String,
    pub confirmed: bool,
    #[serde(default)]
    pub confirmed_at_height: u64,
    #[serde(default)]
    pub created_at_time: u64,
    #[serde(default)]
    pub to_address: String,
    #[serde(default, deserialize_with = "number::option_decimal")]
    pub amount: Option<BigDecimal>,
    #[serde(default, deserialize_with = "number::option_decimal")]
    pub fee_amount: Option<BigDecimal>,
    #[serde(default)]
    pub wallet_id: u32,
}

/// `send_transaction` parameters; `amount` and `fee` are smallest units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendTransaction {
    pub wallet_id: u32,
    pub address: String,
    #[serde(serialize_with = "number::serialize_integer")]
    pub amount: BigInt,
    #[serde(serialize_with = "number::serialize_integer")]
    pub fee: BigInt,
}

#[derive(Serialize)]
struct NoParams {}

#[derive(Serialize)]
struct GetBalanceParams {
    wallet_id: u32,
}

#[derive(Serialize)]
struct GetTransactionParams<'a> {
    transaction_id: &'a str,
}

#[derive(Deserialize)]
struct WalletsResponse {
    wallets: Vec<WalletInfo>,
}

#[derive(Deserialize)]
struct WalletBalanceResponse {
    wallet_balance: WalletBalance,
}

#[derive(Deserialize)]
struct TransactionResponse {
    transaction: Transaction,
    transaction_id: String,
}

impl TransactionResponse {
    fn into_transaction(self) -> Transaction {
        Transaction {
            id: self.transaction_id,
            ..self.transaction
        }
    }
}

/// Operations the dispatcher performs against a wallet node.
#[async_trait]
pub trait WalletRpc: Send + Sync {
    async fn get_sync_status(&self) -> Result<SyncStatus, RpcError>;

    async fn get_wallets(&self) -> Result<Vec<WalletInfo>, RpcError>;

    async fn get_balance(&self, wallet_id: u32) -> Result<WalletBalance, RpcError>;

    async fn get_transaction(&self, transaction_id: &str) -> Result<Transaction, RpcError>;

    async fn send_transaction(&self, request: &SendTransaction) -> Result<Transaction, RpcError>;

    /// Liveness probe. Never fails; any error means "not reachable".
    async fn is_reachable(&self) -> bool {
        self.get_sync_status().await.is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct WalletClient {
    rpc: RpcClient,
}

impl WalletClient {
    pub fn connect(options: &ConnectionOptions) -> Result<Self, RpcError> {
        Ok(Self {
            rpc: RpcClient::connect(options)?,
        })
    }

    pub fn with_http_client(base_url: Url, http: reqwest::Client) -> Self {
        Self {
            rpc: RpcClient::with_http_client(base_url, http),
        }
    }
}

#[async_trait]
impl WalletRpc for WalletClient {
    async fn get_sync_status(&self) -> Result<SyncStatus, RpcError> {
        self.rpc.request("get_sync_status", &NoParams {}).await
    }

    async fn get_wallets(&self) -> Result<Vec<WalletInfo>, RpcError> {
        let resp: WalletsResponse = self.rpc.request("get_wallets", &NoParams {}).await?;
        Ok(resp.wallets)
    }

    async fn get_balance(&self, wallet_id: u32) -> Result<WalletBalance, RpcError> {
        let resp: WalletBalanceResponse = self
            .rpc
            .request("get_wallet_balance", &GetBalanceParams { wallet_id })
            .await?;
        Ok(resp.wallet_balance)
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<Transaction, RpcError> {
        let resp: TransactionResponse = self
            .rpc
            .request("get_transaction", &GetTransactionParams { transaction_id })
            .await?;
        Ok(resp.into_transaction())
    }

    async fn send_transaction(&self, request: &SendTransaction) -> Result<Transaction, RpcError> {
        let resp: TransactionResponse = self.rpc.request("send_transaction", request).await?;
        Ok(resp.into_transaction())
    }
}

/// Opens a [`WalletRpc`] handle for a configured connection.
pub trait WalletConnector: Send + Sync {
    fn connect(&self, options: &ConnectionOptions) -> Result<Arc<dyn WalletRpc>, RpcError>;
}

/// Connects over HTTPS with the configured client certificate.
#[derive(Debug, Default, Clone, Copy)]
pub struct MutualTlsConnector;

impl WalletConnector for MutualTlsConnector {
    fn connect(&self, options: &ConnectionOptions) -> Result<Arc<dyn WalletRpc>, RpcError> {
        Ok(Arc::new(WalletClient::connect(options)?))
    }
}
