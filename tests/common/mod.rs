#![allow(dead_code)]

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use fund_dispatcher::config::Settings;
use fund_dispatcher::rpc::{
    RpcError, SendTransaction, SyncStatus, Transaction, WalletBalance, WalletConnector, WalletInfo,
    WalletRpc, WalletType,
};
use fund_dispatcher::types::{ConnectionOptions, SendingOptions, WalletDispatchConfig};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub const DESTINATION: &str = "xch1destinationaddress0000000000000000000000000000000000000";

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

/// In-memory wallet node.
pub struct MockWallet {
    pub reachable: AtomicBool,
    sync_statuses: Mutex<VecDeque<SyncStatus>>,
    wallets: Mutex<Vec<WalletInfo>>,
    spendable: Mutex<BigDecimal>,
    unconfirmed_polls: AtomicU32,
    send_delay: Mutex<Option<Duration>>,
    fail_balance: AtomicBool,
    in_flight_sends: AtomicUsize,
    pub max_in_flight_sends: AtomicUsize,
    calls: Mutex<Vec<&'static str>>,
    sends: Mutex<Vec<SendTransaction>>,
}

impl MockWallet {
    pub fn new(spendable: &str) -> Arc<Self> {
        Arc::new(Self {
            reachable: AtomicBool::new(true),
            sync_statuses: Mutex::new(VecDeque::new()),
            wallets: Mutex::new(vec![
                WalletInfo {
                    id: 2,
                    name: "CAT".to_string(),
                    wallet_type: WalletType::Cat,
                    data: String::new(),
                },
                WalletInfo {
                    id: 1,
                    name: "Chia Wallet".to_string(),
                    wallet_type: WalletType::StandardWallet,
                    data: String::new(),
                },
            ]),
            spendable: Mutex::new(dec(spendable)),
            unconfirmed_polls: AtomicU32::new(0),
            send_delay: Mutex::new(None),
            fail_balance: AtomicBool::new(false),
            in_flight_sends: AtomicUsize::new(0),
            max_in_flight_sends: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            sends: Mutex::new(Vec::new()),
        })
    }

    /// Statuses returned by successive `get_sync_status` calls; synced afterwards.
    pub fn with_sync_statuses(self: Arc<Self>, statuses: Vec<SyncStatus>) -> Arc<Self> {
        *self.sync_statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn with_wallets(self: Arc<Self>, wallets: Vec<WalletInfo>) -> Arc<Self> {
        *self.wallets.lock().unwrap() = wallets;
        self
    }

    /// Number of `get_transaction` answers that still report unconfirmed.
    pub fn with_unconfirmed_polls(self: Arc<Self>, polls: u32) -> Arc<Self> {
        self.unconfirmed_polls.store(polls, Ordering::SeqCst);
        self
    }

    pub fn with_send_delay(self: Arc<Self>, delay: Duration) -> Arc<Self> {
        *self.send_delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn failing_balance(self: Arc<Self>) -> Arc<Self> {
        self.fail_balance.store(true, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls().iter().filter(|m| **m == method).count()
    }

    pub fn sends(&self) -> Vec<SendTransaction> {
        self.sends.lock().unwrap().clone()
    }

    fn record(&self, method: &'static str) {
        self.calls.lock().unwrap().push(method);
    }
}

pub fn syncing() -> SyncStatus {
    SyncStatus {
        syncing: true,
        synced: false,
    }
}

pub fn synced() -> SyncStatus {
    SyncStatus {
        syncing: false,
        synced: true,
    }
}

fn transaction(id: &str, confirmed: bool) -> Transaction {
    Transaction {
        id: id.to_string(),
        confirmed,
        confirmed_at_height: if confirmed { 100 } else { 0 },
        created_at_time: 0,
        to_address: DESTINATION.to_string(),
        amount: None,
        fee_amount: None,
        wallet_id: 1,
    }
}

#[async_trait]
impl WalletRpc for MockWallet {
    async fn get_sync_status(&self) -> Result<SyncStatus, RpcError> {
        self.record("get_sync_status");
        Ok(self
            .sync_statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(synced))
    }

    async fn get_wallets(&self) -> Result<Vec<WalletInfo>, RpcError> {
        self.record("get_wallets");
        Ok(self.wallets.lock().unwrap().clone())
    }

    async fn get_balance(&self, wallet_id: u32) -> Result<WalletBalance, RpcError> {
        self.record("get_wallet_balance");
        if self.fail_balance.load(Ordering::SeqCst) {
            return Err(RpcError::Rpc {
                method: "get_wallet_balance".to_string(),
                message: "wallet is locked".to_string(),
            });
        }
        let spendable = self.spendable.lock().unwrap().clone();
        Ok(WalletBalance {
            wallet_id,
            confirmed_wallet_balance: spendable.clone(),
            unconfirmed_wallet_balance: spendable.clone(),
            spendable_balance: spendable.clone(),
            max_send_amount: Some(spendable),
            pending_change: None,
            unspent_coin_count: 1,
        })
    }

    async fn get_transaction(&self, transaction_id: &str) -> Result<Transaction, RpcError> {
        self.record("get_transaction");
        let pending = self.unconfirmed_polls.load(Ordering::SeqCst);
        if pending > 0 {
            self.unconfirmed_polls.store(pending - 1, Ordering::SeqCst);
        }
        Ok(transaction(transaction_id, pending == 0))
    }

    async fn send_transaction(&self, request: &SendTransaction) -> Result<Transaction, RpcError> {
        self.record("send_transaction");
        let in_flight = self.in_flight_sends.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight_sends.fetch_max(in_flight, Ordering::SeqCst);

        let delay = *self.send_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.sends.lock().unwrap().push(request.clone());
        self.in_flight_sends.fetch_sub(1, Ordering::SeqCst);
        Ok(transaction("0xabc123", false))
    }

    async fn is_reachable(&self) -> bool {
        self.record("is_reachable");
        self.reachable.load(Ordering::SeqCst)
    }
}

/// Hands out mock wallets by connection URL.
#[derive(Default)]
pub struct MockConnector {
    wallets: HashMap<String, Arc<MockWallet>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, wallet: Arc<MockWallet>) -> Self {
        self.wallets.insert(Url::parse(url).unwrap().to_string(), wallet);
        self
    }
}

impl WalletConnector for MockConnector {
    fn connect(&self, options: &ConnectionOptions) -> Result<Arc<dyn WalletRpc>, RpcError> {
        match self.wallets.get(options.url.as_str()) {
            Some(wallet) => Ok(wallet.clone()),
            None => Err(RpcError::Identity {
                path: options.cert_file_path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            }),
        }
    }
}

/// Twelve decimal places, 0.0001 fee, rounded to 0.01, at least 0.05.
pub fn wallet_config(name: &str, url: &str) -> WalletDispatchConfig {
    WalletDispatchConfig {
        name: name.to_string(),
        ticker: "XCH".to_string(),
        disabled: false,
        connection: ConnectionOptions {
            url: Url::parse(url).unwrap(),
            cert_file_path: "/nonexistent/private_wallet.crt".into(),
            key_file_path: "/nonexistent/private_wallet.key".into(),
        },
        destination: SendingOptions {
            address: DESTINATION.to_string(),
            minimum_amount: Some(dec("0.05")),
            maximum_amount: None,
            multiples_of: Some(dec("0.01")),
        },
        decimal_places: 12,
        fee: Some(dec("0.0001")),
    }
}

pub fn settings(wallets: Vec<WalletDispatchConfig>, wait_for_confirmation: bool) -> Settings {
    Settings {
        wallets,
        dispatch_interval_in_seconds: None,
        wait_for_transaction_to_confirm: Some(wait_for_confirmation),
        poll_interval_in_seconds: None,
        max_poll_attempts: None,
    }
}

/// Collects formatted log output for the current thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn count(&self, message: &str) -> usize {
        String::from_utf8_lossy(&self.0.lock().unwrap())
            .matches(message)
            .count()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
