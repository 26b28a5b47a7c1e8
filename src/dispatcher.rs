//! Dispatcher
//!
//! Runs one dispatch pass over every enabled wallet. Each wallet goes through
//! the same sequential pipeline: reachability probe, sync wait, sub-wallet
//! lookup, amount rules, send, and (optionally) confirmation wait. Wallets are
//! driven concurrently and fail independently.

use crate::config::Settings;
use crate::currency_amount::CurrencyAmount;
use crate::rpc::{WalletConnector, WalletRpc, WalletType};
use crate::rules_engine::{self, SendDecision};
use crate::state_manager::StateManager;
use crate::tx_emitter::TxEmitter;
use crate::types::{PollPolicy, WalletDispatchConfig};
use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span};

/// What happened to one wallet during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A cycle for this wallet was still running; this tick did nothing.
    AlreadyDispatching,
    Unreachable,
    NoStandardWallet,
    NothingToSend { amount: BigDecimal },
    Sent {
        transaction_id: String,
        amount: BigDecimal,
        confirmed: bool,
    },
    Failed(String),
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DispatchOutcome::Sent { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletReport {
    pub wallet: String,
    pub outcome: DispatchOutcome,
}

pub struct Dispatcher {
    settings: Settings,
    connector: Arc<dyn WalletConnector>,
    states: StateManager,
    poll: PollPolicy,
}

impl Dispatcher {
    /// Fails if `settings` does not pass [`Settings::validate`].
    pub fn new(settings: Settings, connector: Arc<dyn WalletConnector>) -> Result<Self> {
        settings.validate().context("Invalid dispatch settings")?;
        let poll = settings.poll_policy();
        Ok(Self {
            settings,
            connector,
            states: StateManager::new(),
            poll,
        })
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn states(&self) -> &StateManager {
        &self.states
    }

    /// Dispatches every enabled wallet concurrently and reports each outcome.
    pub async fn dispatch_all(&self) -> Vec<WalletReport> {
        let passes = self.settings.enabled_wallets().map(|wallet| {
            let span = info_span!("dispatch", wallet = %wallet.name);
            async move {
                let outcome = match self.dispatch_wallet(wallet).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("Error while dispatching wallet {}: {:#}", wallet.name, e);
                        DispatchOutcome::Failed(format!("{:#}", e))
                    }
                };
                WalletReport {
                    wallet: wallet.name.clone(),
                    outcome,
                }
            }
            .instrument(span)
        });

        join_all(passes).await
    }

    /// One full cycle for `wallet`, unless a cycle for it is already running.
    pub async fn dispatch_wallet(&self, wallet: &WalletDispatchConfig) -> Result<DispatchOutcome> {
        let Some(guard) = self.states.try_begin(&wallet.name) else {
            debug!("Previous dispatch still in progress, skipping");
            return Ok(DispatchOutcome::AlreadyDispatching);
        };

        let client = self
            .connector
            .connect(&wallet.connection)
            .context("Failed to create wallet client")?;

        if !client.is_reachable().await {
            if guard.state().mark_unreachable() {
                info!("Wallet is unreachable, skipping until it comes back ..");
            }
            return Ok(DispatchOutcome::Unreachable);
        }
        if guard.state().mark_reachable() {
            info!("Wallet is reachable again");
        }

        self.wait_for_sync(client.as_ref()).await?;

        let wallets = client.get_wallets().await.context("Failed to list wallets")?;
        let Some(standard) = wallets
            .iter()
            .find(|info| info.wallet_type == WalletType::StandardWallet)
        else {
            error!("No wallet available to send from");
            return Ok(DispatchOutcome::NoStandardWallet);
        };

        let balance = client
            .get_balance(standard.id)
            .await
            .with_context(|| format!("Failed to read balance of wallet {}", standard.id))?;
        let spendable = CurrencyAmount::from_smallest_unit(&balance.spendable_balance)?;

        let plan = match rules_engine::evaluate(wallet, &spendable)? {
            SendDecision::Send(plan) => plan,
            SendDecision::Skip { amount, reason } => {
                debug!(amount = %amount.normalized().to_plain_string(), ?reason, "Nothing to send");
                return Ok(DispatchOutcome::NothingToSend { amount });
            }
        };

        info!(
            "Sending {} {} to {} ..",
            plan.amount.normalized().to_plain_string(),
            wallet.ticker,
            wallet.destination.address
        );
        let emitter = TxEmitter::new(client.as_ref(), self.poll);
        let mut tx = emitter
            .emit(standard.id, &wallet.destination.address, &plan)
            .await?;

        if self.settings.wait_for_transaction_to_confirm() {
            tx = emitter.wait_for_confirmation(tx).await?;
        }

        info!("Done sending to {}", wallet.destination.address);
        Ok(DispatchOutcome::Sent {
            transaction_id: tx.id,
            amount: plan.amount,
            confirmed: tx.confirmed,
        })
    }

    async fn wait_for_sync(&self, client: &dyn WalletRpc) -> Result<()> {
        let mut status = client
            .get_sync_status()
            .await
            .context("Failed to read sync status")?;
        if status.is_synced() {
            return Ok(());
        }

        info!("Wallet is syncing, waiting for it to become synced ..");
        let mut attempts = 0;
        while !status.is_synced() {
            self.poll.backoff(&mut attempts, "wallet sync").await?;
            status = client
                .get_sync_status()
                .await
                .context("Failed to read sync status")?;
        }

        debug!(polls = attempts, "Wallet synced");
        Ok(())
    }
}
