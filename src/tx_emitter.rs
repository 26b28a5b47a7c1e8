//! Transaction Emitter
//!
//! Submits the sweep transaction and optionally waits for it to confirm.

use crate::rpc::{SendTransaction, Transaction, WalletRpc};
use crate::rules_engine::SendPlan;
use crate::types::{Address, PollPolicy};
use anyhow::{Context, Result};
use tracing::info;

pub struct TxEmitter<'a> {
    client: &'a dyn WalletRpc,
    poll: PollPolicy,
}

impl<'a> TxEmitter<'a> {
    pub fn new(client: &'a dyn WalletRpc, poll: PollPolicy) -> Self {
        Self { client, poll }
    }

    /// Sends `plan` from sub-wallet `wallet_id` to `destination`.
    pub async fn emit(&self, wallet_id: u32, destination: &Address, plan: &SendPlan) -> Result<Transaction> {
        let request = SendTransaction {
            wallet_id,
            address: destination.clone(),
            amount: plan.amount_units.to_smallest_unit().clone(),
            fee: plan.fee.to_smallest_unit().clone(),
        };

        let tx = self
            .client
            .send_transaction(&request)
            .await
            .context("Failed to send transaction")?;

        info!(transaction_id = %tx.id, "Transaction submitted");
        Ok(tx)
    }

    /// Re-reads `tx` every poll interval until the node reports it confirmed.
    pub async fn wait_for_confirmation(&self, mut tx: Transaction) -> Result<Transaction> {
        if tx.confirmed {
            return Ok(tx);
        }

        info!("Waiting for transaction to confirm ..");
        let mut attempts = 0;
        while !tx.confirmed {
            self.poll.backoff(&mut attempts, "transaction confirmation").await?;
            tx = self
                .client
                .get_transaction(&tx.id)
                .await
                .with_context(|| format!("Failed to fetch transaction {}", tx.id))?;
        }

        info!(
            transaction_id = %tx.id,
            height = tx.confirmed_at_height,
            "Transaction confirmed"
        );
        Ok(tx)
    }
}
