//! Fund Dispatcher
//!
//! Sweeps the spendable balance of self-hosted wallet nodes to a fixed
//! address on a schedule.

pub mod config;
pub mod currency_amount;
pub mod dispatcher;
pub mod rpc;
pub mod rules_engine;
pub mod scheduler;
pub mod state_manager;
pub mod tx_emitter;
pub mod types;
