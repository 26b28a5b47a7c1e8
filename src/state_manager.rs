//! State Manager
//!
//! Per-wallet dispatch flags, keyed by the configured wallet name. Entries are
//! created on first use and live for the rest of the process; nothing is
//! persisted.

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

#[derive(Debug, Default)]
pub struct DispatchState {
    dispatching: AtomicBool,
    unreachable: AtomicBool,
}

impl DispatchState {
    pub fn is_dispatching(&self) -> bool {
        self.dispatching.load(Ordering::Acquire)
    }

    pub fn is_unreachable(&self) -> bool {
        self.unreachable.load(Ordering::Acquire)
    }

    /// Returns `true` only on the transition into unreachable.
    pub fn mark_unreachable(&self) -> bool {
        !self.unreachable.swap(true, Ordering::AcqRel)
    }

    /// Returns `true` only on the transition back to reachable.
    pub fn mark_reachable(&self) -> bool {
        self.unreachable.swap(false, Ordering::AcqRel)
    }
}

/// Held for the duration of one dispatch cycle; clears the flag on drop,
/// including when the cycle bails out with an error.
#[derive(Debug)]
pub struct DispatchGuard {
    state: Arc<DispatchState>,
}

impl DispatchGuard {
    pub fn state(&self) -> &DispatchState {
        &self.state
    }
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        self.state.dispatching.store(false, Ordering::Release);
    }
}

#[derive(Debug, Default)]
pub struct StateManager {
    wallets: DashMap<String, Arc<DispatchState>>,
}

impl StateManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the state for `wallet`.
    pub fn state(&self, wallet: &str) -> Arc<DispatchState> {
        if let Some(state) = self.wallets.get(wallet) {
            return state.clone();
        }
        self.wallets
            .entry(wallet.to_string())
            .or_insert_with(|| {
                debug!(wallet, "Initializing dispatch state");
                Arc::new(DispatchState::default())
            })
            .clone()
    }

    /// Claims the wallet for one dispatch cycle. `None` if a cycle is already
    /// in flight for it.
    pub fn try_begin(&self, wallet: &str) -> Option<DispatchGuard> {
        let state = self.state(wallet);
        state
            .dispatching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(DispatchGuard { state })
    }

    pub fn tracked_wallets(&self) -> usize {
        self.wallets.len()
    }
}
