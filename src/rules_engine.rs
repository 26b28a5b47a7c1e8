//! Rules Engine
//!
//! Turns a spendable balance into the amount to send, applying the wallet's
//! fee, rounding and min/max rules. Pure; no I/O.

use crate::currency_amount::{AmountOutOfRange, CurrencyAmount, floor_div};
use crate::types::WalletDispatchConfig;
use bigdecimal::BigDecimal;
use std::cmp;

/// Outcome of evaluating a wallet's rules against its balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendDecision {
    Send(SendPlan),
    /// Nothing worth sending; carries the computed (pre-clamp) amount.
    Skip { amount: BigDecimal, reason: SkipReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotPositive,
    BelowMinimum,
}

/// Amounts ready for `send_transaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendPlan {
    /// Human units, after rounding and clamping.
    pub amount: BigDecimal,
    pub amount_units: CurrencyAmount,
    pub fee: CurrencyAmount,
}

/// Computes what to send from `spendable` (smallest units) for `wallet`.
///
/// Expects settings that passed `Settings::validate`.
pub fn evaluate(
    wallet: &WalletDispatchConfig,
    spendable: &CurrencyAmount,
) -> Result<SendDecision, AmountOutOfRange> {
    let places = wallet.decimal_places;
    let send_to = &wallet.destination;
    let zero = BigDecimal::from(0);

    let fee = CurrencyAmount::from(wallet.fee.as_ref().unwrap_or(&zero), places)?;
    let mut amount = spendable.to(places) - fee.to(places);

    if let Some(multiples_of) = &send_to.multiples_of {
        amount = floor_to_multiple(&amount, multiples_of);
    }

    if amount <= zero {
        return Ok(SendDecision::Skip {
            amount,
            reason: SkipReason::NotPositive,
        });
    }
    if send_to.minimum_amount.as_ref().is_some_and(|min| amount < *min) {
        return Ok(SendDecision::Skip {
            amount,
            reason: SkipReason::BelowMinimum,
        });
    }

    if let Some(maximum) = &send_to.maximum_amount {
        amount = cmp::min(amount, maximum.clone());
    }

    Ok(SendDecision::Send(SendPlan {
        amount_units: CurrencyAmount::from(&amount, places)?,
        amount,
        fee,
    }))
}

/// `floor(amount / step) * step`, computed on integers so it stays exact.
/// `step` must be positive.
pub fn floor_to_multiple(amount: &BigDecimal, step: &BigDecimal) -> BigDecimal {
    let (_, amount_scale) = amount.as_bigint_and_exponent();
    let (_, step_scale) = step.as_bigint_and_exponent();
    let scale = amount_scale.max(step_scale).max(0);
    let (amount_digits, _) = amount.with_scale(scale).into_bigint_and_exponent();
    let (step_digits, _) = step.with_scale(scale).into_bigint_and_exponent();

    let count = floor_div(&amount_digits, &step_digits);
    BigDecimal::new(count * step_digits, scale)
}
