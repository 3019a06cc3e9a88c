//! Liquidation payout split.
//!
//! An undercollateralized system lets any Note holder exit against their pro-rata
//! share of the collateral. A penalty, expressed as a percentage with 18 decimals
//! (`100e18` = 100%), is withheld from the share and routed to the beneficiary.

use odra::casper_types::U256;

use crate::math::{self, MathError, WAD};

/// 100% in liquidation penalty units
pub const PENALTY_SCALE: u128 = 100 * WAD;

/// Collateral owed to a liquidating holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiquidationSplit {
    /// Pro-rata collateral share: `payout + penalty`
    pub share: U256,
    /// Sent to the holder
    pub payout: U256,
    /// Sent to the beneficiary
    pub penalty: U256,
}

/// Liquidation is allowed once the ratio is strictly above the threshold.
pub fn is_undercollateralized(ratio: U256, threshold: U256) -> bool {
    ratio > threshold
}

/// Split `holder_notes / total_supply` of `collateral` into payout and penalty.
pub fn liquidation_split(
    holder_notes: U256,
    total_supply: U256,
    collateral: U256,
    penalty_percent: U256,
) -> Result<LiquidationSplit, MathError> {
    let share = math::mul_div(holder_notes, collateral, total_supply)?;
    let penalty = math::mul_div(share, penalty_percent, U256::from(PENALTY_SCALE))?;
    Ok(LiquidationSplit {
        share,
        payout: share - penalty,
        penalty,
    })
}
