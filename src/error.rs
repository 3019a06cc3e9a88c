//! Chorus error codes.

use odra::prelude::*;

use crate::math::MathError;

/// Errors raised by the Chorus engine and its submodules.
#[odra::odra_error]
pub enum ChorusError {
    ZeroAmount = 1,
    InsufficientBalance = 2,
    InsufficientAllowance = 3,
    /// Collateral withdrawal would leave the ratio at or above the threshold
    BelowThreshold = 4,
    /// Minting would push the ratio to or above the threshold
    ExceedsThreshold = 5,
    StalePrice = 6,
    PriceUnavailable = 7,
    NotUndercollateralized = 8,
    NoBalance = 9,
    NoRequest = 10,
    TooEarly = 11,
    WithdrawalPending = 12,
    Unauthorized = 13,
    InvalidParameter = 14,
    InsufficientCollateral = 15,
    NotWhitelisted = 16,
    MathOverflow = 17,
}

impl From<MathError> for ChorusError {
    fn from(_: MathError) -> Self {
        ChorusError::MathOverflow
    }
}
