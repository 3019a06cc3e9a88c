//! Block clock in whole seconds.
//!
//! Casper block time is reported in milliseconds; every timestamp Chorus stores
//! (accrual, price quotes, withdrawal unlocks) is in seconds.

use odra::ContractEnv;

/// Milliseconds per second
pub const MILLIS_PER_SECOND: u64 = 1_000;

/// Current block time in seconds.
pub fn now(env: &ContractEnv) -> u64 {
    env.get_block_time() / MILLIS_PER_SECOND
}
