//! Withdrawal queue.
//!
//! Redemptions are two-step: a request escrows Notes and fixes an unlock time, and
//! the holder claims collateral once the unlock time has passed. The wait grows with
//! the share of the total supply being redeemed:
//!
//! `delay = (BASE_DELAY_DAYS + floor(100 * amount / supply) / SUPPLY_PERCENT_PER_DAY) days`
//!
//! so redeeming the whole supply takes 21 days and a small request about one day.
//! Each account holds at most one request.

use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::ChorusError;

/// 1 day in seconds
pub const SECONDS_PER_DAY: u64 = 86_400;
/// Minimum wait for any request
pub const BASE_DELAY_DAYS: u64 = 1;
/// Each full 5% of the supply adds one day
pub const SUPPLY_PERCENT_PER_DAY: u64 = 5;

/// A pending redemption. `amount == 0` marks an empty slot.
#[odra::odra_type]
#[derive(Default)]
pub struct WithdrawalRequest {
    /// Escrowed Notes
    pub amount: U256,
    pub requested_at: u64,
    pub unlock_at: u64,
}

/// Wait in seconds before `amount` Notes out of `total_supply` can be redeemed.
pub fn withdrawal_delay(amount: U256, total_supply: U256) -> u64 {
    let percent = if total_supply.is_zero() {
        100
    } else {
        (amount.saturating_mul(U256::from(100u8)) / total_supply)
            .min(U256::from(100u8))
            .as_u64()
    };
    (BASE_DELAY_DAYS + percent / SUPPLY_PERCENT_PER_DAY) * SECONDS_PER_DAY
}

#[odra::module]
pub struct WithdrawalQueue {
    requests: Mapping<Address, WithdrawalRequest>,
    total_escrowed: Var<U256>,
}

#[odra::module]
impl WithdrawalQueue {
    /// Outstanding request of `account`, if any.
    pub fn request_of(&self, account: &Address) -> Option<WithdrawalRequest> {
        self.requests
            .get(account)
            .filter(|request| !request.amount.is_zero())
    }

    /// Notes held in escrow across all requests
    pub fn total_escrowed(&self) -> U256 {
        self.total_escrowed.get_or_default()
    }

    /// Record a request for `amount` escrowed Notes.
    pub fn enqueue(
        &mut self,
        account: &Address,
        amount: U256,
        now: u64,
        total_supply: U256,
    ) -> WithdrawalRequest {
        if self.request_of(account).is_some() {
            self.env().revert(ChorusError::WithdrawalPending);
        }
        let request = WithdrawalRequest {
            amount,
            requested_at: now,
            unlock_at: now + withdrawal_delay(amount, total_supply),
        };
        self.requests.set(account, request.clone());
        self.total_escrowed
            .set(self.total_escrowed.get_or_default() + amount);
        request
    }

    /// Remove and return the request of `account` once it has unlocked.
    pub fn take_matured(&mut self, account: &Address, now: u64) -> WithdrawalRequest {
        let request = self
            .request_of(account)
            .unwrap_or_else(|| self.env().revert(ChorusError::NoRequest));
        if now < request.unlock_at {
            self.env().revert(ChorusError::TooEarly);
        }
        self.clear(account, request.amount);
        request
    }

    /// Drop the request of `account` regardless of its unlock time; returns the
    /// escrowed amount (zero when there was none).
    pub fn cancel(&mut self, account: &Address) -> U256 {
        match self.request_of(account) {
            Some(request) => {
                self.clear(account, request.amount);
                request.amount
            }
            None => U256::zero(),
        }
    }

    fn clear(&mut self, account: &Address, amount: U256) {
        self.requests.set(account, WithdrawalRequest::default());
        let escrowed = self.total_escrowed.get_or_default();
        self.total_escrowed.set(escrowed.saturating_sub(amount));
    }
}
