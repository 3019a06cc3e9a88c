//! Inflation accrual.
//!
//! The token price (collateral currency per Note) decays continuously at the
//! per-second rate. Each accrual returns the Notes the beneficiary is owed so that
//! `total_supply * token_price` is unchanged by the decay.
//!
//! The price never decays below [`math::MIN_TOKEN_PRICE`]; once it sits on the floor
//! accrual stops minting interest.

use odra::casper_types::U256;
use odra::prelude::*;

use crate::error::ChorusError;
use crate::math::{self, MathError};

#[odra::module]
pub struct InflationAccrual {
    token_price: Var<U256>,
    last_update: Var<u64>,
    rate_per_second: Var<U256>,
}

#[odra::module]
impl InflationAccrual {
    /// Start at a token price of one wad.
    pub fn init(&mut self, rate_per_second: U256, now: u64) {
        self.token_price.set(math::wad());
        self.last_update.set(now);
        self.rate_per_second.set(rate_per_second);
    }

    /// Bring the token price up to `now`; returns the interest owed on
    /// `total_supply`. No-op when `now` is not past the last update.
    pub fn accrue(&mut self, now: u64, total_supply: U256) -> U256 {
        let last_update = self.last_update.get_or_default();
        if now <= last_update {
            return U256::zero();
        }

        let old_price = self.token_price.get_or_default();
        let (new_price, interest) = self
            .advance(old_price, now - last_update, total_supply)
            .unwrap_or_else(|err| self.env().revert(ChorusError::from(err)));

        self.token_price.set(new_price);
        self.last_update.set(now);
        interest
    }

    /// Token price projected to `now` without touching state.
    pub fn price_at(&self, now: u64) -> U256 {
        let price = self.token_price.get_or_default();
        let elapsed = now.saturating_sub(self.last_update.get_or_default());
        math::compound_decay_floored(
            price,
            self.rate_per_second.get_or_default(),
            elapsed,
            U256::from(math::MIN_TOKEN_PRICE),
        )
        .unwrap_or_else(|err| self.env().revert(ChorusError::from(err)))
    }

    /// Stored token price as of the last accrual
    pub fn stored_price(&self) -> U256 {
        self.token_price.get_or_default()
    }

    pub fn last_update(&self) -> u64 {
        self.last_update.get_or_default()
    }

    pub fn rate_per_second(&self) -> U256 {
        self.rate_per_second.get_or_default()
    }

    fn advance(
        &self,
        old_price: U256,
        elapsed: u64,
        total_supply: U256,
    ) -> Result<(U256, U256), MathError> {
        let new_price = math::compound_decay_floored(
            old_price,
            self.rate_per_second.get_or_default(),
            elapsed,
            U256::from(math::MIN_TOKEN_PRICE),
        )?;
        if total_supply.is_zero() || new_price == old_price {
            return Ok((new_price, U256::zero()));
        }
        let interest = math::accrued_interest(total_supply, old_price, new_price)?;
        Ok((new_price, interest))
    }
}
