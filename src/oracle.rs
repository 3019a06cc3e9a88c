//! Collateral price feed.
//!
//! Chorus reads the collateral price from an external oracle contract through the
//! [`PriceOracle`] interface. A quote is only trusted once it is at least
//! `price_age` seconds old: fresh values may still be disputed on the oracle side.
//!
//! [`MockOracle`] implements the same interface for tests and demos.

use odra::casper_types::U256;
use odra::prelude::*;
use odra::ContractRef;

use crate::clock;
use crate::error::ChorusError;
use crate::math::{self, WAD};

/// Minimum age of a collateral quote before it is used (1 hour)
pub const DEFAULT_COLLATERAL_PRICE_AGE_SECS: u64 = 3_600;

/// A price reported by the oracle.
#[odra::odra_type]
pub struct PriceQuote {
    /// Price in oracle units (see the feed granularity)
    pub value: U256,
    /// Submission time in seconds
    pub timestamp: u64,
}

/// Oracle External Contract Interface
#[odra::external_contract]
pub trait PriceOracle {
    /// Latest value submitted for `price_id`, or None if nothing was ever reported
    fn get_value(&self, price_id: u32) -> Option<PriceQuote>;
}

/// Price feed adapter: oracle address, feed id and scaling.
#[odra::module]
pub struct PriceFeed {
    oracle: Var<Address>,
    price_id: Var<u32>,
    granularity: Var<U256>,
    price_age: Var<u64>,
}

#[odra::module]
impl PriceFeed {
    /// Configure the feed. `granularity` is the number of oracle units per whole
    /// collateral price unit (e.g. 1e6).
    pub fn init(&mut self, oracle: Address, price_id: u32, granularity: U256, price_age: u64) {
        if granularity.is_zero() {
            self.env().revert(ChorusError::InvalidParameter);
        }
        self.oracle.set(oracle);
        self.price_id.set(price_id);
        self.granularity.set(granularity);
        self.price_age.set(price_age);
    }

    /// Latest quote as reported by the oracle.
    pub fn current_price(&self) -> PriceQuote {
        let oracle_addr = self
            .oracle
            .get()
            .unwrap_or_else(|| self.env().revert(ChorusError::PriceUnavailable));
        let oracle = PriceOracleContractRef::new(self.env(), oracle_addr);
        oracle
            .get_value(self.price_id.get_or_default())
            .unwrap_or_else(|| self.env().revert(ChorusError::PriceUnavailable))
    }

    /// Collateral price in wad, reverting with `StalePrice` when the latest quote is
    /// younger than the configured price age.
    pub fn require_fresh_price(&self, now: u64) -> U256 {
        let quote = self.current_price();
        let age = now.saturating_sub(quote.timestamp);
        if quote.timestamp > now || age < self.price_age.get_or_default() {
            self.env().revert(ChorusError::StalePrice);
        }
        math::mul_div(quote.value, U256::from(WAD), self.granularity.get_or_default())
            .unwrap_or_else(|err| self.env().revert(ChorusError::from(err)))
    }

    /// Collateral price in wad at the current block time.
    pub fn fresh_price(&self) -> U256 {
        self.require_fresh_price(clock::now(&self.env()))
    }

    pub fn oracle(&self) -> Option<Address> {
        self.oracle.get()
    }

    pub fn price_id(&self) -> u32 {
        self.price_id.get_or_default()
    }

    pub fn granularity(&self) -> U256 {
        self.granularity.get_or_default()
    }

    /// Minimum quote age in seconds
    pub fn price_age(&self) -> u64 {
        self.price_age.get_or_default()
    }
}

/// Mock oracle for tests and demo deployments.
///
/// Anyone can submit a value; the quote is stamped with the current block time.
#[odra::module]
pub struct MockOracle {
    quotes: Mapping<u32, PriceQuote>,
}

#[odra::module]
impl MockOracle {
    /// Record `value` for `price_id` at the current block time
    pub fn submit_value(&mut self, price_id: u32, value: U256) {
        let timestamp = clock::now(&self.env());
        self.quotes.set(&price_id, PriceQuote { value, timestamp });
    }

    /// Latest quote for `price_id`
    pub fn get_value(&self, price_id: u32) -> Option<PriceQuote> {
        self.quotes.get(&price_id)
    }
}
