//! Shared deployment fixture for Chorus integration tests.

#![allow(dead_code)]

use odra::casper_types::U256;
use odra::host::{Deployer, HostEnv, HostRef, NoArgs};
use odra::prelude::*;

use chorus_casper::chorus::{Chorus, ChorusHostRef, ChorusInitArgs};
use chorus_casper::math;
use chorus_casper::oracle::{MockOracle, MockOracleHostRef, DEFAULT_COLLATERAL_PRICE_AGE_SECS};
use chorus_casper::tokens::{
    CollateralFaucetToken, CollateralFaucetTokenHostRef, CollateralFaucetTokenInitArgs,
};

/// Constants for testing
pub const WAD: u128 = 1_000_000_000_000_000_000;
pub const PRICE_ID: u32 = 1;
pub const GRANULARITY: u64 = 1_000_000;
pub const INITIAL_PRICE: u64 = 100;
pub const SECONDS_PER_DAY: u64 = 86_400;
pub const SECONDS_PER_YEAR: u64 = 31_536_000;
/// Admin collateral minted from the faucet and approved for Chorus
pub const ADMIN_COLLATERAL: u64 = 50;

pub struct Fixture {
    pub env: HostEnv,
    pub chorus: ChorusHostRef,
    pub oracle: MockOracleHostRef,
    pub collateral: CollateralFaucetTokenHostRef,
    pub admin: Address,
    pub beneficiary: Address,
    pub alice: Address,
    pub bob: Address,
    pub carol: Address,
}

/// Whole units in wad
pub fn wad(units: u64) -> U256 {
    U256::from(units) * U256::from(WAD)
}

/// Nominal annual rate in percent as wad (10 -> 0.1e18)
pub fn percent(value: u64) -> U256 {
    wad(value) / U256::from(100u8)
}

/// Advance block time by `seconds` (the test env clock counts milliseconds)
pub fn advance_secs(env: &HostEnv, seconds: u64) {
    env.advance_block_time(seconds * 1000);
}

// ==========================================
// Helper: Deploy contracts
// ==========================================

/// Deploy with no inflation; ratios stay exact.
pub fn setup() -> Fixture {
    deploy(U256::zero(), false)
}

/// Deploy with a nominal annual inflation rate (wad).
pub fn setup_with_rate(nominal: U256) -> Fixture {
    deploy(math::nominal_to_effective_annual_rate(nominal).unwrap(), false)
}

/// Deploy with an effective annual inflation rate (wad), as passed to `init`.
pub fn setup_with_effective_rate(effective: U256) -> Fixture {
    deploy(effective, false)
}

/// Deploy a whitelisted system with no inflation.
pub fn setup_whitelisted() -> Fixture {
    deploy(U256::zero(), true)
}

fn deploy(effective: U256, whitelisted: bool) -> Fixture {
    let env = odra_test::env();
    let admin = env.get_account(0);
    let alice = env.get_account(1);
    let bob = env.get_account(2);
    let carol = env.get_account(3);
    let beneficiary = env.get_account(9);

    env.set_caller(admin);
    let mut oracle = MockOracle::deploy(&env, NoArgs);
    oracle.submit_value(PRICE_ID, oracle_value(INITIAL_PRICE));

    let mut collateral = CollateralFaucetToken::deploy(
        &env,
        CollateralFaucetTokenInitArgs {
            name: "Test Collateral".to_string(),
            symbol: "tCOL".to_string(),
        },
    );

    let chorus = Chorus::deploy(
        &env,
        ChorusInitArgs {
            oracle: oracle.address(),
            collateral_token: collateral.address(),
            collateral_price_id: PRICE_ID,
            collateral_granularity: U256::from(GRANULARITY),
            name: "Chorus Note".to_string(),
            symbol: "NOTE".to_string(),
            inflation_rate_per_year: effective,
            beneficiary,
            whitelisted,
        },
    );

    collateral.faucet_mint(admin, wad(ADMIN_COLLATERAL));
    collateral.approve(chorus.address(), wad(ADMIN_COLLATERAL));

    // Let the initial quote mature
    advance_secs(&env, DEFAULT_COLLATERAL_PRICE_AGE_SECS + 100);

    Fixture {
        env,
        chorus,
        oracle,
        collateral,
        admin,
        beneficiary,
        alice,
        bob,
        carol,
    }
}

/// Oracle units for a whole collateral price
pub fn oracle_value(price: u64) -> U256 {
    U256::from(price) * U256::from(GRANULARITY)
}

impl Fixture {
    /// Submit a new collateral price and wait until it can be used.
    pub fn set_price(&mut self, price: u64) {
        self.oracle.submit_value(PRICE_ID, oracle_value(price));
        advance_secs(&self.env, DEFAULT_COLLATERAL_PRICE_AGE_SECS + 1);
    }

    /// Admin deposits `units` whole collateral tokens.
    pub fn deposit(&mut self, units: u64) {
        self.env.set_caller(self.admin);
        self.chorus.deposit_collateral(wad(units));
    }

    /// Admin mints `units` whole Notes to `to`.
    pub fn mint(&mut self, units: u64, to: Address) {
        self.env.set_caller(self.admin);
        self.chorus.mint_token(wad(units), to);
    }

    /// 10 collateral at price 100, Alice holds 160 Notes and Bob 240 (ratio 40%).
    pub fn with_two_holders(&mut self) {
        self.deposit(10);
        self.mint(160, self.alice);
        self.mint(240, self.bob);
    }
}
