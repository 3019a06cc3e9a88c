//! Chorus x Casper: Collateral-Backed Inflationary Notes (Odra)
//!
//! - Chorus: Note issuance, inflation, redemption queue and liquidation
//! - MockOracle: Price feed stand-in for tests and demos
//! - CollateralFaucetToken: Collateral asset with faucet mint

#![cfg_attr(target_arch = "wasm32", no_std)]

extern crate alloc;

pub mod chorus;
pub mod clock;
pub mod error;
pub mod inflation;
pub mod ledger;
pub mod liquidation;
pub mod math;
pub mod oracle;
pub mod queue;
pub mod tokens;
pub mod vault;
