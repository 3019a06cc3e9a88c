//! Issuance Tests
//!
//! Collateral vault, mint gate, price feed and admin parameters.

mod common;

use odra::casper_types::U256;
use odra::host::{Deployer, HostRef};
use odra::prelude::*;

use chorus_casper::chorus::{Chorus, ChorusInitArgs};
use chorus_casper::error::ChorusError;
use common::*;

// ==========================================
// Deployment
// ==========================================

#[test]
fn test_init_sets_defaults() {
    let fx = setup();

    assert_eq!(fx.chorus.name(), "Chorus Note");
    assert_eq!(fx.chorus.symbol(), "NOTE");
    assert_eq!(fx.chorus.decimals(), 18);
    assert_eq!(fx.chorus.total_supply(), U256::zero());
    assert_eq!(fx.chorus.token_price(), wad(1));
    assert_eq!(fx.chorus.collateral_threshold(), wad(1) / U256::from(2u8));
    assert_eq!(fx.chorus.liquidation_penalty(), U256::zero());
    assert_eq!(fx.chorus.collateral_price_age(), 3_600);
    assert_eq!(fx.chorus.admin(), Some(fx.admin));
    assert_eq!(fx.chorus.beneficiary(), Some(fx.beneficiary));
    assert_eq!(fx.chorus.collateral_token(), Some(fx.collateral.address()));
    assert_eq!(fx.chorus.oracle(), Some(fx.oracle.address()));
    assert!(!fx.chorus.is_whitelisted_system());
    assert_eq!(fx.chorus.collateral_ratio(), U256::zero());
}

#[test]
fn test_collateral_price_is_scaled_by_granularity() {
    let fx = setup();
    assert_eq!(fx.chorus.collateral_price(), wad(INITIAL_PRICE));
}

// ==========================================
// Collateral Vault
// ==========================================

#[test]
fn test_deposit_collateral() {
    let mut fx = setup();
    fx.deposit(10);

    assert_eq!(fx.chorus.collateral_balance(), wad(10));
    assert_eq!(fx.collateral.balance_of(fx.chorus.address()), wad(10));
    assert_eq!(fx.collateral.balance_of(fx.admin), wad(ADMIN_COLLATERAL - 10));
    assert!(fx.env.emitted(&fx.chorus.address(), "CollateralDeposited"));
}

#[test]
#[should_panic(expected = "ZeroAmount")]
fn test_deposit_zero_reverts() {
    let mut fx = setup();
    fx.deposit(0);
}

#[test]
#[should_panic(expected = "Unauthorized")]
fn test_deposit_by_non_admin_reverts() {
    let mut fx = setup();
    fx.env.set_caller(fx.alice);
    fx.chorus.deposit_collateral(wad(1));
}

#[test]
fn test_deposit_without_allowance_reverts() {
    let mut fx = setup();
    fx.env.set_caller(fx.admin);
    fx.collateral.approve(fx.chorus.address(), U256::zero());

    assert_eq!(
        fx.chorus.try_deposit_collateral(wad(1)),
        Err(ChorusError::InsufficientAllowance.into())
    );
    assert_eq!(fx.chorus.collateral_balance(), U256::zero());
}

#[test]
fn test_deposit_beyond_wallet_reverts() {
    let mut fx = setup();
    fx.env.set_caller(fx.admin);
    fx.collateral
        .approve(fx.chorus.address(), wad(ADMIN_COLLATERAL + 1));

    assert_eq!(
        fx.chorus.try_deposit_collateral(wad(ADMIN_COLLATERAL + 1)),
        Err(ChorusError::InsufficientBalance.into())
    );
    assert_eq!(fx.chorus.collateral_balance(), U256::zero());
    assert_eq!(fx.collateral.balance_of(fx.admin), wad(ADMIN_COLLATERAL));
}

#[test]
fn test_withdraw_collateral_without_notes() {
    let mut fx = setup();
    fx.deposit(10);

    fx.chorus.withdraw_collateral(wad(10));

    assert_eq!(fx.chorus.collateral_balance(), U256::zero());
    assert_eq!(fx.collateral.balance_of(fx.admin), wad(ADMIN_COLLATERAL));
    assert!(fx.env.emitted(&fx.chorus.address(), "CollateralWithdrawn"));
}

#[test]
#[should_panic(expected = "InsufficientBalance")]
fn test_withdraw_more_than_vault_reverts() {
    let mut fx = setup();
    fx.deposit(10);
    fx.chorus.withdraw_collateral(wad(11));
}

#[test]
fn test_withdraw_collateral_respects_threshold() {
    let mut fx = setup();
    fx.deposit(10);
    fx.mint(400, fx.alice);

    // 400 / 900 = 44.4%
    fx.chorus.withdraw_collateral(wad(1));
    assert_eq!(fx.chorus.collateral_balance(), wad(9));

    // 400 / 800 = 50% is not below the threshold
    assert_eq!(
        fx.chorus.try_withdraw_collateral(wad(1)),
        Err(ChorusError::BelowThreshold.into())
    );
    assert_eq!(fx.chorus.collateral_balance(), wad(9));
}

// ==========================================
// Mint Gate
// ==========================================

#[test]
fn test_mint_below_threshold() {
    let mut fx = setup();
    fx.deposit(10);

    fx.mint(499, fx.alice);

    assert_eq!(fx.chorus.balance_of(fx.alice), wad(499));
    assert_eq!(fx.chorus.total_supply(), wad(499));
    assert_eq!(
        fx.chorus.collateral_ratio(),
        U256::from(499_000_000_000_000_000u128)
    );
    assert!(fx.env.emitted(&fx.chorus.address(), "NotesMinted"));
}

#[test]
fn test_mint_reaching_threshold_reverts() {
    let mut fx = setup();
    fx.deposit(10);
    fx.mint(499, fx.alice);

    fx.env.set_caller(fx.admin);
    assert_eq!(
        fx.chorus.try_mint_token(wad(1), fx.alice),
        Err(ChorusError::ExceedsThreshold.into())
    );
    assert_eq!(fx.chorus.total_supply(), wad(499));
}

#[test]
#[should_panic(expected = "ExceedsThreshold")]
fn test_mint_without_collateral_reverts() {
    let mut fx = setup();
    fx.mint(1, fx.alice);
}

#[test]
#[should_panic(expected = "Unauthorized")]
fn test_mint_by_non_admin_reverts() {
    let mut fx = setup();
    fx.deposit(10);
    fx.env.set_caller(fx.alice);
    fx.chorus.mint_token(wad(1), fx.alice);
}

#[test]
#[should_panic(expected = "ZeroAmount")]
fn test_mint_zero_reverts() {
    let mut fx = setup();
    fx.deposit(10);
    fx.mint(0, fx.alice);
}

#[test]
#[should_panic(expected = "InvalidParameter")]
fn test_mint_to_contract_reverts() {
    let mut fx = setup();
    fx.deposit(10);
    let chorus_address = fx.chorus.address();
    fx.mint(1, chorus_address);
}

#[test]
fn test_collateral_price_drop_tightens_gate() {
    let mut fx = setup();
    fx.deposit(10);
    fx.mint(200, fx.alice);

    // 200 / (10 * 40) = 50%
    fx.set_price(40);
    fx.env.set_caller(fx.admin);
    assert_eq!(
        fx.chorus.try_mint_token(wad(1), fx.alice),
        Err(ChorusError::ExceedsThreshold.into())
    );
}

// ==========================================
// Price Feed
// ==========================================

#[test]
fn test_fresh_quote_is_not_trusted() {
    let mut fx = setup();
    fx.deposit(10);
    fx.oracle.submit_value(PRICE_ID, oracle_value(100));

    fx.env.set_caller(fx.admin);
    assert_eq!(
        fx.chorus.try_mint_token(wad(1), fx.alice),
        Err(ChorusError::StalePrice.into())
    );
    assert_eq!(
        fx.chorus.try_collateral_price(),
        Err(ChorusError::StalePrice.into())
    );

    advance_secs(&fx.env, 3_600);
    fx.mint(1, fx.alice);
    assert_eq!(fx.chorus.balance_of(fx.alice), wad(1));
}

#[test]
fn test_missing_quote_reverts() {
    let fx = setup();
    fx.env.set_caller(fx.admin);
    let mut chorus = Chorus::deploy(
        &fx.env,
        ChorusInitArgs {
            oracle: fx.oracle.address(),
            collateral_token: fx.collateral.address(),
            collateral_price_id: PRICE_ID + 1,
            collateral_granularity: U256::from(GRANULARITY),
            name: "Unpriced Note".to_string(),
            symbol: "UNP".to_string(),
            inflation_rate_per_year: U256::zero(),
            beneficiary: fx.beneficiary,
            whitelisted: false,
        },
    );

    assert_eq!(
        chorus.try_collateral_price(),
        Err(ChorusError::PriceUnavailable.into())
    );
    assert_eq!(
        chorus.try_mint_token(wad(1), fx.alice),
        Err(ChorusError::PriceUnavailable.into())
    );
}

#[test]
#[should_panic]
fn test_zero_granularity_reverts() {
    let fx = setup();
    Chorus::deploy(
        &fx.env,
        ChorusInitArgs {
            oracle: fx.oracle.address(),
            collateral_token: fx.collateral.address(),
            collateral_price_id: PRICE_ID,
            collateral_granularity: U256::zero(),
            name: "Chorus Note".to_string(),
            symbol: "NOTE".to_string(),
            inflation_rate_per_year: U256::zero(),
            beneficiary: fx.beneficiary,
            whitelisted: false,
        },
    );
}

// ==========================================
// Admin Parameters
// ==========================================

#[test]
fn test_set_collateral_threshold() {
    let mut fx = setup();
    fx.deposit(10);
    fx.mint(499, fx.alice);

    fx.env.set_caller(fx.admin);
    fx.chorus.set_collateral_threshold(wad(1));
    assert_eq!(fx.chorus.collateral_threshold(), wad(1));
    assert!(fx.env.emitted(&fx.chorus.address(), "CollateralThresholdSet"));

    // 999 / 1000 < 100%
    fx.mint(500, fx.alice);
    assert_eq!(fx.chorus.total_supply(), wad(999));
}

#[test]
fn test_threshold_bounds() {
    let mut fx = setup();
    fx.env.set_caller(fx.admin);

    fx.chorus.set_collateral_threshold(wad(100));
    assert_eq!(
        fx.chorus.try_set_collateral_threshold(wad(100) + U256::one()),
        Err(ChorusError::InvalidParameter.into())
    );
    assert_eq!(fx.chorus.collateral_threshold(), wad(100));
}

#[test]
fn test_liquidation_penalty_bounds() {
    let mut fx = setup();
    fx.env.set_caller(fx.admin);

    fx.chorus.set_liquidation_penalty(wad(15));
    assert_eq!(fx.chorus.liquidation_penalty(), wad(15));
    assert_eq!(
        fx.chorus.try_set_liquidation_penalty(wad(101)),
        Err(ChorusError::InvalidParameter.into())
    );
    assert_eq!(fx.chorus.liquidation_penalty(), wad(15));
}

#[test]
#[should_panic(expected = "Unauthorized")]
fn test_set_threshold_by_non_admin_reverts() {
    let mut fx = setup();
    fx.env.set_caller(fx.alice);
    fx.chorus.set_collateral_threshold(wad(1));
}

#[test]
#[should_panic(expected = "Unauthorized")]
fn test_set_penalty_by_non_admin_reverts() {
    let mut fx = setup();
    fx.env.set_caller(fx.alice);
    fx.chorus.set_liquidation_penalty(wad(1));
}

#[test]
fn test_set_admin_transfers_role() {
    let mut fx = setup();
    fx.env.set_caller(fx.admin);
    fx.chorus.set_admin(fx.alice);

    assert_eq!(fx.chorus.admin(), Some(fx.alice));
    assert!(fx.env.emitted(&fx.chorus.address(), "AdminChanged"));
    assert_eq!(
        fx.chorus.try_set_liquidation_penalty(wad(1)),
        Err(ChorusError::Unauthorized.into())
    );

    fx.env.set_caller(fx.alice);
    fx.chorus.set_liquidation_penalty(wad(1));
    assert_eq!(fx.chorus.liquidation_penalty(), wad(1));
}

// ==========================================
// Note Token
// ==========================================

#[test]
fn test_transfer_and_transfer_from() {
    let mut fx = setup();
    fx.with_two_holders();

    fx.env.set_caller(fx.alice);
    fx.chorus.transfer(fx.carol, wad(10));
    assert_eq!(fx.chorus.balance_of(fx.carol), wad(10));
    assert_eq!(fx.chorus.balance_of(fx.alice), wad(150));

    fx.chorus.approve(fx.bob, wad(20));
    assert_eq!(fx.chorus.allowance(fx.alice, fx.bob), wad(20));

    fx.env.set_caller(fx.bob);
    fx.chorus.transfer_from(fx.alice, fx.carol, wad(15));
    assert_eq!(fx.chorus.balance_of(fx.carol), wad(25));
    assert_eq!(fx.chorus.allowance(fx.alice, fx.bob), wad(5));

    assert_eq!(
        fx.chorus.try_transfer_from(fx.alice, fx.carol, wad(6)),
        Err(ChorusError::InsufficientAllowance.into())
    );
    assert_eq!(fx.chorus.total_supply(), wad(400));
}

#[test]
fn test_transfer_to_self_or_contract_reverts() {
    let mut fx = setup();
    fx.with_two_holders();
    fx.env.set_caller(fx.alice);

    assert_eq!(
        fx.chorus.try_transfer(fx.alice, wad(1)),
        Err(ChorusError::InvalidParameter.into())
    );
    let chorus_address = fx.chorus.address();
    assert_eq!(
        fx.chorus.try_transfer(chorus_address, wad(1)),
        Err(ChorusError::InvalidParameter.into())
    );
    assert_eq!(fx.chorus.balance_of(fx.alice), wad(160));
}

#[test]
#[should_panic(expected = "InsufficientBalance")]
fn test_transfer_more_than_balance_reverts() {
    let mut fx = setup();
    fx.with_two_holders();
    fx.env.set_caller(fx.alice);
    fx.chorus.transfer(fx.carol, wad(161));
}
