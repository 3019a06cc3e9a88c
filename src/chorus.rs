//! Chorus Note Issuance Contract
//!
//! An admin locks a collateral asset and issues Notes against it.
//! - Notes lose value continuously: the token price (collateral currency per Note)
//!   decays at a fixed per-second rate and the difference is minted to the
//!   inflation beneficiary
//! - Issuance and collateral withdrawal are capped by the collateral threshold
//! - Holders redeem through a time-locked withdrawal queue
//! - Once the system is undercollateralized, any holder can liquidate for their
//!   pro-rata share of the collateral, minus the liquidation penalty
//!
//! ## Units
//! - Notes, collateral and prices: wad (U256, 18 decimals)
//! - Collateral ratio and threshold: wad fraction, 1e18 = 100%
//! - Liquidation penalty: percent with 18 decimals, 100e18 = 100%
//! - Timestamps: seconds

use alloc::string::String;
use odra::casper_types::account::AccountHash;
use odra::casper_types::contracts::ContractPackageHash;
use odra::casper_types::U256;
use odra::prelude::*;
use odra_modules::cep18::events::{Burn, Mint, SetAllowance, Transfer, TransferFrom};

use crate::clock;
use crate::error::ChorusError;
use crate::inflation::InflationAccrual;
use crate::ledger::NoteLedger;
use crate::liquidation::{self, PENALTY_SCALE};
use crate::math::{self, WAD};
use crate::oracle::{PriceFeed, DEFAULT_COLLATERAL_PRICE_AGE_SECS};
use crate::queue::{WithdrawalQueue, WithdrawalRequest};
use crate::vault::{self, CollateralVault};

// ==========================================
// Constants
// ==========================================

/// Default collateral threshold = 50%
const DEFAULT_COLLATERAL_THRESHOLD: u128 = WAD / 2;
/// Collateral threshold upper bound = 10,000%
const MAX_COLLATERAL_THRESHOLD: u128 = 100 * WAD;
/// Effective annual inflation upper bound = 1,000%
const MAX_INFLATION_RATE_PER_YEAR: u128 = 10 * WAD;

// ==========================================
// Events
// ==========================================

pub mod events {
    use odra::casper_types::U256;
    use odra::prelude::*;

    #[odra::event]
    pub struct CollateralDeposited {
        pub admin: Address,
        pub amount: U256,
        pub collateral_balance: U256,
    }

    #[odra::event]
    pub struct CollateralWithdrawn {
        pub admin: Address,
        pub amount: U256,
        pub collateral_balance: U256,
    }

    #[odra::event]
    pub struct NotesMinted {
        pub to: Address,
        pub amount: U256,
        pub collateral_ratio: U256,
    }

    #[odra::event]
    pub struct WithdrawRequested {
        pub account: Address,
        pub amount: U256,
        pub unlock_at: u64,
    }

    #[odra::event]
    pub struct WithdrawFinalized {
        pub account: Address,
        pub notes_burned: U256,
        pub collateral_paid: U256,
    }

    #[odra::event]
    pub struct Liquidated {
        pub account: Address,
        pub notes_burned: U256,
        pub collateral_paid: U256,
        pub penalty: U256,
    }

    #[odra::event]
    pub struct InflationAccrued {
        pub beneficiary: Address,
        pub interest: U256,
        pub token_price: U256,
    }

    #[odra::event]
    pub struct AdminChanged {
        pub old_admin: Address,
        pub new_admin: Address,
    }

    #[odra::event]
    pub struct CollateralThresholdSet {
        pub threshold: U256,
    }

    #[odra::event]
    pub struct LiquidationPenaltySet {
        pub penalty: U256,
    }

    #[odra::event]
    pub struct WhitelistedAmountSet {
        pub account: Address,
        pub amount: U256,
    }
}

// ==========================================
// Contract
// ==========================================

#[odra::module(
    events = [
        Mint,
        Burn,
        SetAllowance,
        Transfer,
        TransferFrom,
        events::CollateralDeposited,
        events::CollateralWithdrawn,
        events::NotesMinted,
        events::WithdrawRequested,
        events::WithdrawFinalized,
        events::Liquidated,
        events::InflationAccrued,
        events::AdminChanged,
        events::CollateralThresholdSet,
        events::LiquidationPenaltySet,
        events::WhitelistedAmountSet
    ],
    errors = ChorusError
)]
pub struct Chorus {
    // Components
    notes: SubModule<NoteLedger>,
    inflation: SubModule<InflationAccrual>,
    vault: SubModule<CollateralVault>,
    price_feed: SubModule<PriceFeed>,
    queue: SubModule<WithdrawalQueue>,

    // Liquidation parameters
    collateral_threshold: Var<U256>,
    liquidation_penalty: Var<U256>,

    // Roles
    admin: Var<Address>,
    beneficiary: Var<Address>,
}

#[odra::module]
impl Chorus {
    // ==========================================
    // Initialization
    // ==========================================

    /// Initialize the contract. The caller becomes admin.
    ///
    /// `inflation_rate_per_year` is the effective annual rate in wad, see
    /// [`math::nominal_to_effective_annual_rate`].
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        &mut self,
        oracle: Address,
        collateral_token: Address,
        collateral_price_id: u32,
        collateral_granularity: U256,
        name: String,
        symbol: String,
        inflation_rate_per_year: U256,
        beneficiary: Address,
        whitelisted: bool,
    ) {
        if is_zero_address(&oracle)
            || is_zero_address(&collateral_token)
            || is_zero_address(&beneficiary)
            || inflation_rate_per_year > U256::from(MAX_INFLATION_RATE_PER_YEAR)
        {
            self.env().revert(ChorusError::InvalidParameter);
        }

        let now = self.now();
        let self_address = self.env().self_address();

        self.notes.init(name, symbol, whitelisted);
        self.notes.exempt(&self_address);
        self.notes.exempt(&beneficiary);
        self.inflation.init(
            math::effective_rate_per_second(inflation_rate_per_year),
            now,
        );
        self.vault.init(collateral_token);
        self.price_feed.init(
            oracle,
            collateral_price_id,
            collateral_granularity,
            DEFAULT_COLLATERAL_PRICE_AGE_SECS,
        );

        self.collateral_threshold
            .set(U256::from(DEFAULT_COLLATERAL_THRESHOLD));
        self.liquidation_penalty.set(U256::zero());
        self.admin.set(self.env().caller());
        self.beneficiary.set(beneficiary);
    }

    // ==========================================
    // Admin: Collateral and Issuance
    // ==========================================

    /// Lock `amount` of collateral (requires prior approve on the collateral token).
    pub fn deposit_collateral(&mut self, amount: U256) {
        let caller = self.require_admin();
        if amount.is_zero() {
            self.env().revert(ChorusError::ZeroAmount);
        }

        self.accrue_inflation();

        let collateral_balance = self.vault.deposit(caller, amount);

        self.env().emit_event(events::CollateralDeposited {
            admin: caller,
            amount,
            collateral_balance,
        });
    }

    /// Release `amount` of collateral to the admin.
    /// Reverts if the resulting ratio would reach the collateral threshold.
    pub fn withdraw_collateral(&mut self, amount: U256) {
        let caller = self.require_admin();
        if amount.is_zero() {
            self.env().revert(ChorusError::ZeroAmount);
        }

        self.accrue_inflation();

        let balance = self.vault.balance();
        if amount > balance {
            self.env().revert(ChorusError::InsufficientBalance);
        }

        let supply = self.notes.total_supply();
        if !supply.is_zero() {
            let ratio = self.ratio_with(supply, balance - amount);
            if ratio >= self.collateral_threshold() {
                self.env().revert(ChorusError::BelowThreshold);
            }
        }

        let collateral_balance = self.vault.pay_out(caller, amount);

        self.env().emit_event(events::CollateralWithdrawn {
            admin: caller,
            amount,
            collateral_balance,
        });
    }

    /// Issue `amount` Notes to `to`.
    /// Reverts if the resulting ratio would reach the collateral threshold.
    pub fn mint_token(&mut self, amount: U256, to: Address) {
        self.require_admin();
        if amount.is_zero() {
            self.env().revert(ChorusError::ZeroAmount);
        }
        if to == self.env().self_address() || is_zero_address(&to) {
            self.env().revert(ChorusError::InvalidParameter);
        }

        self.accrue_inflation();

        let new_supply = self.notes.total_supply() + amount;
        let ratio = self.ratio_with(new_supply, self.vault.balance());
        if ratio >= self.collateral_threshold() {
            self.env().revert(ChorusError::ExceedsThreshold);
        }

        self.notes.mint(&to, &amount);

        self.env().emit_event(events::NotesMinted {
            to,
            amount,
            collateral_ratio: ratio,
        });
    }

    // ==========================================
    // Holder Functions
    // ==========================================

    /// Escrow `amount` Notes for redemption.
    /// The unlock time grows with the share of the supply being redeemed.
    pub fn request_withdraw_token(&mut self, amount: U256) {
        let caller = self.env().caller();
        if amount.is_zero() {
            self.env().revert(ChorusError::ZeroAmount);
        }
        if self.queue.request_of(&caller).is_some() {
            self.env().revert(ChorusError::WithdrawalPending);
        }

        self.accrue_inflation();

        if self.notes.balance_of(&caller) < amount {
            self.env().revert(ChorusError::InsufficientBalance);
        }

        let now = self.now();
        self.notes.escrow(&caller, &amount);
        let supply = self.notes.total_supply();
        let request = self.queue.enqueue(&caller, amount, now, supply);

        self.env().emit_event(events::WithdrawRequested {
            account: caller,
            amount,
            unlock_at: request.unlock_at,
        });
    }

    /// Redeem the caller's unlocked request for collateral at the current prices.
    pub fn withdraw_token(&mut self) {
        let caller = self.env().caller();
        let now = self.now();

        let request = self.queue.take_matured(&caller, now);

        self.accrue_inflation();

        let token_price = self.inflation.stored_price();
        let collateral_price = self.price_feed.require_fresh_price(now);
        let payout = math::mul_div(request.amount, token_price, collateral_price)
            .unwrap_or_else(|err| self.env().revert(ChorusError::from(err)));

        let escrow = self.env().self_address();
        self.notes.burn(&escrow, &request.amount);
        self.vault.pay_out(caller, payout);

        self.env().emit_event(events::WithdrawFinalized {
            account: caller,
            notes_burned: request.amount,
            collateral_paid: payout,
        });
    }

    /// Exit an undercollateralized system for a pro-rata share of the collateral.
    /// Burns the caller's spendable Notes and any pending withdrawal request.
    pub fn liquidate(&mut self) {
        let caller = self.env().caller();

        // Interest owed to the beneficiary counts towards its holdings
        self.accrue_inflation();

        let holder_notes = self.holder_notes(&caller);
        if holder_notes.is_zero() {
            self.env().revert(ChorusError::NoBalance);
        }

        let supply = self.notes.total_supply();
        let collateral = self.vault.balance();
        let ratio = self.ratio_with(supply, collateral);
        if !liquidation::is_undercollateralized(ratio, self.collateral_threshold()) {
            self.env().revert(ChorusError::NotUndercollateralized);
        }

        let split = liquidation::liquidation_split(
            holder_notes,
            supply,
            collateral,
            self.liquidation_penalty(),
        )
        .unwrap_or_else(|err| self.env().revert(ChorusError::from(err)));

        let spendable = self.notes.balance_of(&caller);
        self.notes.burn(&caller, &spendable);
        let escrowed = self.queue.cancel(&caller);
        let escrow = self.env().self_address();
        self.notes.burn(&escrow, &escrowed);

        let beneficiary = self.beneficiary_address();
        self.vault.pay_out(caller, split.payout);
        self.vault.pay_out(beneficiary, split.penalty);

        self.env().emit_event(events::Liquidated {
            account: caller,
            notes_burned: holder_notes,
            collateral_paid: split.payout,
            penalty: split.penalty,
        });
    }

    /// Accrue inflation up to the current block and pay the beneficiary.
    pub fn update_inflation(&mut self) {
        self.accrue_inflation();
    }

    // ==========================================
    // Note Token (CEP-18)
    // ==========================================

    pub fn name(&self) -> String {
        self.notes.name()
    }

    pub fn symbol(&self) -> String {
        self.notes.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.notes.decimals()
    }

    pub fn total_supply(&self) -> U256 {
        self.notes.total_supply()
    }

    /// Spendable Notes of `address` (escrowed Notes are held by the contract)
    pub fn balance_of(&self, address: Address) -> U256 {
        self.notes.balance_of(&address)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> U256 {
        self.notes.allowance(&owner, &spender)
    }

    pub fn transfer(&mut self, recipient: Address, amount: U256) {
        let sender = self.env().caller();
        self.notes.transfer(&sender, &recipient, &amount);
    }

    pub fn approve(&mut self, spender: Address, amount: U256) {
        let owner = self.env().caller();
        self.notes.approve(&owner, &spender, &amount);
    }

    pub fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256) {
        let spender = self.env().caller();
        self.notes.transfer_from(&spender, &owner, &recipient, &amount);
    }

    // ==========================================
    // View Functions
    // ==========================================

    /// Collateral-currency value of one Note (wad), projected to the current block
    pub fn token_price(&self) -> U256 {
        self.inflation.price_at(self.now())
    }

    /// Note value over collateral value (wad fraction)
    pub fn collateral_ratio(&self) -> U256 {
        self.ratio_with(self.notes.total_supply(), self.vault.balance())
    }

    pub fn collateral_balance(&self) -> U256 {
        self.vault.balance()
    }

    /// Trusted collateral price in wad (reverts while the latest quote is too young)
    pub fn collateral_price(&self) -> U256 {
        self.price_feed.fresh_price()
    }

    /// Minimum age of a collateral quote in seconds
    pub fn collateral_price_age(&self) -> u64 {
        self.price_feed.price_age()
    }

    pub fn infl_last_update(&self) -> u64 {
        self.inflation.last_update()
    }

    pub fn inflation_rate_per_second(&self) -> U256 {
        self.inflation.rate_per_second()
    }

    pub fn collateral_threshold(&self) -> U256 {
        self.collateral_threshold.get_or_default()
    }

    pub fn liquidation_penalty(&self) -> U256 {
        self.liquidation_penalty.get_or_default()
    }

    pub fn admin(&self) -> Option<Address> {
        self.admin.get()
    }

    pub fn beneficiary(&self) -> Option<Address> {
        self.beneficiary.get()
    }

    pub fn collateral_token(&self) -> Option<Address> {
        self.vault.asset()
    }

    pub fn oracle(&self) -> Option<Address> {
        self.price_feed.oracle()
    }

    pub fn withdrawal_request(&self, account: Address) -> Option<WithdrawalRequest> {
        self.queue.request_of(&account)
    }

    /// Notes escrowed by pending withdrawal requests
    pub fn escrowed_notes(&self) -> U256 {
        self.queue.total_escrowed()
    }

    pub fn is_whitelisted_system(&self) -> bool {
        self.notes.is_whitelisted_system()
    }

    pub fn whitelisted_amount(&self, account: Address) -> U256 {
        self.notes.whitelisted_amount(&account)
    }

    // ==========================================
    // Admin Functions
    // ==========================================

    /// Hand the admin role to `new_admin` (admin only)
    pub fn set_admin(&mut self, new_admin: Address) {
        let old_admin = self.require_admin();
        if is_zero_address(&new_admin) {
            self.env().revert(ChorusError::InvalidParameter);
        }
        self.admin.set(new_admin);
        self.env().emit_event(events::AdminChanged {
            old_admin,
            new_admin,
        });
    }

    /// Set the collateral threshold, at most 10,000% (admin only)
    pub fn set_collateral_threshold(&mut self, threshold: U256) {
        self.require_admin();
        if threshold > U256::from(MAX_COLLATERAL_THRESHOLD) {
            self.env().revert(ChorusError::InvalidParameter);
        }
        self.collateral_threshold.set(threshold);
        self.env()
            .emit_event(events::CollateralThresholdSet { threshold });
    }

    /// Set the liquidation penalty, at most 100e18 = 100% (admin only)
    pub fn set_liquidation_penalty(&mut self, penalty: U256) {
        self.require_admin();
        if penalty > U256::from(PENALTY_SCALE) {
            self.env().revert(ChorusError::InvalidParameter);
        }
        self.liquidation_penalty.set(penalty);
        self.env()
            .emit_event(events::LiquidationPenaltySet { penalty });
    }

    /// Cap the Note balance of `account` in a whitelisted system (admin only)
    pub fn set_whitelisted_amount(&mut self, account: Address, amount: U256) {
        self.require_admin();
        self.notes.set_whitelisted_amount(&account, amount);
        self.env()
            .emit_event(events::WhitelistedAmountSet { account, amount });
    }

    // ==========================================
    // Internal Functions
    // ==========================================

    fn now(&self) -> u64 {
        clock::now(&self.env())
    }

    fn require_admin(&self) -> Address {
        let caller = self.env().caller();
        if self.admin.get() != Some(caller) {
            self.env().revert(ChorusError::Unauthorized);
        }
        caller
    }

    fn beneficiary_address(&self) -> Address {
        self.beneficiary
            .get()
            .unwrap_or_else(|| self.env().revert(ChorusError::InvalidParameter))
    }

    /// Spendable plus escrowed Notes of `account`
    fn holder_notes(&self, account: &Address) -> U256 {
        let escrowed = self
            .queue
            .request_of(account)
            .map(|request| request.amount)
            .unwrap_or_default();
        self.notes.balance_of(account) + escrowed
    }

    /// Bring the token price up to date and mint the interest to the beneficiary.
    fn accrue_inflation(&mut self) {
        let now = self.now();
        let supply = self.notes.total_supply();
        let interest = self.inflation.accrue(now, supply);
        if interest.is_zero() {
            return;
        }

        let beneficiary = self.beneficiary_address();
        self.notes.mint(&beneficiary, &interest);

        self.env().emit_event(events::InflationAccrued {
            beneficiary,
            interest,
            token_price: self.inflation.stored_price(),
        });
    }

    /// Collateral ratio for a Note supply and collateral balance.
    ///
    /// Uses the stored token price: accrual keeps `supply * price` constant, so the
    /// ratio is the same before and after pending interest is minted.
    fn ratio_with(&self, supply: U256, collateral: U256) -> U256 {
        if supply.is_zero() {
            return U256::zero();
        }
        let collateral_price = self.price_feed.require_fresh_price(self.now());
        let token_price = self.inflation.stored_price();
        vault::collateral_ratio(supply, token_price, collateral, collateral_price)
            .unwrap_or_else(|err| self.env().revert(ChorusError::from(err)))
    }
}

fn is_zero_address(address: &Address) -> bool {
    *address == Address::Account(AccountHash::new([0u8; 32]))
        || *address == Address::Contract(ContractPackageHash::new([0u8; 32]))
}
