//! Collateral vault and ratio math.
//!
//! The vault pulls the collateral asset from the admin on deposit and pays it out on
//! admin withdrawals, redemptions and liquidations. `balance` only moves together
//! with an asset transfer, so it always equals the asset held by the contract.

use odra::casper_types::U256;
use odra::prelude::*;
use odra::ContractRef;

use crate::error::ChorusError;
use crate::math::{self, MathError};

/// CEP-18 interface of the collateral asset.
#[odra::external_contract]
pub trait CollateralToken {
    fn transfer(&mut self, recipient: Address, amount: U256);
    fn transfer_from(&mut self, owner: Address, recipient: Address, amount: U256);
    fn balance_of(&self, address: Address) -> U256;
    fn allowance(&self, owner: Address, spender: Address) -> U256;
}

/// Collateral ratio as a wad fraction: Note value over collateral value.
///
/// Zero when no Notes are outstanding; `U256::max_value()` when Notes are
/// outstanding against no collateral value.
pub fn collateral_ratio(
    note_supply: U256,
    token_price: U256,
    collateral: U256,
    collateral_price: U256,
) -> Result<U256, MathError> {
    if note_supply.is_zero() {
        return Ok(U256::zero());
    }
    let note_value = math::mul_div(note_supply, token_price, math::wad())?;
    let collateral_value = math::mul_div(collateral, collateral_price, math::wad())?;
    if collateral_value.is_zero() {
        return Ok(U256::max_value());
    }
    math::mul_div(note_value, math::wad(), collateral_value)
}

#[odra::module]
pub struct CollateralVault {
    asset: Var<Address>,
    balance: Var<U256>,
}

#[odra::module]
impl CollateralVault {
    pub fn init(&mut self, asset: Address) {
        self.asset.set(asset);
        self.balance.set(U256::zero());
    }

    pub fn asset(&self) -> Option<Address> {
        self.asset.get()
    }

    /// Collateral held for Note holders
    pub fn balance(&self) -> U256 {
        self.balance.get_or_default()
    }

    /// Pull `amount` of the asset from `from` (requires prior approve).
    pub fn deposit(&mut self, from: Address, amount: U256) -> U256 {
        let mut asset = self.asset_ref();
        let self_address = self.env().self_address();

        if asset.allowance(from, self_address) < amount {
            self.env().revert(ChorusError::InsufficientAllowance);
        }
        if asset.balance_of(from) < amount {
            self.env().revert(ChorusError::InsufficientBalance);
        }

        asset.transfer_from(from, self_address, amount);

        let new_balance = self.balance.get_or_default() + amount;
        self.balance.set(new_balance);
        new_balance
    }

    /// Send `amount` of the asset to `to`.
    pub fn pay_out(&mut self, to: Address, amount: U256) -> U256 {
        let balance = self.balance.get_or_default();
        if amount > balance {
            self.env().revert(ChorusError::InsufficientCollateral);
        }
        let new_balance = balance - amount;
        self.balance.set(new_balance);

        if !amount.is_zero() {
            self.asset_ref().transfer(to, amount);
        }
        new_balance
    }

    fn asset_ref(&self) -> CollateralTokenContractRef {
        let asset = self
            .asset
            .get()
            .unwrap_or_else(|| self.env().revert(ChorusError::InvalidParameter));
        CollateralTokenContractRef::new(self.env(), asset)
    }
}
