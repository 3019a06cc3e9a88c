//! Note ledger: CEP-18 balances, allowances and supply of the issued Note.
//!
//! Mint, burn and escrow are engine primitives: they are only reachable through
//! `Chorus` entry points that enforce the collateral rules. Escrowed Notes sit on
//! the contract's own address until they are burned.
//!
//! When the ledger runs as a whitelisted system, every mint or transfer must leave
//! each touched account at or below its whitelisted amount. Exempt accounts (the
//! contract itself and the inflation beneficiary) are never checked.

use alloc::string::String;
use odra::casper_types::U256;
use odra::prelude::*;
use odra_modules::cep18::events::{Burn, Mint, SetAllowance, Transfer, TransferFrom};
use odra_modules::cep18::storage::{
    Cep18AllowancesStorage, Cep18BalancesStorage, Cep18DecimalsStorage, Cep18NameStorage,
    Cep18SymbolStorage, Cep18TotalSupplyStorage,
};

use crate::error::ChorusError;

/// Notes use 18 decimals
pub const NOTE_DECIMALS: u8 = 18;

#[odra::module(events = [Mint, Burn, SetAllowance, Transfer, TransferFrom])]
pub struct NoteLedger {
    name: SubModule<Cep18NameStorage>,
    symbol: SubModule<Cep18SymbolStorage>,
    decimals: SubModule<Cep18DecimalsStorage>,
    total_supply: SubModule<Cep18TotalSupplyStorage>,
    balances: SubModule<Cep18BalancesStorage>,
    allowances: SubModule<Cep18AllowancesStorage>,

    whitelisted_system: Var<bool>,
    whitelisted_amounts: Mapping<Address, U256>,
    whitelist_exempt: Mapping<Address, bool>,
}

#[odra::module]
impl NoteLedger {
    pub fn init(&mut self, name: String, symbol: String, whitelisted_system: bool) {
        self.name.set(name);
        self.symbol.set(symbol);
        self.decimals.set(NOTE_DECIMALS);
        self.total_supply.set(U256::zero());
        self.allowances.init();
        self.balances.init();
        self.whitelisted_system.set(whitelisted_system);
    }

    pub fn name(&self) -> String {
        self.name.get()
    }

    pub fn symbol(&self) -> String {
        self.symbol.get()
    }

    pub fn decimals(&self) -> u8 {
        self.decimals.get()
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply.get()
    }

    pub fn balance_of(&self, owner: &Address) -> U256 {
        self.balances.get(owner).unwrap_or_default()
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances.get_or_default(owner, spender)
    }

    pub fn is_whitelisted_system(&self) -> bool {
        self.whitelisted_system.get_or_default()
    }

    pub fn whitelisted_amount(&self, account: &Address) -> U256 {
        self.whitelisted_amounts.get(account).unwrap_or_default()
    }

    pub fn set_whitelisted_amount(&mut self, account: &Address, amount: U256) {
        self.whitelisted_amounts.set(account, amount);
    }

    /// Exclude `account` from whitelist checks.
    pub fn exempt(&mut self, account: &Address) {
        self.whitelist_exempt.set(account, true);
    }

    /// Holder-initiated transfer.
    pub fn transfer(&mut self, sender: &Address, recipient: &Address, amount: &U256) {
        self.require_distinct_holders(sender, recipient);
        self.raw_transfer(sender, recipient, amount);
        self.require_whitelisted(sender);
        self.require_whitelisted(recipient);
        self.env().emit_event(Transfer {
            sender: *sender,
            recipient: *recipient,
            amount: *amount,
        });
    }

    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: &U256) {
        if owner == spender {
            self.env().revert(ChorusError::InvalidParameter);
        }
        self.allowances.set(owner, spender, *amount);
        self.env().emit_event(SetAllowance {
            owner: *owner,
            spender: *spender,
            allowance: *amount,
        });
    }

    /// Transfer on behalf of `owner`, spending `spender`'s allowance.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        recipient: &Address,
        amount: &U256,
    ) {
        self.require_distinct_holders(owner, recipient);
        let allowance = self.allowances.get_or_default(owner, spender);
        if allowance < *amount {
            self.env().revert(ChorusError::InsufficientAllowance);
        }
        self.allowances.set(owner, spender, allowance - *amount);
        self.raw_transfer(owner, recipient, amount);
        self.require_whitelisted(owner);
        self.require_whitelisted(recipient);
        self.env().emit_event(TransferFrom {
            spender: *spender,
            owner: *owner,
            recipient: *recipient,
            amount: *amount,
        });
    }

    /// Issue new Notes.
    pub fn mint(&mut self, to: &Address, amount: &U256) {
        self.total_supply.add(*amount);
        self.balances.add(to, *amount);
        self.require_whitelisted(to);
        self.env().emit_event(Mint {
            recipient: *to,
            amount: *amount,
        });
    }

    /// Destroy Notes held by `from`.
    pub fn burn(&mut self, from: &Address, amount: &U256) {
        if amount.is_zero() {
            return;
        }
        let balance = self.balance_of(from);
        if balance < *amount {
            self.env().revert(ChorusError::InsufficientBalance);
        }
        self.balances.subtract(from, *amount);
        self.total_supply.subtract(*amount);
        self.env().emit_event(Burn {
            owner: *from,
            amount: *amount,
        });
    }

    /// Move Notes from `from` into the contract's own balance.
    pub fn escrow(&mut self, from: &Address, amount: &U256) {
        let escrow = self.env().self_address();
        self.raw_transfer(from, &escrow, amount);
        self.env().emit_event(Transfer {
            sender: *from,
            recipient: escrow,
            amount: *amount,
        });
    }

    fn raw_transfer(&mut self, sender: &Address, recipient: &Address, amount: &U256) {
        let balance = self.balance_of(sender);
        if balance < *amount {
            self.env().revert(ChorusError::InsufficientBalance);
        }
        if !amount.is_zero() {
            self.balances.subtract(sender, *amount);
            self.balances.add(recipient, *amount);
        }
    }

    // Holders cannot send to themselves or into the escrow address.
    fn require_distinct_holders(&self, sender: &Address, recipient: &Address) {
        if sender == recipient || *recipient == self.env().self_address() {
            self.env().revert(ChorusError::InvalidParameter);
        }
    }

    fn require_whitelisted(&self, account: &Address) {
        if !self.is_whitelisted_system() || self.whitelist_exempt.get(account).unwrap_or_default() {
            return;
        }
        if self.balance_of(account) > self.whitelisted_amount(account) {
            self.env().revert(ChorusError::NotWhitelisted);
        }
    }
}
