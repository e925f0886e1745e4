//! Collateral asset seam.
//!
//! The engine never owns collateral balances itself. It asks the asset to
//! move funds into and out of its custody address, and treats any failure as
//! a hard failure of the calling operation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use condex_types::Address;
use thiserror::Error;

/// Why an asset refused a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollateralError {
    #[error("insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("insufficient allowance: need {needed}, have {available}")]
    InsufficientAllowance { needed: u128, available: u128 },

    #[error("account frozen: {0}")]
    AccountFrozen(Address),

    #[error("transfer rejected: {0}")]
    Rejected(String),
}

/// A fungible collateral asset with standard pull/push semantics.
///
/// Implementations are untrusted: `transfer_from` and `transfer` may call
/// back into the engine before returning.
pub trait CollateralAsset: Send + Sync {
    /// Identity of the asset; part of every position id it backs.
    fn address(&self) -> Address;

    fn balance_of(&self, owner: Address) -> u128;

    /// Move `amount` from `from` to `to`, spending `spender`'s allowance.
    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), CollateralError>;

    /// Move `amount` from `from` (the caller's own funds) to `to`.
    fn transfer(&self, from: Address, to: Address, amount: u128) -> Result<(), CollateralError>;
}

/// A completed transfer, as seen by a [`TransferHook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferNotice {
    pub from: Address,
    pub to: Address,
    pub amount: u128,
}

/// Callback run after every successful transfer, with no internal lock held.
pub type TransferHook = Arc<dyn Fn(TransferNotice) + Send + Sync>;

#[derive(Default)]
struct TokenState {
    balances: HashMap<Address, u128>,
    allowances: HashMap<(Address, Address), u128>,
    frozen: HashSet<Address>,
    total_supply: u128,
}

/// In-memory fungible token used as reference collateral.
///
/// Supports balances, allowances, frozen accounts (transfers touching them
/// are rejected) and an optional post-transfer hook that lets a test play
/// a hostile asset calling back into the engine.
pub struct InMemoryCollateral {
    address: Address,
    state: Mutex<TokenState>,
    hook: Mutex<Option<TransferHook>>,
}

impl InMemoryCollateral {
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            state: Mutex::new(TokenState::default()),
            hook: Mutex::new(None),
        }
    }

    /// Create new units out of thin air.
    pub fn mint(&self, to: Address, amount: u128) {
        let mut state = self.lock();
        let balance = state.balances.entry(to).or_default();
        *balance = balance.saturating_add(amount);
        state.total_supply = state.total_supply.saturating_add(amount);
    }

    pub fn approve(&self, owner: Address, spender: Address, amount: u128) {
        self.lock().allowances.insert((owner, spender), amount);
    }

    #[must_use]
    pub fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.lock()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn total_supply(&self) -> u128 {
        self.lock().total_supply
    }

    pub fn freeze_account(&self, account: Address) {
        self.lock().frozen.insert(account);
    }

    pub fn unfreeze_account(&self, account: Address) {
        self.lock().frozen.remove(&account);
    }

    pub fn set_hook(&self, hook: TransferHook) {
        *self.hook.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(hook);
    }

    pub fn clear_hook(&self) {
        *self.hook.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }

    fn lock(&self) -> MutexGuard<'_, TokenState> {
        // Every write below is validate-then-apply, so a poisoned lock still
        // guards consistent balances.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn move_funds(
        state: &mut TokenState,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), CollateralError> {
        if state.frozen.contains(&from) {
            return Err(CollateralError::AccountFrozen(from));
        }
        if state.frozen.contains(&to) {
            return Err(CollateralError::AccountFrozen(to));
        }
        let available = state.balances.get(&from).copied().unwrap_or(0);
        if available < amount {
            return Err(CollateralError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        if from != to {
            state.balances.insert(from, available - amount);
            let credited = state.balances.entry(to).or_default();
            *credited = credited.saturating_add(amount);
        }
        Ok(())
    }

    fn notify(&self, notice: TransferNotice) {
        let hook = self
            .hook
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            hook(notice);
        }
    }
}

impl CollateralAsset for InMemoryCollateral {
    fn address(&self) -> Address {
        self.address
    }

    fn balance_of(&self, owner: Address) -> u128 {
        self.lock().balances.get(&owner).copied().unwrap_or(0)
    }

    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), CollateralError> {
        {
            let mut state = self.lock();
            let allowed = state
                .allowances
                .get(&(from, spender))
                .copied()
                .unwrap_or(0);
            if allowed < amount {
                return Err(CollateralError::InsufficientAllowance {
                    needed: amount,
                    available: allowed,
                });
            }
            Self::move_funds(&mut state, from, to, amount)?;
            state.allowances.insert((from, spender), allowed - amount);
        }
        self.notify(TransferNotice { from, to, amount });
        Ok(())
    }

    fn transfer(&self, from: Address, to: Address, amount: u128) -> Result<(), CollateralError> {
        {
            let mut state = self.lock();
            Self::move_funds(&mut state, from, to, amount)?;
        }
        self.notify(TransferNotice { from, to, amount });
        Ok(())
    }
}
