//! Claim ledger: per-(holder, position) outcome claim balances.
//!
//! A position is one outcome of one condition backed by one collateral asset,
//! addressed by its [`PositionId`]. All mutations are atomic: either the full
//! operation succeeds or every balance is unchanged. No balance ever goes
//! negative.

use std::collections::HashMap;

use condex_types::{Address, ConditionId, CondexError, Outcome, PositionId, Result};
use serde::{Deserialize, Serialize};

/// What a position id stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionInfo {
    pub collateral: Address,
    pub condition_id: ConditionId,
    pub outcome: Outcome,
}

/// Source of truth for outcome claim balances.
pub struct ClaimLedger {
    /// Per-(holder, position) balances. Zero balances are removed.
    balances: HashMap<(Address, PositionId), u128>,
    /// Reverse lookup for every position ever minted.
    positions: HashMap<PositionId, PositionInfo>,
    /// Currently outstanding claims per position (minted − burned).
    supply: HashMap<PositionId, u128>,
}

impl ClaimLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
            positions: HashMap::new(),
            supply: HashMap::new(),
        }
    }

    /// Mint `amount` claims on `outcome` of `condition_id` to `holder`.
    ///
    /// # Errors
    /// Returns `ZeroAmount` for a zero mint, `ArithmeticOverflow` if the
    /// balance or supply would exceed `u128`.
    pub fn mint(
        &mut self,
        holder: Address,
        collateral: Address,
        condition_id: ConditionId,
        outcome: Outcome,
        amount: u128,
    ) -> Result<PositionId> {
        if amount == 0 {
            return Err(CondexError::ZeroAmount);
        }
        let position_id = PositionId::for_outcome(collateral, condition_id, outcome);

        let balance = self.balance_of(holder, position_id);
        let supply = self.total_supply(position_id);
        let new_balance = balance
            .checked_add(amount)
            .ok_or(CondexError::ArithmeticOverflow("claim balance"))?;
        let new_supply = supply
            .checked_add(amount)
            .ok_or(CondexError::ArithmeticOverflow("claim supply"))?;

        self.positions.entry(position_id).or_insert(PositionInfo {
            collateral,
            condition_id,
            outcome,
        });
        self.balances.insert((holder, position_id), new_balance);
        self.supply.insert(position_id, new_supply);
        Ok(position_id)
    }

    /// Burn `amount` claims from `holder`.
    ///
    /// # Errors
    /// Returns `InsufficientClaims` if the holder has fewer than `amount`.
    pub fn burn(&mut self, holder: Address, position_id: PositionId, amount: u128) -> Result<()> {
        let available = self.balance_of(holder, position_id);
        if available < amount {
            return Err(CondexError::InsufficientClaims {
                needed: amount,
                available,
            });
        }
        self.set_balance(holder, position_id, available - amount);
        if let Some(supply) = self.supply.get_mut(&position_id) {
            *supply = supply.saturating_sub(amount);
        }
        Ok(())
    }

    /// Burn the holder's entire balance of a position, returning how much was burned.
    pub fn burn_all(&mut self, holder: Address, position_id: PositionId) -> u128 {
        let stake = self.balance_of(holder, position_id);
        if stake > 0 {
            self.set_balance(holder, position_id, 0);
            if let Some(supply) = self.supply.get_mut(&position_id) {
                *supply = supply.saturating_sub(stake);
            }
        }
        stake
    }

    /// Move claims between holders. Used by the external order-matching layer;
    /// does not touch any condition aggregate.
    ///
    /// # Errors
    /// - `ZeroAmount` if `amount == 0`
    /// - `InsufficientClaims` if `from` holds fewer than `amount`
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        position_id: PositionId,
        amount: u128,
    ) -> Result<()> {
        if amount == 0 {
            return Err(CondexError::ZeroAmount);
        }
        let available = self.balance_of(from, position_id);
        if available < amount {
            return Err(CondexError::InsufficientClaims {
                needed: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        // Cannot overflow: the recipient's balance is bounded by total supply.
        let credited = self.balance_of(to, position_id) + amount;
        self.set_balance(from, position_id, available - amount);
        self.set_balance(to, position_id, credited);
        Ok(())
    }

    /// Claims `holder` owns on `position_id`; zero if none.
    #[must_use]
    pub fn balance_of(&self, holder: Address, position_id: PositionId) -> u128 {
        self.balances
            .get(&(holder, position_id))
            .copied()
            .unwrap_or(0)
    }

    /// [`Self::balance_of`] for each pair, in input order.
    #[must_use]
    pub fn balance_of_batch(&self, queries: &[(Address, PositionId)]) -> Vec<u128> {
        queries
            .iter()
            .map(|(holder, position_id)| self.balance_of(*holder, *position_id))
            .collect()
    }

    /// Balance keyed by (holder, condition, outcome) for a given collateral.
    #[must_use]
    pub fn claim_balance(
        &self,
        holder: Address,
        collateral: Address,
        condition_id: ConditionId,
        outcome: Outcome,
    ) -> u128 {
        self.balance_of(
            holder,
            PositionId::for_outcome(collateral, condition_id, outcome),
        )
    }

    /// Claims currently outstanding on a position (minted minus burned).
    #[must_use]
    pub fn total_supply(&self, position_id: PositionId) -> u128 {
        self.supply.get(&position_id).copied().unwrap_or(0)
    }

    /// Collateral, condition and outcome a position id was derived from.
    #[must_use]
    pub fn position(&self, position_id: &PositionId) -> Option<&PositionInfo> {
        self.positions.get(position_id)
    }

    /// Number of (holder, position) pairs with a non-zero balance.
    #[must_use]
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    fn set_balance(&mut self, holder: Address, position_id: PositionId, amount: u128) {
        if amount == 0 {
            self.balances.remove(&(holder, position_id));
        } else {
            self.balances.insert((holder, position_id), amount);
        }
    }
}

impl Default for ClaimLedger {
    fn default() -> Self {
        Self::new()
    }
}
