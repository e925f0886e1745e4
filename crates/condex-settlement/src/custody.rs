//! Custody accounting and the conservation check.
//!
//! Invariant, per collateral asset, checked on demand:
//! ```text
//! custody_balance(asset) >= Σ over conditions bound to asset (deposited − paid_out)
//! ```
//!
//! The right-hand side is what the engine still owes: unredeemed claims plus
//! floor-division dust that no holder can ever withdraw. The condition's own
//! `collateral_pool` is never decremented; payouts are tracked here instead.

use std::collections::HashMap;

use condex_types::{Address, ConditionId, CondexError, Result};
use serde::{Deserialize, Serialize};

/// Deposit / payout totals for one condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyReport {
    pub condition_id: ConditionId,
    pub collateral: Address,
    /// Total accepted by splits. Equals the condition's `collateral_pool`.
    pub deposited: u128,
    /// Total pushed out by redemptions.
    pub paid_out: u128,
}

impl CustodyReport {
    /// Collateral still held for this condition.
    #[must_use]
    pub fn residual(&self) -> u128 {
        self.deposited.saturating_sub(self.paid_out)
    }
}

/// Tracks per-condition custody totals since genesis.
pub struct CustodyLedger {
    accounts: HashMap<ConditionId, CustodyReport>,
}

impl CustodyLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            accounts: HashMap::new(),
        }
    }

    /// Record an accepted deposit.
    ///
    /// # Errors
    /// `CollateralMismatch` if the condition's account is in another asset,
    /// `ArithmeticOverflow` if the total would exceed `u128`.
    pub fn record_deposit(
        &mut self,
        condition_id: ConditionId,
        collateral: Address,
        amount: u128,
    ) -> Result<()> {
        let account = self
            .accounts
            .entry(condition_id)
            .or_insert(CustodyReport {
                condition_id,
                collateral,
                deposited: 0,
                paid_out: 0,
            });
        if account.collateral != collateral {
            return Err(CondexError::CollateralMismatch {
                expected: account.collateral,
                actual: collateral,
            });
        }
        account.deposited = account
            .deposited
            .checked_add(amount)
            .ok_or(CondexError::ArithmeticOverflow("custody deposits"))?;
        Ok(())
    }

    /// Record a completed payout.
    ///
    /// # Errors
    /// `CustodyInvariantViolation` if the payout exceeds what the condition
    /// still holds.
    pub fn record_payout(&mut self, condition_id: ConditionId, amount: u128) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let account = self.accounts.get_mut(&condition_id).ok_or_else(|| {
            CondexError::CustodyInvariantViolation {
                reason: format!("payout of {amount} from {condition_id} with no deposits"),
            }
        })?;
        let paid_out = account
            .paid_out
            .checked_add(amount)
            .filter(|total| *total <= account.deposited)
            .ok_or_else(|| CondexError::CustodyInvariantViolation {
                reason: format!(
                    "{condition_id}: paid out {} + {amount} exceeds deposited {}",
                    account.paid_out, account.deposited
                ),
            })?;
        account.paid_out = paid_out;
        Ok(())
    }

    /// Deposited and paid-out totals, `None` before the first deposit.
    #[must_use]
    pub fn report(&self, condition_id: &ConditionId) -> Option<CustodyReport> {
        self.accounts.get(condition_id).copied()
    }

    /// What custody must hold of `collateral` to honour every account.
    #[must_use]
    pub fn expected_custody(&self, collateral: Address) -> u128 {
        self.accounts
            .values()
            .filter(|a| a.collateral == collateral)
            .map(CustodyReport::residual)
            .fold(0u128, u128::saturating_add)
    }

    /// Verify the actual custody balance covers every residual.
    ///
    /// # Errors
    /// Returns [`CondexError::CustodyInvariantViolation`] if it does not.
    pub fn verify(&self, collateral: Address, actual_custody: u128) -> Result<()> {
        let expected = self.expected_custody(collateral);
        if actual_custody < expected {
            return Err(CondexError::CustodyInvariantViolation {
                reason: format!(
                    "asset {collateral}: custody holds {actual_custody}, ledger owes {expected}"
                ),
            });
        }
        Ok(())
    }
}

impl Default for CustodyLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cond(byte: u8) -> ConditionId {
        ConditionId::from_bytes([byte; 32])
    }

    #[test]
    fn empty_ledger_expects_nothing() {
        let ledger = CustodyLedger::new();
        let usdc = Address::repeat_byte(0xAA);
        assert_eq!(ledger.expected_custody(usdc), 0);
        assert!(ledger.verify(usdc, 0).is_ok());
    }

    #[test]
    fn deposits_and_payouts_move_residual() {
        let mut ledger = CustodyLedger::new();
        let usdc = Address::repeat_byte(0xAA);
        ledger.record_deposit(cond(1), usdc, 750).unwrap();
        ledger.record_payout(cond(1), 333).unwrap();
        ledger.record_payout(cond(1), 416).unwrap();
        let report = ledger.report(&cond(1)).unwrap();
        assert_eq!(report.deposited, 750);
        assert_eq!(report.paid_out, 749);
        assert_eq!(report.residual(), 1);
        assert_eq!(ledger.expected_custody(usdc), 1);
    }

    #[test]
    fn overpayment_is_an_invariant_violation() {
        let mut ledger = CustodyLedger::new();
        let usdc = Address::repeat_byte(0xAA);
        ledger.record_deposit(cond(1), usdc, 100).unwrap();
        let err = ledger.record_payout(cond(1), 101).unwrap_err();
        assert!(matches!(err, CondexError::CustodyInvariantViolation { .. }));
        assert_eq!(ledger.report(&cond(1)).unwrap().paid_out, 0);

        let err = ledger.record_payout(cond(2), 1).unwrap_err();
        assert!(matches!(err, CondexError::CustodyInvariantViolation { .. }));
        assert!(ledger.record_payout(cond(2), 0).is_ok());
    }

    #[test]
    fn verify_sums_per_asset() {
        let mut ledger = CustodyLedger::new();
        let usdc = Address::repeat_byte(0xAA);
        let dai = Address::repeat_byte(0xBB);
        ledger.record_deposit(cond(1), usdc, 100).unwrap();
        ledger.record_deposit(cond(2), usdc, 50).unwrap();
        ledger.record_deposit(cond(3), dai, 7).unwrap();

        assert!(ledger.verify(usdc, 150).is_ok());
        assert!(ledger.verify(usdc, 151).is_ok());
        assert!(ledger.verify(dai, 7).is_ok());
        let err = ledger.verify(usdc, 149).unwrap_err();
        assert!(matches!(err, CondexError::CustodyInvariantViolation { .. }));
        assert!(ledger.verify(dai, 0).is_err());
    }

    #[test]
    fn account_is_single_asset() {
        let mut ledger = CustodyLedger::new();
        ledger
            .record_deposit(cond(1), Address::repeat_byte(0xAA), 1)
            .unwrap();
        let err = ledger
            .record_deposit(cond(1), Address::repeat_byte(0xBB), 1)
            .unwrap_err();
        assert!(matches!(err, CondexError::CollateralMismatch { .. }));
    }
}
