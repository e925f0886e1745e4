//! Split Engine: collateral in, outcome claims out.
//!
//! ```text
//! guard ─▶ validate ─▶ pull collateral ─▶ credit pool/totals ─▶ mint ─▶ event
//!          (lock)      (no lock held)     (lock)
//! ```
//!
//! Nothing is written until the pull succeeds, and every counter the write
//! touches is overflow-checked before the pull, so a failed split leaves the
//! ledger exactly as it was.

use condex_types::{Address, ConditionId, CondexError, LedgerEventKind, OutcomeSelector, Result};

use crate::collateral::CollateralAsset;
use crate::engine::ConditionalTokens;

impl ConditionalTokens {
    /// Deposit `amount` of `collateral` and mint `amount` claims on every
    /// outcome `selector` names.
    ///
    /// # Errors
    /// - `NotPrepared` for an unknown condition
    /// - `ZeroAmount` if `amount == 0`
    /// - `CustodyCaller` if `caller` is the engine's custody address
    /// - `AlreadyResolved` once the condition has a payout vector
    /// - `CollateralMismatch` if the condition is bound to another asset
    /// - `ArithmeticOverflow` if the pool or a total would exceed `u128`
    /// - `CollateralTransferFailed` if the asset refuses the pull
    /// - `ReentrantCall` while another mutating call is in progress
    pub fn split_position(
        &self,
        caller: Address,
        collateral: &dyn CollateralAsset,
        condition_id: ConditionId,
        selector: OutcomeSelector,
        amount: u128,
    ) -> Result<()> {
        let _entered = self.enter("split_position")?;
        let asset = collateral.address();
        let custody = self.custody_address();

        {
            let state = self.state()?;
            let condition = state.registry.require(condition_id)?;
            if amount == 0 {
                return Err(CondexError::ZeroAmount);
            }
            // A pull from custody into custody moves nothing.
            if caller == custody {
                return Err(CondexError::CustodyCaller(caller));
            }
            if condition.is_resolved() {
                return Err(CondexError::AlreadyResolved(condition_id));
            }
            if let Some(bound) = condition.collateral.filter(|bound| *bound != asset) {
                return Err(CondexError::CollateralMismatch {
                    expected: bound,
                    actual: asset,
                });
            }
            state.registry.preview_split(condition_id, selector, amount)?;
        }

        collateral
            .transfer_from(custody, caller, custody, amount)
            .map_err(|e| {
                tracing::warn!(
                    condition = %condition_id.short(),
                    caller = %caller,
                    amount,
                    error = %e,
                    "Collateral pull failed"
                );
                CondexError::CollateralTransferFailed {
                    reason: e.to_string(),
                }
            })?;

        let mut state = self.state()?;
        state.registry.bind_collateral(condition_id, asset)?;
        state.registry.credit_split(condition_id, selector, amount)?;
        for outcome in selector.outcomes() {
            state
                .claims
                .mint(caller, asset, condition_id, outcome, amount)?;
        }
        state.custody.record_deposit(condition_id, asset, amount)?;
        state.events.push(LedgerEventKind::PositionSplit {
            holder: caller,
            collateral: asset,
            condition_id,
            selector,
            amount,
        });

        tracing::info!(
            condition = %condition_id.short(),
            caller = %caller,
            %selector,
            amount,
            "Position split"
        );
        Ok(())
    }
}
