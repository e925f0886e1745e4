//! Settlement Engine: proportional redemption of resolved claims.
//!
//! For each outcome selected by the mask, a holder with `stake` claims gets
//!
//! ```text
//! payout_i = floor( stake · pool · numerator_i / (denominator · outstanding_i) )
//! ```
//!
//! evaluated in 256-bit intermediates. Floor division leaves dust in custody
//! that no holder can withdraw; [`crate::custody`] accounts for it.
//!
//! Order: validate and price every outcome, burn, push the payout with no lock
//! held, record. If the push fails the burned claims are minted back.

use condex_types::{
    Address, Condition, ConditionId, CondexError, LedgerEventKind, Outcome, OutcomeSelector,
    PositionId, Result,
};
use ethnum::U256;
use serde::{Deserialize, Serialize};

use crate::collateral::CollateralAsset;
use crate::engine::ConditionalTokens;

/// What a redemption burned and paid, per outcome index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionReceipt {
    pub condition_id: ConditionId,
    pub holder: Address,
    pub collateral: Address,
    pub mask: OutcomeSelector,
    pub burned: [u128; 2],
    pub payouts: [u128; 2],
    pub total_payout: u128,
}

impl RedemptionReceipt {
    /// True when the holder had nothing to redeem under the mask.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.burned == [0, 0]
    }
}

/// Price `stake` claims on `outcome` of a resolved condition.
///
/// # Errors
/// - `Unresolved` if the condition has no payout vector
/// - `EmptySide` if `stake > 0` but nothing is outstanding on that side
/// - `ArithmeticOverflow` if the result does not fit `u128`
pub fn payout_for(condition: &Condition, outcome: Outcome, stake: u128) -> Result<u128> {
    if stake == 0 {
        return Ok(0);
    }
    if condition.payout_denominator == 0 {
        return Err(CondexError::Unresolved(condition.id));
    }
    let outstanding = condition.outstanding(outcome);
    if outstanding == 0 {
        return Err(CondexError::EmptySide {
            condition: condition.id,
            outcome: outcome.index(),
        });
    }

    let numerator = U256::new(stake)
        .checked_mul(U256::new(condition.collateral_pool))
        .and_then(|v| v.checked_mul(U256::new(condition.payout_numerator(outcome))))
        .ok_or(CondexError::ArithmeticOverflow("payout numerator"))?;
    let denominator = U256::new(condition.payout_denominator)
        .checked_mul(U256::new(outstanding))
        .ok_or(CondexError::ArithmeticOverflow("payout denominator"))?;

    let (high, low) = (numerator / denominator).into_words();
    if high != 0 {
        return Err(CondexError::ArithmeticOverflow("payout"));
    }
    Ok(low)
}

impl ConditionalTokens {
    /// Burn the caller's claims on every outcome in `mask` and pay out their
    /// share of the pool. Outcomes the caller holds nothing of are skipped.
    ///
    /// # Errors
    /// - `NotPrepared`, `Unresolved`
    /// - `CustodyCaller` if `caller` is the engine's custody address
    /// - `CollateralMismatch` if `collateral` is not the condition's asset
    /// - `EmptySide`, `ArithmeticOverflow` from payout pricing
    /// - `PayoutTransferFailed` if the asset refuses the push; the burn is
    ///   undone first
    /// - `Internal` if the push failed and the burn could not be undone
    /// - `ReentrantCall` while another mutating call is in progress
    pub fn redeem_positions(
        &self,
        caller: Address,
        collateral: &dyn CollateralAsset,
        condition_id: ConditionId,
        mask: OutcomeSelector,
    ) -> Result<RedemptionReceipt> {
        let _entered = self.enter("redeem_positions")?;
        let asset = collateral.address();
        let custody = self.custody_address();

        let mut receipt = RedemptionReceipt {
            condition_id,
            holder: caller,
            collateral: asset,
            mask,
            burned: [0; 2],
            payouts: [0; 2],
            total_payout: 0,
        };

        {
            let mut guard = self.state()?;
            let state = &mut *guard;
            let condition = state.registry.require(condition_id)?;
            if !condition.is_resolved() {
                return Err(CondexError::Unresolved(condition_id));
            }
            if caller == custody {
                return Err(CondexError::CustodyCaller(caller));
            }
            if let Some(bound) = condition.collateral.filter(|bound| *bound != asset) {
                return Err(CondexError::CollateralMismatch {
                    expected: bound,
                    actual: asset,
                });
            }

            for outcome in mask.outcomes() {
                let i = outcome.index();
                let position_id = PositionId::for_outcome(asset, condition_id, outcome);
                receipt.burned[i] = state.claims.balance_of(caller, position_id);
                receipt.payouts[i] = payout_for(condition, outcome, receipt.burned[i])?;
                tracing::debug!(
                    condition = %condition_id.short(),
                    %outcome,
                    stake = receipt.burned[i],
                    pool = condition.collateral_pool,
                    outstanding = condition.outstanding(outcome),
                    payout = receipt.payouts[i],
                    "Payout computed"
                );
            }
            receipt.total_payout = receipt.payouts[0]
                .checked_add(receipt.payouts[1])
                .ok_or(CondexError::ArithmeticOverflow("total payout"))?;

            if receipt.is_noop() {
                return Ok(receipt);
            }
            // Priced and burned under the same lock, so the balances match.
            for outcome in mask.outcomes() {
                let position_id = PositionId::for_outcome(asset, condition_id, outcome);
                state.claims.burn_all(caller, position_id);
            }
        }

        if receipt.total_payout > 0 {
            if let Err(e) = collateral.transfer(custody, caller, receipt.total_payout) {
                return Err(self.roll_back_failed_payout(&receipt, &e.to_string()));
            }
        }

        let mut state = self.state()?;
        state
            .custody
            .record_payout(condition_id, receipt.total_payout)?;
        state.events.push(LedgerEventKind::PayoutRedeemed {
            holder: caller,
            collateral: asset,
            condition_id,
            mask,
            burned: receipt.burned,
            payout: receipt.total_payout,
        });

        tracing::info!(
            condition = %condition_id.short(),
            caller = %caller,
            burned = ?receipt.burned,
            payout = receipt.total_payout,
            "Positions redeemed"
        );
        Ok(receipt)
    }

    /// Undo the burn of a redemption whose payout push failed and build the
    /// error to return. A failed restore surfaces as `Internal`.
    fn roll_back_failed_payout(&self, receipt: &RedemptionReceipt, reason: &str) -> CondexError {
        match self.restore_burned(receipt) {
            Ok(()) => {
                tracing::warn!(
                    condition = %receipt.condition_id.short(),
                    caller = %receipt.holder,
                    payout = receipt.total_payout,
                    error = reason,
                    "Payout transfer failed, burn rolled back"
                );
                CondexError::PayoutTransferFailed {
                    reason: reason.to_owned(),
                }
            }
            Err(restore) => {
                tracing::error!(
                    condition = %receipt.condition_id.short(),
                    caller = %receipt.holder,
                    burned = ?receipt.burned,
                    payout_error = reason,
                    restore_error = %restore,
                    "Payout transfer failed and burned claims could not be restored"
                );
                CondexError::Internal(format!(
                    "payout transfer failed ({reason}); restoring burned claims failed ({restore})"
                ))
            }
        }
    }

    fn restore_burned(&self, receipt: &RedemptionReceipt) -> Result<()> {
        let mut state = self.state()?;
        for outcome in receipt.mask.outcomes() {
            let stake = receipt.burned[outcome.index()];
            if stake > 0 {
                state.claims.mint(
                    receipt.holder,
                    receipt.collateral,
                    receipt.condition_id,
                    outcome,
                    stake,
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::collateral::{CollateralError, InMemoryCollateral};
    use condex_types::{EngineConfig, QuestionId};

    fn resolved(pool: u128, outstanding: [u128; 2], numerators: [u128; 2]) -> Condition {
        let mut c = Condition::prepared(
            ConditionId::from_bytes([1; 32]),
            Address::repeat_byte(9),
            QuestionId::from_bytes([2; 32]),
            2,
        );
        c.collateral_pool = pool;
        c.total_outstanding_claims = outstanding;
        c.payout_numerators = numerators;
        c.payout_denominator = numerators[0] + numerators[1];
        c
    }

    #[test]
    fn winner_takes_pool() {
        let c = resolved(1_000, [600, 400], [1, 0]);
        assert_eq!(payout_for(&c, Outcome::Zero, 600).unwrap(), 1_000);
        assert_eq!(payout_for(&c, Outcome::One, 400).unwrap(), 0);
    }

    #[test]
    fn floor_division_leaves_dust() {
        let c = resolved(750, [450, 300], [1, 0]);
        let a = payout_for(&c, Outcome::Zero, 200).unwrap();
        let b = payout_for(&c, Outcome::Zero, 250).unwrap();
        assert_eq!((a, b), (333, 416));
        assert_eq!(750 - (a + b), 1);
    }

    #[test]
    fn fractional_resolution() {
        let c = resolved(100, [100, 100], [500_000, 500_000]);
        assert_eq!(payout_for(&c, Outcome::Zero, 100).unwrap(), 50);
        assert_eq!(payout_for(&c, Outcome::One, 100).unwrap(), 50);
    }

    #[test]
    fn zero_stake_prices_to_zero_even_on_empty_side() {
        let c = resolved(100, [0, 100], [1, 0]);
        assert_eq!(payout_for(&c, Outcome::Zero, 0).unwrap(), 0);
    }

    #[test]
    fn empty_side_rejected() {
        let c = resolved(100, [0, 100], [1, 0]);
        let err = payout_for(&c, Outcome::Zero, 5).unwrap_err();
        assert!(matches!(err, CondexError::EmptySide { outcome: 0, .. }));
    }

    #[test]
    fn unresolved_rejected() {
        let mut c = resolved(100, [100, 100], [1, 0]);
        c.payout_denominator = 0;
        assert!(matches!(
            payout_for(&c, Outcome::Zero, 1),
            Err(CondexError::Unresolved(_))
        ));
    }

    #[test]
    fn large_values_use_wide_intermediates() {
        let big = u128::MAX / 2;
        let c = resolved(big, [big, big], [1, 1]);
        assert_eq!(payout_for(&c, Outcome::Zero, big).unwrap(), big / 2);
    }

    #[test]
    fn intermediate_overflow_is_reported() {
        let c = resolved(u128::MAX, [u128::MAX, 1], [u128::MAX, 0]);
        assert!(matches!(
            payout_for(&c, Outcome::Zero, u128::MAX),
            Err(CondexError::ArithmeticOverflow(_))
        ));
    }

    #[test]
    fn engine_rejects_unbacked_claims_with_empty_side() {
        let engine = ConditionalTokens::new(EngineConfig::default()).unwrap();
        let usdc = InMemoryCollateral::new(Address::repeat_byte(0xC0));
        let arbiter = Address::repeat_byte(9);
        let holder = Address::repeat_byte(1);
        let question = QuestionId::random();
        let id = engine
            .prepare_condition(holder, arbiter, question, 2)
            .unwrap();
        engine.report_payouts(arbiter, question, [1, 0]).unwrap();

        // Claims that no split ever backed.
        let position = engine
            .state()
            .unwrap()
            .claims
            .mint(holder, usdc.address(), id, Outcome::Zero, 10)
            .unwrap();

        let err = engine
            .redeem_positions(holder, &usdc, id, OutcomeSelector::Full)
            .unwrap_err();
        assert!(matches!(err, CondexError::EmptySide { .. }));
        assert_eq!(engine.balance_of(holder, position).unwrap(), 10);
        assert!(!engine.guard.is_entered());
    }

    #[test]
    fn custody_cannot_redeem() {
        let engine = ConditionalTokens::new(EngineConfig::default()).unwrap();
        let usdc = InMemoryCollateral::new(Address::repeat_byte(0xC0));
        let arbiter = Address::repeat_byte(9);
        let question = QuestionId::random();
        let id = engine
            .prepare_condition(arbiter, arbiter, question, 2)
            .unwrap();
        engine.report_payouts(arbiter, question, [1, 0]).unwrap();

        let custody = engine.custody_address();
        let err = engine
            .redeem_positions(custody, &usdc, id, OutcomeSelector::Full)
            .unwrap_err();
        assert!(matches!(err, CondexError::CustodyCaller(a) if a == custody));
    }

    /// Asset whose payout push takes the engine's state lock down with it.
    struct CrashingAsset {
        engine: Arc<ConditionalTokens>,
        inner: InMemoryCollateral,
    }

    impl CollateralAsset for CrashingAsset {
        fn address(&self) -> Address {
            self.inner.address()
        }

        fn balance_of(&self, owner: Address) -> u128 {
            self.inner.balance_of(owner)
        }

        fn transfer_from(
            &self,
            spender: Address,
            from: Address,
            to: Address,
            amount: u128,
        ) -> std::result::Result<(), CollateralError> {
            self.inner.transfer_from(spender, from, to, amount)
        }

        fn transfer(
            &self,
            _from: Address,
            _to: Address,
            _amount: u128,
        ) -> std::result::Result<(), CollateralError> {
            let engine = &self.engine;
            let crashed = std::thread::scope(|s| {
                s.spawn(|| {
                    let _state = engine.state().unwrap();
                    panic!("custody backend crashed");
                })
                .join()
            });
            assert!(crashed.is_err());
            Err(CollateralError::Rejected("custody backend offline".into()))
        }
    }

    #[test]
    fn failed_restore_reports_both_failures() {
        let engine = Arc::new(ConditionalTokens::new(EngineConfig::default()).unwrap());
        let asset = CrashingAsset {
            engine: Arc::clone(&engine),
            inner: InMemoryCollateral::new(Address::repeat_byte(0xC0)),
        };
        let holder = Address::repeat_byte(1);
        let arbiter = Address::repeat_byte(9);
        let question = QuestionId::random();
        asset.inner.mint(holder, 10);
        asset.inner.approve(holder, engine.custody_address(), 10);

        let id = engine
            .prepare_condition(holder, arbiter, question, 2)
            .unwrap();
        engine
            .split_position(holder, &asset, id, OutcomeSelector::Full, 10)
            .unwrap();
        engine.report_payouts(arbiter, question, [1, 0]).unwrap();

        let err = engine
            .redeem_positions(holder, &asset, id, OutcomeSelector::Full)
            .unwrap_err();
        match &err {
            CondexError::Internal(msg) => {
                assert!(msg.contains("custody backend offline"), "Got: {msg}");
                assert!(msg.contains("poisoned"), "Got: {msg}");
            }
            other => panic!("expected Internal, got {other:?}"),
        }
        assert!(!engine.guard.is_entered());
    }
}
