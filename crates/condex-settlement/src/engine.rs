//! The settlement engine facade.
//!
//! [`ConditionalTokens`] owns every piece of settlement state (condition
//! registry, claim ledger, custody accounts, event log) behind one lock and
//! exposes the mutating entry points:
//!
//! | entry point | module |
//! |---|---|
//! | `prepare_condition`, `report_payouts`, `transfer_claims` | here |
//! | `split_position` | [`crate::split`] |
//! | `redeem_positions` | [`crate::redeem`] |
//!
//! Every mutating entry point acquires the [`ReentrancyGuard`] first. Methods
//! take `&self`, so one instance can be shared behind an `Arc` by many
//! callers; the state lock is never held across an external asset call.

use std::sync::{Mutex, MutexGuard};

use condex_ledger::{ClaimLedger, ConditionRegistry};
use condex_types::{
    Address, Condition, ConditionId, CondexError, EngineConfig, LedgerEvent, LedgerEventKind,
    Outcome, PositionId, QuestionId, Result,
};

use crate::collateral::CollateralAsset;
use crate::custody::{CustodyLedger, CustodyReport};
use crate::event_log::EventLog;
use crate::guard::ReentrancyGuard;

/// Everything the engine mutates. Only reachable through [`ConditionalTokens::state`].
pub(crate) struct EngineState {
    pub(crate) registry: ConditionRegistry,
    pub(crate) claims: ClaimLedger,
    pub(crate) custody: CustodyLedger,
    pub(crate) events: EventLog,
}

/// Binary conditional claims: prepare, split, resolve, redeem.
pub struct ConditionalTokens {
    config: EngineConfig,
    pub(crate) guard: ReentrancyGuard,
    state: Mutex<EngineState>,
}

impl ConditionalTokens {
    /// Create an engine with a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            custody = %config.custody_address,
            event_log_capacity = config.event_log_capacity,
            max_outcome_slots = config.max_outcome_slots,
            engine = condex_types::constants::ENGINE_NAME,
            version = condex_types::constants::VERSION,
            "Settlement engine initialized"
        );
        Ok(Self {
            state: Mutex::new(EngineState {
                registry: ConditionRegistry::with_outcome_slots(config.max_outcome_slots),
                claims: ClaimLedger::new(),
                custody: CustodyLedger::new(),
                events: EventLog::new(config.event_log_capacity),
            }),
            guard: ReentrancyGuard::new(),
            config,
        })
    }

    /// The validated configuration this engine was built with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The identity that holds pooled collateral.
    #[must_use]
    pub fn custody_address(&self) -> Address {
        self.config.custody_address
    }

    pub(crate) fn state(&self) -> Result<MutexGuard<'_, EngineState>> {
        self.state
            .lock()
            .map_err(|_| CondexError::Internal("engine state lock poisoned".into()))
    }

    // ---------------------------------------------------------------------
    // Condition lifecycle
    // ---------------------------------------------------------------------

    /// Prepare a binary condition bound to `arbiter`. Anyone may prepare.
    pub fn prepare_condition(
        &self,
        caller: Address,
        arbiter: Address,
        question_id: QuestionId,
        outcome_slot_count: u32,
    ) -> Result<ConditionId> {
        let _entered = self.enter("prepare_condition")?;
        let mut state = self.state()?;

        let condition_id = state
            .registry
            .prepare(arbiter, question_id, outcome_slot_count)?;
        state.events.push(LedgerEventKind::ConditionPrepared {
            condition_id,
            arbiter,
            question_id,
            outcome_slot_count,
        });

        tracing::info!(
            condition = %condition_id.short(),
            arbiter = %arbiter,
            prepared_by = %caller,
            "Condition prepared"
        );
        Ok(condition_id)
    }

    /// Record the arbiter's payout vector for the condition bound to `question_id`.
    pub fn report_payouts(
        &self,
        caller: Address,
        question_id: QuestionId,
        payouts: [u128; 2],
    ) -> Result<ConditionId> {
        let _entered = self.enter("report_payouts")?;
        let mut state = self.state()?;

        let condition = state.registry.resolve(caller, question_id, payouts)?;
        let condition_id = condition.id;
        let denominator = condition.payout_denominator;
        state.events.push(LedgerEventKind::ConditionResolved {
            condition_id,
            arbiter: caller,
            question_id,
            payout_numerators: payouts,
        });

        tracing::info!(
            condition = %condition_id.short(),
            numerators = ?payouts,
            denominator,
            "Condition resolved"
        );
        Ok(condition_id)
    }

    /// Move claims between holders. This is the primitive an order-matching
    /// layer settles fills with; it never touches pool or outstanding totals.
    ///
    /// The custody address can neither send nor receive claims.
    pub fn transfer_claims(
        &self,
        caller: Address,
        to: Address,
        position_id: PositionId,
        amount: u128,
    ) -> Result<()> {
        let _entered = self.enter("transfer_claims")?;
        let custody = self.custody_address();
        if caller == custody || to == custody {
            return Err(CondexError::CustodyCaller(custody));
        }
        let mut state = self.state()?;

        state.claims.transfer(caller, to, position_id, amount)?;
        state.events.push(LedgerEventKind::ClaimsTransferred {
            from: caller,
            to,
            position_id,
            amount,
        });
        tracing::debug!(
            position = %position_id.short(),
            from = %caller,
            to = %to,
            amount,
            "Claims transferred"
        );
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Snapshot of a condition record, `None` if never prepared.
    pub fn condition(&self, condition_id: ConditionId) -> Result<Option<Condition>> {
        Ok(self.state()?.registry.get(&condition_id).cloned())
    }

    /// The condition a question was prepared under, if any.
    pub fn condition_id_for_question(&self, question_id: QuestionId) -> Result<Option<ConditionId>> {
        Ok(self
            .state()?
            .registry
            .get_by_question(&question_id)
            .map(|c| c.id))
    }

    /// All zeros while the condition is unresolved.
    pub fn payout_numerators(&self, condition_id: ConditionId) -> Result<[u128; 2]> {
        Ok(self.state()?.registry.require(condition_id)?.payout_numerators)
    }

    /// `0` while the condition is unresolved.
    pub fn payout_denominator(&self, condition_id: ConditionId) -> Result<u128> {
        Ok(self.state()?.registry.require(condition_id)?.payout_denominator)
    }

    /// Claims `holder` owns on one position.
    pub fn balance_of(&self, holder: Address, position_id: PositionId) -> Result<u128> {
        Ok(self.state()?.claims.balance_of(holder, position_id))
    }

    /// Balances for each `(holder, position)` pair, in query order.
    pub fn balance_of_batch(&self, queries: &[(Address, PositionId)]) -> Result<Vec<u128>> {
        Ok(self.state()?.claims.balance_of_batch(queries))
    }

    /// Like [`Self::balance_of`], deriving the position id from its parts.
    pub fn claim_balance(
        &self,
        holder: Address,
        collateral: Address,
        condition_id: ConditionId,
        outcome: Outcome,
    ) -> Result<u128> {
        Ok(self
            .state()?
            .claims
            .claim_balance(holder, collateral, condition_id, outcome))
    }

    /// Claims currently outstanding on a position (minted minus burned).
    pub fn position_supply(&self, position_id: PositionId) -> Result<u128> {
        Ok(self.state()?.claims.total_supply(position_id))
    }

    /// Deposited and paid-out totals for a condition, once it has seen a split.
    pub fn custody_report(&self, condition_id: ConditionId) -> Result<Option<CustodyReport>> {
        Ok(self.state()?.custody.report(&condition_id))
    }

    /// Check that the engine's custody balance of `collateral` covers
    /// everything the ledger still owes in that asset.
    pub fn verify_custody(&self, collateral: &dyn CollateralAsset) -> Result<()> {
        let actual = collateral.balance_of(self.config.custody_address);
        self.state()?.custody.verify(collateral.address(), actual)
    }

    /// Retained ledger events with `sequence >= from`, oldest first.
    pub fn events_since(&self, from: u64) -> Result<Vec<LedgerEvent>> {
        Ok(self.state()?.events.since(from))
    }

    /// Every retained ledger event, oldest first.
    pub fn events(&self) -> Result<Vec<LedgerEvent>> {
        self.events_since(0)
    }

    pub(crate) fn enter(&self, entry_point: &'static str) -> Result<crate::guard::GuardToken<'_>> {
        self.guard.enter().inspect_err(|_| {
            tracing::warn!(entry_point, "Reentrant call rejected");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use condex_types::ConditionState;

    fn engine() -> ConditionalTokens {
        ConditionalTokens::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = EngineConfig {
            event_log_capacity: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            ConditionalTokens::new(cfg),
            Err(CondexError::Configuration(_))
        ));
    }

    #[test]
    fn prepare_and_query() {
        let engine = engine();
        let arbiter = Address::random();
        let question = QuestionId::random();
        let id = engine
            .prepare_condition(Address::random(), arbiter, question, 2)
            .unwrap();
        assert_eq!(id, ConditionId::derive(arbiter, question, 2));

        let cond = engine.condition(id).unwrap().unwrap();
        assert_eq!(cond.state(), ConditionState::Prepared);
        assert_eq!(engine.condition_id_for_question(question).unwrap(), Some(id));
        assert_eq!(engine.payout_denominator(id).unwrap(), 0);
        assert!(engine.condition(ConditionId::from_bytes([0; 32])).unwrap().is_none());
    }

    #[test]
    fn resolve_records_event_and_payouts() {
        let engine = engine();
        let arbiter = Address::random();
        let question = QuestionId::random();
        let id = engine
            .prepare_condition(arbiter, arbiter, question, 2)
            .unwrap();
        assert_eq!(
            engine.report_payouts(arbiter, question, [1, 3]).unwrap(),
            id
        );
        assert_eq!(engine.payout_numerators(id).unwrap(), [1, 3]);
        assert_eq!(engine.payout_denominator(id).unwrap(), 4);

        let events = engine.events().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind.name(), "CONDITION_PREPARED");
        assert_eq!(events[1].kind.name(), "CONDITION_RESOLVED");
    }

    #[test]
    fn failed_calls_leave_no_event() {
        let engine = engine();
        let arbiter = Address::random();
        let question = QuestionId::random();
        engine
            .prepare_condition(arbiter, arbiter, question, 2)
            .unwrap();
        assert!(engine.prepare_condition(arbiter, arbiter, question, 2).is_err());
        assert!(engine.report_payouts(Address::random(), question, [1, 0]).is_err());
        assert!(engine.report_payouts(arbiter, question, [0, 0]).is_err());
        assert_eq!(engine.events().unwrap().len(), 1);
    }

    #[test]
    fn entry_points_reject_while_guard_held() {
        let engine = engine();
        let _held = engine.guard.enter().unwrap();
        let err = engine
            .prepare_condition(Address::random(), Address::random(), QuestionId::random(), 2)
            .unwrap_err();
        assert!(matches!(err, CondexError::ReentrantCall));
        let err = engine
            .report_payouts(Address::random(), QuestionId::random(), [1, 0])
            .unwrap_err();
        assert!(matches!(err, CondexError::ReentrantCall));
        let err = engine
            .transfer_claims(
                Address::random(),
                Address::random(),
                PositionId::from_bytes([0; 32]),
                1,
            )
            .unwrap_err();
        assert!(matches!(err, CondexError::ReentrantCall));
    }

    #[test]
    fn outcome_slots_follow_config() {
        let cfg = EngineConfig {
            max_outcome_slots: 2,
            ..EngineConfig::default()
        };
        let engine = ConditionalTokens::new(cfg).unwrap();
        let err = engine
            .prepare_condition(Address::random(), Address::random(), QuestionId::random(), 3)
            .unwrap_err();
        assert!(matches!(err, CondexError::UnsupportedOutcomeCount(3)));
        assert_eq!(engine.config().max_outcome_slots, 2);
    }

    #[test]
    fn custody_cannot_send_or_receive_claims() {
        let engine = engine();
        let custody = engine.custody_address();
        let position = PositionId::from_bytes([7; 32]);

        let err = engine
            .transfer_claims(custody, Address::random(), position, 1)
            .unwrap_err();
        assert!(matches!(err, CondexError::CustodyCaller(_)));
        let err = engine
            .transfer_claims(Address::random(), custody, position, 1)
            .unwrap_err();
        assert!(matches!(err, CondexError::CustodyCaller(_)));
        assert!(engine.events().unwrap().is_empty());
    }

    #[test]
    fn guard_released_after_failure() {
        let engine = engine();
        assert!(engine
            .prepare_condition(Address::random(), Address::random(), QuestionId::random(), 3)
            .is_err());
        assert!(!engine.guard.is_entered());
    }
}
