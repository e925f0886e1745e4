//! Condition registry: lifecycle and aggregate accounting per condition.
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────────┐ prepare  ┌──────────┐ resolve  ┌──────────┐
//!   │ NonExistent ├─────────▶│ PREPARED ├─────────▶│ RESOLVED │
//!   └─────────────┘          └──────────┘          └──────────┘
//! ```
//!
//! Both transitions happen at most once per condition. Every check runs
//! before any field is written, so a failed call leaves the registry as it was.

use std::collections::HashMap;

use chrono::Utc;
use condex_types::{
    Address, Condition, ConditionId, CondexError, OutcomeSelector, QuestionId, Result, constants,
};

/// Maps condition ids to their records and questions to their condition.
pub struct ConditionRegistry {
    conditions: HashMap<ConditionId, Condition>,
    /// One question is bound to at most one condition.
    by_question: HashMap<QuestionId, ConditionId>,
    outcome_slots: u32,
}

impl ConditionRegistry {
    /// An empty registry accepting binary conditions.
    #[must_use]
    pub fn new() -> Self {
        Self::with_outcome_slots(constants::BINARY_OUTCOME_SLOTS)
    }

    /// An empty registry accepting conditions with exactly `outcome_slots` slots.
    #[must_use]
    pub fn with_outcome_slots(outcome_slots: u32) -> Self {
        Self {
            conditions: HashMap::new(),
            by_question: HashMap::new(),
            outcome_slots,
        }
    }

    /// Register a new binary condition in the PREPARED state.
    ///
    /// # Errors
    /// - `UnsupportedOutcomeCount` if `outcome_slot_count` is not the configured count
    /// - `ZeroArbiter` if `arbiter` is the null address
    /// - `AlreadyPrepared` if the derived id exists, or the question is
    ///   already bound to another condition
    pub fn prepare(
        &mut self,
        arbiter: Address,
        question_id: QuestionId,
        outcome_slot_count: u32,
    ) -> Result<ConditionId> {
        if outcome_slot_count != self.outcome_slots {
            return Err(CondexError::UnsupportedOutcomeCount(outcome_slot_count));
        }
        if arbiter.is_zero() {
            return Err(CondexError::ZeroArbiter);
        }

        let id = ConditionId::derive(arbiter, question_id, outcome_slot_count);
        if self.conditions.contains_key(&id) {
            return Err(CondexError::AlreadyPrepared(id));
        }
        if let Some(existing) = self.by_question.get(&question_id) {
            return Err(CondexError::AlreadyPrepared(*existing));
        }

        self.conditions.insert(
            id,
            Condition::prepared(id, arbiter, question_id, outcome_slot_count),
        );
        self.by_question.insert(question_id, id);
        tracing::debug!(condition = %id.short(), arbiter = %arbiter, "Condition prepared");
        Ok(id)
    }

    /// Record the arbiter's payout vector. Terminal, one-way transition.
    ///
    /// # Errors
    /// - `NotPrepared` if no condition is bound to `question_id`
    /// - `AlreadyResolved` if a payout vector is already recorded, whoever calls
    /// - `Unauthorized` if `caller` is not the bound arbiter
    /// - `ZeroPayout` if the numerators sum to zero
    /// - `ArithmeticOverflow` if the numerators' sum exceeds `u128`
    pub fn resolve(
        &mut self,
        caller: Address,
        question_id: QuestionId,
        payouts: [u128; 2],
    ) -> Result<&Condition> {
        let id = *self
            .by_question
            .get(&question_id)
            .ok_or_else(|| CondexError::NotPrepared(question_id.to_string()))?;
        let condition = self
            .conditions
            .get_mut(&id)
            .ok_or_else(|| CondexError::Internal(format!("question index points at missing {id}")))?;

        // Resolution is terminal for every caller, so this precedes the arbiter check.
        if condition.is_resolved() {
            return Err(CondexError::AlreadyResolved(id));
        }
        if caller != condition.arbiter {
            return Err(CondexError::Unauthorized {
                caller,
                arbiter: condition.arbiter,
            });
        }
        let denominator = payouts[0]
            .checked_add(payouts[1])
            .ok_or(CondexError::ArithmeticOverflow("payout denominator"))?;
        if denominator == 0 {
            return Err(CondexError::ZeroPayout);
        }

        condition.payout_numerators = payouts;
        condition.payout_denominator = denominator;
        condition.resolved_at = Some(Utc::now());
        tracing::debug!(
            condition = %id.short(),
            numerators = ?payouts,
            denominator,
            "Condition resolved"
        );
        Ok(condition)
    }

    /// Bind the condition to a collateral asset, or check an existing binding.
    ///
    /// # Errors
    /// - `NotPrepared` if the condition is unknown
    /// - `CollateralMismatch` if a different asset is already bound
    pub fn bind_collateral(&mut self, id: ConditionId, collateral: Address) -> Result<()> {
        let condition = self.require_mut(id)?;
        match condition.collateral {
            Some(bound) if bound != collateral => Err(CondexError::CollateralMismatch {
                expected: bound,
                actual: collateral,
            }),
            Some(_) => Ok(()),
            None => {
                condition.collateral = Some(collateral);
                Ok(())
            }
        }
    }

    /// Compute the pool and outstanding totals a split would produce, without
    /// writing anything. The split engine calls this before pulling collateral
    /// so an overflow can never strand a deposit.
    ///
    /// # Errors
    /// - `NotPrepared` if the condition is unknown
    /// - `ArithmeticOverflow` if any counter would exceed `u128`
    pub fn preview_split(
        &self,
        id: ConditionId,
        selector: OutcomeSelector,
        amount: u128,
    ) -> Result<(u128, [u128; 2])> {
        let condition = self.require(id)?;

        let pool = condition
            .collateral_pool
            .checked_add(amount)
            .ok_or(CondexError::ArithmeticOverflow("collateral pool"))?;
        let mut totals = condition.total_outstanding_claims;
        for outcome in selector.outcomes() {
            totals[outcome.index()] = totals[outcome.index()]
                .checked_add(amount)
                .ok_or(CondexError::ArithmeticOverflow("outstanding claims"))?;
        }
        Ok((pool, totals))
    }

    /// Add a successful deposit to the pool and to the outstanding totals of
    /// every selected outcome. Only the split engine calls this, and only
    /// after the collateral pull has succeeded.
    ///
    /// # Errors
    /// Same as [`Self::preview_split`]; nothing is written on error.
    pub fn credit_split(
        &mut self,
        id: ConditionId,
        selector: OutcomeSelector,
        amount: u128,
    ) -> Result<()> {
        let (pool, totals) = self.preview_split(id, selector, amount)?;
        let condition = self.require_mut(id)?;
        condition.collateral_pool = pool;
        condition.total_outstanding_claims = totals;
        Ok(())
    }

    /// Look up a condition by id.
    #[must_use]
    pub fn get(&self, id: &ConditionId) -> Option<&Condition> {
        self.conditions.get(id)
    }

    /// Look up a condition, failing with `NotPrepared` if it does not exist.
    pub fn require(&self, id: ConditionId) -> Result<&Condition> {
        self.conditions
            .get(&id)
            .ok_or_else(|| CondexError::NotPrepared(id.to_string()))
    }

    /// Look up the condition bound to a question.
    #[must_use]
    pub fn get_by_question(&self, question_id: &QuestionId) -> Option<&Condition> {
        self.by_question
            .get(question_id)
            .and_then(|id| self.conditions.get(id))
    }

    /// Number of prepared conditions, resolved or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    fn require_mut(&mut self, id: ConditionId) -> Result<&mut Condition> {
        self.conditions
            .get_mut(&id)
            .ok_or_else(|| CondexError::NotPrepared(id.to_string()))
    }
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
