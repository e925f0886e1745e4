//! The condition record and its lifecycle.
//!
//! ## State Machine
//!
//! ```text
//!   (absent) ──prepare──▶ PREPARED ──resolve──▶ RESOLVED
//! ```
//!
//! `NonExistent` is represented by absence from the registry. Resolution is
//! terminal: once `payout_denominator != 0` it is never re-set.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, ConditionId, Outcome, QuestionId};

/// Lifecycle state of a condition that exists in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionState {
    /// Awaiting the arbiter's report. Splits are accepted.
    Prepared,
    /// Payout vector recorded. Redemptions are accepted. Terminal.
    Resolved,
}

impl fmt::Display for ConditionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prepared => write!(f, "PREPARED"),
            Self::Resolved => write!(f, "RESOLVED"),
        }
    }
}

/// A binary question bound to an arbiter, plus its aggregate collateral
/// accounting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: ConditionId,
    /// The only identity allowed to resolve this condition.
    pub arbiter: Address,
    pub question_id: QuestionId,
    pub outcome_slot_count: u32,
    /// Resolution weights, set once.
    pub payout_numerators: [u128; 2],
    /// `0` while unresolved, otherwise the sum of the numerators.
    pub payout_denominator: u128,
    /// Cumulative collateral ever deposited. Never decremented by redemption.
    pub collateral_pool: u128,
    /// Cumulative claims ever minted per outcome. Never decremented by redemption.
    pub total_outstanding_claims: [u128; 2],
    /// Collateral asset bound by the first split, if any.
    pub collateral: Option<Address>,
    pub prepared_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Condition {
    /// A freshly prepared condition with all payout and pool fields at zero.
    #[must_use]
    pub fn prepared(
        id: ConditionId,
        arbiter: Address,
        question_id: QuestionId,
        outcome_slot_count: u32,
    ) -> Self {
        Self {
            id,
            arbiter,
            question_id,
            outcome_slot_count,
            payout_numerators: [0; 2],
            payout_denominator: 0,
            collateral_pool: 0,
            total_outstanding_claims: [0; 2],
            collateral: None,
            prepared_at: Utc::now(),
            resolved_at: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> ConditionState {
        if self.is_resolved() {
            ConditionState::Resolved
        } else {
            ConditionState::Prepared
        }
    }

    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.payout_denominator != 0
    }

    #[must_use]
    pub fn payout_numerator(&self, outcome: Outcome) -> u128 {
        self.payout_numerators[outcome.index()]
    }

    #[must_use]
    pub fn outstanding(&self, outcome: Outcome) -> u128 {
        self.total_outstanding_claims[outcome.index()]
    }
}
