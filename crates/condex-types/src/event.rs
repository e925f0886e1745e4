//! Ledger events for the Condex audit trail.
//!
//! Every successful state transition (preparation, resolution, split,
//! redemption, claim transfer) appends one [`LedgerEvent`]. Sequence numbers
//! are strictly increasing for the life of an engine instance.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, ConditionId, OutcomeSelector, PositionId, QuestionId};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEventKind {
    ConditionPrepared {
        condition_id: ConditionId,
        arbiter: Address,
        question_id: QuestionId,
        outcome_slot_count: u32,
    },
    ConditionResolved {
        condition_id: ConditionId,
        arbiter: Address,
        question_id: QuestionId,
        payout_numerators: [u128; 2],
    },
    PositionSplit {
        holder: Address,
        collateral: Address,
        condition_id: ConditionId,
        selector: OutcomeSelector,
        amount: u128,
    },
    PayoutRedeemed {
        holder: Address,
        collateral: Address,
        condition_id: ConditionId,
        mask: OutcomeSelector,
        burned: [u128; 2],
        payout: u128,
    },
    ClaimsTransferred {
        from: Address,
        to: Address,
        position_id: PositionId,
        amount: u128,
    },
}

impl LedgerEventKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConditionPrepared { .. } => "CONDITION_PREPARED",
            Self::ConditionResolved { .. } => "CONDITION_RESOLVED",
            Self::PositionSplit { .. } => "POSITION_SPLIT",
            Self::PayoutRedeemed { .. } => "PAYOUT_REDEEMED",
            Self::ClaimsTransferred { .. } => "CLAIMS_TRANSFERRED",
        }
    }
}

impl fmt::Display for LedgerEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of the append-only audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub sequence: u64,
    pub recorded_at: DateTime<Utc>,
    pub kind: LedgerEventKind,
}
