//! Outcome slots and outcome selectors.
//!
//! A binary condition has exactly two outcome slots. Positions are addressed
//! by an index-set bitmask: bit `i` set means "outcome `i` is in the set".

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{CondexError, Result};

/// One of the two outcome slots of a binary condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Outcome {
    /// Slot 0 ("YES").
    Zero,
    /// Slot 1 ("NO").
    One,
}

impl Outcome {
    pub const ALL: [Self; 2] = [Self::Zero, Self::One];

    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }

    /// Singleton index set for this outcome (`1 << index`).
    #[must_use]
    pub fn index_set(self) -> u8 {
        1 << self.index()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero => write!(f, "OUTCOME_0"),
            Self::One => write!(f, "OUTCOME_1"),
        }
    }
}

/// Which outcomes a split mints, or which outcomes a redemption burns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeSelector {
    /// Both outcomes. One unit of collateral backs one claim on each side.
    Full,
    /// A one-sided stake on outcome 0.
    Outcome0Only,
    /// A one-sided stake on outcome 1.
    Outcome1Only,
}

impl OutcomeSelector {
    /// Parse a raw index-set bitmask (`0b01`, `0b10` or `0b11`).
    ///
    /// # Errors
    /// Returns [`CondexError::InvalidOutcomeSelector`] for an empty mask or
    /// one naming a slot beyond the second.
    pub fn from_index_set(mask: u8) -> Result<Self> {
        match mask {
            0b01 => Ok(Self::Outcome0Only),
            0b10 => Ok(Self::Outcome1Only),
            0b11 => Ok(Self::Full),
            other => Err(CondexError::InvalidOutcomeSelector(other)),
        }
    }

    #[must_use]
    pub fn index_set(self) -> u8 {
        match self {
            Self::Full => 0b11,
            Self::Outcome0Only => 0b01,
            Self::Outcome1Only => 0b10,
        }
    }

    #[must_use]
    pub fn includes(self, outcome: Outcome) -> bool {
        self.index_set() & outcome.index_set() != 0
    }

    /// Selected outcomes in index order.
    pub fn outcomes(self) -> impl Iterator<Item = Outcome> {
        Outcome::ALL.into_iter().filter(move |o| self.includes(*o))
    }
}

impl From<Outcome> for OutcomeSelector {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Zero => Self::Outcome0Only,
            Outcome::One => Self::Outcome1Only,
        }
    }
}

impl fmt::Display for OutcomeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "FULL"),
            Self::Outcome0Only => write!(f, "OUTCOME_0_ONLY"),
            Self::Outcome1Only => write!(f, "OUTCOME_1_ONLY"),
        }
    }
}
