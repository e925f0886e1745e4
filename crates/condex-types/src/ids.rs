//! Identifiers used throughout Condex.
//!
//! Identity is content-addressed: a [`ConditionId`] is the SHA-256 of the
//! tuple that defines the condition, and a [`PositionId`] is the SHA-256 of
//! the collateral asset and outcome collection it represents. The same inputs
//! always produce the same identifier on every node, so no registry of
//! allocated handles is needed.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account identity: holder, arbiter, collateral asset or custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address(#[serde(with = "hex::serde")] pub [u8; 20]);

impl Address {
    /// The null identity. Never a valid arbiter.
    pub const ZERO: Self = Self([0u8; 20]);

    #[must_use]
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; 20])
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// First four bytes as hex, for compact log fields.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random::<[u8; 20]>())
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// 32-byte hash identifiers
// ---------------------------------------------------------------------------

macro_rules! hash_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        pub struct $name(#[serde(with = "hex::serde")] pub [u8; 32]);

        impl $name {
            #[must_use]
            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            #[must_use]
            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            /// First four bytes as hex, for compact log fields.
            #[must_use]
            pub fn short(&self) -> String {
                hex::encode(&self.0[..4])
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $prefix, hex::encode(self.0))
            }
        }
    };
}

hash_id!(
    /// Caller-chosen identifier of the question an arbiter will answer.
    QuestionId,
    "q"
);

hash_id!(
    /// Deterministic identifier of a condition:
    /// `SHA-256(domain || arbiter || question_id || outcome_slot_count)`.
    ConditionId,
    "cond"
);

hash_id!(
    /// Identifier of an outcome collection (a set of outcomes of one condition,
    /// optionally nested under a parent collection).
    CollectionId,
    "coll"
);

hash_id!(
    /// Identifier of a transferable claim: a collection backed by one collateral asset.
    PositionId,
    "pos"
);

impl QuestionId {
    #[cfg(any(test, feature = "test-helpers"))]
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random::<[u8; 32]>())
    }
}

impl ConditionId {
    /// Derive the condition identifier from its defining tuple.
    ///
    /// Two preparations of the same `(arbiter, question_id, outcome_slot_count)`
    /// collide; the registry uses this as its idempotency key.
    #[must_use]
    pub fn derive(arbiter: Address, question_id: QuestionId, outcome_slot_count: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(constants::CONDITION_ID_DOMAIN);
        hasher.update(arbiter.0);
        hasher.update(question_id.0);
        hasher.update(outcome_slot_count.to_be_bytes());
        Self(hasher.finalize().into())
    }
}

impl CollectionId {
    /// The empty parent collection. Nested collections are not supported,
    /// so every collection in this engine hangs off `NULL`.
    pub const NULL: Self = Self([0u8; 32]);

    #[must_use]
    pub fn derive(parent: CollectionId, condition_id: ConditionId, index_set: u8) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(constants::COLLECTION_ID_DOMAIN);
        hasher.update(parent.0);
        hasher.update(condition_id.0);
        hasher.update([index_set]);
        Self(hasher.finalize().into())
    }
}

impl PositionId {
    #[must_use]
    pub fn derive(collateral: Address, collection_id: CollectionId) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(constants::POSITION_ID_DOMAIN);
        hasher.update(collateral.0);
        hasher.update(collection_id.0);
        Self(hasher.finalize().into())
    }

    /// Position of a single outcome of `condition_id`, backed by `collateral`.
    #[must_use]
    pub fn for_outcome(
        collateral: Address,
        condition_id: ConditionId,
        outcome: crate::Outcome,
    ) -> Self {
        let collection = CollectionId::derive(CollectionId::NULL, condition_id, outcome.index_set());
        Self::derive(collateral, collection)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Outcome;

    #[test]
    fn condition_id_deterministic() {
        let arbiter = Address::repeat_byte(7);
        let question = QuestionId::from_bytes([1; 32]);
        let a = ConditionId::derive(arbiter, question, 2);
        let b = ConditionId::derive(arbiter, question, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn condition_id_depends_on_every_field() {
        let arbiter = Address::repeat_byte(7);
        let question = QuestionId::from_bytes([1; 32]);
        let base = ConditionId::derive(arbiter, question, 2);
        assert_ne!(base, ConditionId::derive(Address::repeat_byte(8), question, 2));
        assert_ne!(
            base,
            ConditionId::derive(arbiter, QuestionId::from_bytes([2; 32]), 2)
        );
        assert_ne!(base, ConditionId::derive(arbiter, question, 3));
    }

    #[test]
    fn position_ids_differ_per_outcome_and_collateral() {
        let condition = ConditionId::derive(Address::repeat_byte(1), QuestionId::random(), 2);
        let usdc = Address::repeat_byte(0xAA);
        let dai = Address::repeat_byte(0xBB);

        let yes = PositionId::for_outcome(usdc, condition, Outcome::Zero);
        let no = PositionId::for_outcome(usdc, condition, Outcome::One);
        assert_ne!(yes, no);
        assert_ne!(yes, PositionId::for_outcome(dai, condition, Outcome::Zero));
        assert_eq!(yes, PositionId::for_outcome(usdc, condition, Outcome::Zero));
    }

    #[test]
    fn address_display_is_prefixed_hex() {
        let addr = Address::repeat_byte(0xAB);
        let shown = format!("{addr}");
        assert!(shown.starts_with("0xabab"));
        assert_eq!(shown.len(), 2 + 40);
        assert_eq!(addr.short(), "abababab");
    }

    #[test]
    fn random_addresses_differ() {
        assert_ne!(Address::random(), Address::random());
        assert!(!Address::random().is_zero());
    }

    #[test]
    fn serde_uses_hex_strings() {
        let addr = Address::repeat_byte(0x01);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);

        let cid = ConditionId::derive(addr, QuestionId::from_bytes([9; 32]), 2);
        let json = serde_json::to_string(&cid).unwrap();
        let back: ConditionId = serde_json::from_str(&json).unwrap();
        assert_eq!(cid, back);
    }
}
