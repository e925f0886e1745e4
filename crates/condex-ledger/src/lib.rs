//! # condex-ledger
//!
//! **Ledger plane**: the two keyed maps that hold all settlement state.
//!
//! 1. **ConditionRegistry**: condition-by-id, with lifecycle
//!    `PREPARED → RESOLVED` and the aggregate pool / outstanding-claim counters
//! 2. **ClaimLedger**: balance-by-(holder, position), with mint, burn and
//!    holder-to-holder transfer
//!
//! Nothing in this crate performs external calls. The settlement crate owns
//! both maps behind one lock and is the only mutator.

pub mod claims;
pub mod registry;

pub use claims::{ClaimLedger, PositionInfo};
pub use registry::ConditionRegistry;
