//! # condex-settlement
//!
//! **Settlement plane**: collateral custody, claim minting and proportional
//! redemption for binary conditions.
//!
//! ## Architecture
//!
//! [`ConditionalTokens`] wraps the pure ledgers from `condex-ledger` and is
//! the only component that talks to a [`CollateralAsset`]:
//!
//! 1. `prepare_condition` registers a question with its arbiter
//! 2. `split_position` pulls collateral into custody and mints claims
//! 3. `report_payouts` records the arbiter's payout vector (terminal)
//! 4. `redeem_positions` burns claims and pushes the holder's share
//!
//! Every mutating entry point holds the [`ReentrancyGuard`] for its whole
//! duration. A failed external transfer leaves the ledger unchanged: splits
//! write nothing until the pull succeeds, and redemptions mint burned claims
//! back if the payout push fails.
//!
//! [`CustodyLedger`] tracks deposits against payouts per condition so
//! `verify_custody` can check the asset balance actually held.

pub mod collateral;
pub mod custody;
pub mod engine;
pub mod event_log;
pub mod guard;
pub mod redeem;
pub mod split;

pub use collateral::{
    CollateralAsset, CollateralError, InMemoryCollateral, TransferHook, TransferNotice,
};
pub use custody::{CustodyLedger, CustodyReport};
pub use engine::ConditionalTokens;
pub use event_log::EventLog;
pub use guard::{GuardToken, ReentrancyGuard};
pub use redeem::{RedemptionReceipt, payout_for};
