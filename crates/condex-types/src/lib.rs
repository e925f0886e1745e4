//! # condex-types
//!
//! Shared types, errors, and configuration for the **Condex** conditional
//! claims engine.
//!
//! This crate is the leaf dependency of the workspace. Every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`QuestionId`], [`ConditionId`], [`CollectionId`], [`PositionId`]
//! - **Outcome model**: [`Outcome`], [`OutcomeSelector`]
//! - **Condition model**: [`Condition`], [`ConditionState`]
//! - **Audit trail**: [`LedgerEvent`], [`LedgerEventKind`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`CondexError`] with `CX_ERR_` prefix codes
//! - **Constants**: hashing domains and defaults

pub mod condition;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod outcome;

// Re-export all primary types at crate root for ergonomic imports:
//   use condex_types::{Address, ConditionId, Outcome, CondexError, ...};

pub use condition::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use outcome::*;

// Constants are accessed via `condex_types::constants::FOO`
// (not re-exported to avoid name collisions).
