//! Error types for the Condex settlement engine.
//!
//! All errors use the `CX_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by kind:
//! - 1xx: Authorization errors
//! - 2xx: Lifecycle state errors
//! - 3xx: Input errors
//! - 4xx: Resource / arithmetic errors
//! - 5xx: Integration errors (external collateral transfers)
//! - 6xx: Concurrency errors
//! - 9xx: General / internal errors
//!
//! Every failure leaves engine state unchanged.

use std::fmt;

use thiserror::Error;

use crate::{Address, ConditionId};

/// Coarse classification of a [`CondexError`], so callers can react per kind
/// (e.g. retry an allowance problem, treat `AlreadyResolved` as permanent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Authorization,
    State,
    Input,
    Resource,
    Integration,
    Concurrency,
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authorization => write!(f, "AUTHORIZATION"),
            Self::State => write!(f, "STATE"),
            Self::Input => write!(f, "INPUT"),
            Self::Resource => write!(f, "RESOURCE"),
            Self::Integration => write!(f, "INTEGRATION"),
            Self::Concurrency => write!(f, "CONCURRENCY"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Central error enum for all Condex operations.
#[derive(Debug, Error)]
pub enum CondexError {
    // =================================================================
    // Authorization Errors (1xx)
    // =================================================================
    /// `resolve` was called by someone other than the bound arbiter.
    #[error("CX_ERR_100: Unauthorized: caller {caller} is not arbiter {arbiter}")]
    Unauthorized { caller: Address, arbiter: Address },

    // =================================================================
    // State Errors (2xx)
    // =================================================================
    /// No condition exists for the given identifier or question.
    #[error("CX_ERR_200: Condition not prepared: {0}")]
    NotPrepared(String),

    /// A condition with this identifier already exists.
    #[error("CX_ERR_201: Condition already prepared: {0}")]
    AlreadyPrepared(ConditionId),

    /// The condition already has a payout vector.
    #[error("CX_ERR_202: Condition already resolved: {0}")]
    AlreadyResolved(ConditionId),

    /// The condition has not been resolved yet.
    #[error("CX_ERR_203: Condition not resolved: {0}")]
    Unresolved(ConditionId),

    // =================================================================
    // Input Errors (3xx)
    // =================================================================
    /// Only binary conditions are supported.
    #[error("CX_ERR_300: Unsupported outcome slot count: {0} (expected 2)")]
    UnsupportedOutcomeCount(u32),

    /// Amount must be strictly positive.
    #[error("CX_ERR_301: Amount must be non-zero")]
    ZeroAmount,

    /// The reported payout vector sums to zero.
    #[error("CX_ERR_302: Payout vector sums to zero")]
    ZeroPayout,

    /// Outcome mask is empty or names a slot that does not exist.
    #[error("CX_ERR_303: Invalid outcome selector: {0:#04b}")]
    InvalidOutcomeSelector(u8),

    /// The condition is bound to a different collateral asset.
    #[error("CX_ERR_304: Collateral mismatch: condition uses {expected}, got {actual}")]
    CollateralMismatch { expected: Address, actual: Address },

    /// The null address cannot arbitrate a condition.
    #[error("CX_ERR_305: Arbiter must not be the zero address")]
    ZeroArbiter,

    /// A burn or transfer asked for more claims than the holder has.
    #[error("CX_ERR_306: Insufficient claims: need {needed}, have {available}")]
    InsufficientClaims { needed: u128, available: u128 },

    /// The engine's own custody identity cannot split, redeem or hold claims.
    #[error("CX_ERR_307: Custody address {0} cannot act as a holder")]
    CustodyCaller(Address),

    // =================================================================
    // Resource Errors (4xx)
    // =================================================================
    /// A holder has claims on an outcome nobody was ever minted; the payout
    /// division would be by zero.
    #[error("CX_ERR_400: Empty side: no outstanding claims on outcome {outcome} of {condition}")]
    EmptySide {
        condition: ConditionId,
        outcome: usize,
    },

    /// An accounting computation exceeded the representable range.
    #[error("CX_ERR_401: Arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    // =================================================================
    // Integration Errors (5xx)
    // =================================================================
    /// Pulling collateral from the caller failed (balance, allowance, asset refusal).
    #[error("CX_ERR_500: Collateral transfer failed: {reason}")]
    CollateralTransferFailed { reason: String },

    /// Pushing the payout to the caller failed. Burned claims were restored.
    #[error("CX_ERR_501: Payout transfer failed: {reason}")]
    PayoutTransferFailed { reason: String },

    // =================================================================
    // Concurrency Errors (6xx)
    // =================================================================
    /// A mutating entry point was invoked while another one was in progress.
    #[error("CX_ERR_600: Reentrant call rejected")]
    ReentrantCall,

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Custody holds less collateral than the ledger says it should.
    #[error("CX_ERR_900: Custody invariant violation: {reason}")]
    CustodyInvariantViolation { reason: String },

    /// Unrecoverable internal error.
    #[error("CX_ERR_901: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("CX_ERR_902: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("CX_ERR_903: Configuration error: {0}")]
    Configuration(String),
}

impl CondexError {
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. } => ErrorCategory::Authorization,
            Self::NotPrepared(_)
            | Self::AlreadyPrepared(_)
            | Self::AlreadyResolved(_)
            | Self::Unresolved(_) => ErrorCategory::State,
            Self::UnsupportedOutcomeCount(_)
            | Self::ZeroAmount
            | Self::ZeroPayout
            | Self::InvalidOutcomeSelector(_)
            | Self::CollateralMismatch { .. }
            | Self::ZeroArbiter
            | Self::InsufficientClaims { .. }
            | Self::CustodyCaller(_) => ErrorCategory::Input,
            Self::EmptySide { .. } | Self::ArithmeticOverflow(_) => ErrorCategory::Resource,
            Self::CollateralTransferFailed { .. } | Self::PayoutTransferFailed { .. } => {
                ErrorCategory::Integration
            }
            Self::ReentrantCall => ErrorCategory::Concurrency,
            Self::CustodyInvariantViolation { .. }
            | Self::Internal(_)
            | Self::Serialization(_)
            | Self::Configuration(_) => ErrorCategory::Internal,
        }
    }

    /// Whether retrying the same call later can succeed without the caller
    /// changing its inputs.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Integration | ErrorCategory::Concurrency
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, CondexError>;

impl From<serde_json::Error> for CondexError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
