//! Configuration for a Condex engine instance.

use serde::{Deserialize, Serialize};

use crate::{Address, CondexError, Result, constants};

/// Configuration for one settlement engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Identity that holds pooled collateral on the engine's behalf.
    pub custody_address: Address,
    /// Number of ledger events retained before the oldest is evicted.
    pub event_log_capacity: usize,
    /// Outcome slots per condition. Only binary conditions are supported.
    pub max_outcome_slots: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            custody_address: Address(constants::DEFAULT_CUSTODY_ADDRESS),
            event_log_capacity: constants::DEFAULT_EVENT_LOG_CAPACITY,
            max_outcome_slots: constants::BINARY_OUTCOME_SLOTS,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject a zero custody address, an empty event log, or any outcome
    /// slot count other than binary.
    pub fn validate(&self) -> Result<()> {
        if self.custody_address.is_zero() {
            return Err(CondexError::Configuration(
                "custody_address must not be the zero address".into(),
            ));
        }
        if self.event_log_capacity == 0 {
            return Err(CondexError::Configuration(
                "event_log_capacity must be > 0".into(),
            ));
        }
        if self.max_outcome_slots != constants::BINARY_OUTCOME_SLOTS {
            return Err(CondexError::Configuration(format!(
                "max_outcome_slots must be {}, got {}",
                constants::BINARY_OUTCOME_SLOTS,
                self.max_outcome_slots
            )));
        }
        Ok(())
    }
}
