//! System-wide constants for the Condex settlement engine.

/// Number of outcome slots supported by this engine. Conditions are binary.
pub const BINARY_OUTCOME_SLOTS: u32 = 2;

/// Default number of ledger events retained before the oldest is evicted.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 100_000;

/// Default custody identity of the engine (the address holding pooled collateral).
pub const DEFAULT_CUSTODY_ADDRESS: [u8; 20] = *b"condex:custody:v1\0\0\0";

/// Hash domain for condition identifiers.
pub const CONDITION_ID_DOMAIN: &[u8] = b"condex:condition_id:v1:";

/// Hash domain for collection identifiers.
pub const COLLECTION_ID_DOMAIN: &[u8] = b"condex:collection_id:v1:";

/// Hash domain for position identifiers.
pub const POSITION_ID_DOMAIN: &[u8] = b"condex:position_id:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Condex";
