//! Bounded, append-only ledger event log.
//!
//! Keeps the most recent `capacity` events; when full, the oldest entry is
//! evicted so memory stays predictable in long-running services. Sequence
//! numbers keep increasing across evictions.

use std::collections::VecDeque;

use chrono::Utc;
use condex_types::{LedgerEvent, LedgerEventKind};

/// Sequence-numbered ring of the most recent ledger events.
pub struct EventLog {
    /// Front = oldest.
    events: VecDeque<LedgerEvent>,
    next_sequence: u64,
    capacity: usize,
}

impl EventLog {
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "EventLog capacity must be > 0");
        Self {
            events: VecDeque::with_capacity(capacity.min(1024)),
            next_sequence: 0,
            capacity,
        }
    }

    /// Append an event, returning its sequence number.
    pub fn push(&mut self, kind: LedgerEventKind) -> u64 {
        if self.events.len() >= self.capacity {
            self.events.pop_front();
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.events.push_back(LedgerEvent {
            sequence,
            recorded_at: Utc::now(),
            kind,
        });
        sequence
    }

    /// Retained events with `sequence >= from`, oldest first.
    #[must_use]
    pub fn since(&self, from: u64) -> Vec<LedgerEvent> {
        self.events
            .iter()
            .filter(|e| e.sequence >= from)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
