use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Acked { at: Instant },
    TimedOut,
}

/// Single-assignment completion cell. The first `complete` wins and every
/// later call is a silent no-op.
#[derive(Debug, Default)]
pub struct OutcomeSlot {
    outcome: OnceLock<Outcome>,
}

impl OutcomeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn complete(&self, outcome: Outcome) -> bool {
        self.outcome.set(outcome).is_ok()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome.get().copied()
    }

    pub fn is_complete(&self) -> bool {
        self.outcome.get().is_some()
    }
}

#[derive(Debug, Clone)]
pub struct PendingSend {
    pub correlation_id: String,
    pub send_timestamp: Instant,
    pub slot: Arc<OutcomeSlot>,
}

impl PendingSend {
    pub fn new(correlation_id: &str, send_timestamp: Instant) -> Self {
        Self {
            correlation_id: correlation_id.to_string(),
            send_timestamp,
            slot: Arc::new(OutcomeSlot::new()),
        }
    }

    pub fn rtt_ms(&self) -> f64 {
        match self.slot.outcome() {
            Some(Outcome::Acked { at }) => {
                at.saturating_duration_since(self.send_timestamp).as_secs_f64() * 1000.0
            }
            _ => f64::NAN,
        }
    }
}

#[derive(Debug, Default)]
pub struct PendingSends {
    entries: HashMap<String, PendingSend>,
}

impl PendingSends {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, correlation_id: &str, send_timestamp: Instant) -> PendingSend {
        let pending = PendingSend::new(correlation_id, send_timestamp);
        self.entries
            .insert(correlation_id.to_string(), pending.clone());
        pending
    }

    pub fn acknowledge(&mut self, correlation_id: &str, at: Instant) -> bool {
        match self.entries.remove(correlation_id) {
            Some(pending) => pending.slot.complete(Outcome::Acked { at }),
            None => false,
        }
    }

    pub fn expire(&mut self, correlation_id: &str) -> bool {
        match self.entries.remove(correlation_id) {
            Some(pending) => pending.slot.complete(Outcome::TimedOut),
            None => false,
        }
    }

    pub fn contains(&self, correlation_id: &str) -> bool {
        self.entries.contains_key(correlation_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
