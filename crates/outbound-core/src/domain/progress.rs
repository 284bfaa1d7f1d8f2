use serde::{Deserialize, Serialize};

/// Batch progress, emitted on every limiter state transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub queued: usize,
    pub in_flight: usize,
    pub completed: usize,
    pub total: usize,
}

/// Diagnostic snapshot of a limiter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimiterStatus {
    pub tokens: f64,
    pub max_tokens: f64,
    pub queue_length: usize,
    pub in_flight: usize,
}
