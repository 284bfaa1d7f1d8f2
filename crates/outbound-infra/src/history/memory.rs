//! In-memory send history - used when no durable store is wired in.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::RwLock;

use outbound_core::domain::SendRecord;
use outbound_core::ports::{HistoryError, SendHistory};

const DEFAULT_CAPACITY: usize = 10_000;

/// Bounded ring of recent send records.
///
/// Note: Data is lost on process restart.
pub struct InMemorySendHistory {
    records: RwLock<VecDeque<SendRecord>>,
    capacity: usize,
}

impl InMemorySendHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemorySendHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SendHistory for InMemorySendHistory {
    async fn record(&self, record: SendRecord) -> Result<(), HistoryError> {
        let mut records = self.records.write().await;
        if records.len() >= self.capacity {
            records.pop_front();
        }
        tracing::debug!(request_id = %record.id, email = %record.email, "Send recorded");
        records.push_back(record);
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<SendRecord>, HistoryError> {
        let records = self.records.read().await;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }
}
