use async_trait::async_trait;

use crate::domain::SendRecord;

/// Send history trait - audit trail of delivered sends.
///
/// Called fire-and-forget after a successful dispatch; failures here never
/// change the result already handed to the caller.
#[async_trait]
pub trait SendHistory: Send + Sync {
    /// Persist one delivered send.
    async fn record(&self, record: SendRecord) -> Result<(), HistoryError>;

    /// Most recent records, newest first.
    async fn recent(&self, limit: usize) -> Result<Vec<SendRecord>, HistoryError>;
}

/// History backend errors.
#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Write failed: {0}")]
    Write(String),
}
