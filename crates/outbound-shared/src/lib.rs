//! # Outbound Shared
//!
//! Request and response types for the dispatch HTTP API.

pub mod dto;
pub mod response;

pub use dto::{HealthResponse, LeadOutcome, LimiterStatusResponse, SendBatchRequest, SendBatchResponse};
pub use response::{ApiResponse, ErrorResponse};
