//! Send history endpoint.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use outbound_core::ports::SendHistory;
use outbound_shared::ApiResponse;

use crate::middleware::error::AppResult;
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 1_000;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// GET /api/history?limit=N
pub async fn recent_sends(
    state: web::Data<AppState>,
    query: web::Query<HistoryQuery>,
) -> AppResult<HttpResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let records = state.history.recent(limit).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(records)))
}
