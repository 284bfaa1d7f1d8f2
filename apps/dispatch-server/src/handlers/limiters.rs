//! Limiter inspection and control.

use actix_web::{HttpResponse, web};

use outbound_core::domain::ProviderId;
use outbound_infra::RateLimiter;
use outbound_shared::dto::LimiterStatusResponse;
use outbound_shared::ApiResponse;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn find<'a>(state: &'a AppState, provider: &str) -> AppResult<&'a RateLimiter> {
    let id: ProviderId = provider
        .parse()
        .map_err(|e: outbound_core::DomainError| AppError::NotFound(e.to_string()))?;
    state
        .registry
        .limiter(id)
        .ok_or_else(|| AppError::NotFound(format!("No limiter registered for {id}")))
}

fn snapshot(limiter: &RateLimiter) -> LimiterStatusResponse {
    LimiterStatusResponse {
        provider: limiter.provider(),
        status: limiter.status(),
        progress: limiter.progress(),
    }
}

/// GET /api/limiters/{provider}
pub async fn status(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let limiter = find(&state, &path)?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(snapshot(limiter))))
}

/// POST /api/limiters/{provider}/abort
pub async fn abort(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let limiter = find(&state, &path)?;
    limiter.abort();
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        snapshot(limiter),
        "Queued sends aborted",
    )))
}

/// POST /api/limiters/{provider}/reset
pub async fn reset(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let limiter = find(&state, &path)?;
    limiter.reset();
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        snapshot(limiter),
        "Batch reset",
    )))
}
