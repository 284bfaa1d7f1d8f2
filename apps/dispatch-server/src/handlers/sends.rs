//! Batch send handler.

use actix_web::{HttpResponse, web};
use futures::future::join_all;

use outbound_core::domain::ProviderId;
use outbound_shared::dto::{LeadOutcome, SendBatchRequest, SendBatchResponse};
use outbound_shared::ApiResponse;

use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/sends
///
/// Resolves the sender, queues every lead on that provider's limiter and
/// answers once all of them have settled.
pub async fn send_batch(
    state: web::Data<AppState>,
    body: web::Json<SendBatchRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    if req.leads.is_empty() {
        return Err(AppError::BadRequest("Batch contains no leads".to_string()));
    }

    let requested = req
        .provider
        .as_deref()
        .map(str::parse::<ProviderId>)
        .transpose()?;
    let sender = state.settings.resolve(requested, req.campaign_id)?;

    let limiter = state.registry.limiter(sender.provider).ok_or_else(|| {
        AppError::Unavailable(format!("No limiter registered for {}", sender.provider))
    })?;

    tracing::info!(
        provider = %sender.provider,
        leads = req.leads.len(),
        "Batch enqueued"
    );

    let pending: Vec<_> = req
        .leads
        .into_iter()
        .map(|lead| {
            let email = lead.email.clone();
            (email, limiter.enqueue(sender.clone(), lead))
        })
        .collect();

    let outcomes = join_all(pending.into_iter().map(|(email, handle)| async move {
        let request_id = handle.id().to_string();
        match handle.await {
            Ok(result) => LeadOutcome::sent(request_id, email, result),
            Err(e) => LeadOutcome::failed(request_id, email, e.to_string()),
        }
    }))
    .await;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(SendBatchResponse {
        provider: sender.provider,
        campaign_id: sender.campaign_id,
        outcomes,
    })))
}
