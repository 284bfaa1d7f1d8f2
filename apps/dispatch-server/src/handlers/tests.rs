use std::sync::Arc;

use actix_web::{App, test, web};
use async_trait::async_trait;
use serde_json::{Value, json};

use outbound_core::domain::{
    OutboundSettings, ProviderCredentials, ProviderId, SendParams, SendResult, SenderConfig,
};
use outbound_core::ports::{ProviderAdapter, ProviderError, SendHistory};
use outbound_infra::{InMemorySendHistory, LimiterRegistry};

use super::configure_routes;
use crate::state::AppState;

struct AcceptingAdapter(ProviderId);

#[async_trait]
impl ProviderAdapter for AcceptingAdapter {
    fn id(&self) -> ProviderId {
        self.0
    }

    fn validate_config(&self, _config: &SenderConfig) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn send_lead(
        &self,
        _config: &SenderConfig,
        params: &SendParams,
    ) -> Result<SendResult, ProviderError> {
        Ok(SendResult::created(Some(format!("lead-{}", params.email))))
    }

    fn supports_campaigns(&self) -> bool {
        true
    }
}

fn state(settings: OutboundSettings) -> AppState {
    let history: Arc<dyn SendHistory> = Arc::new(InMemorySendHistory::new());
    let registry = LimiterRegistry::builder(ProviderId::Instantly)
        .with_adapter(Arc::new(AcceptingAdapter(ProviderId::Instantly)))
        .with_history(history.clone())
        .build()
        .unwrap();
    AppState::from_parts(registry, settings, history)
}

fn instantly_settings() -> OutboundSettings {
    OutboundSettings {
        preferred_provider: None,
        instantly: Some(ProviderCredentials::new(
            "key",
            Some("3f2b8c4e-5d6a-4b7c-8d9e-0a1b2c3d4e5f".to_string()),
        )),
        smartlead: None,
    }
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health_lists_providers() {
    let app = app!(state(instantly_settings()));

    let req = test::TestRequest::get().uri("/api/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["status"], "ok");
    assert_eq!(body["providers"], json!(["instantly"]));
}

#[actix_web::test]
async fn test_send_batch_returns_every_outcome() {
    let app = app!(state(instantly_settings()));

    let req = test::TestRequest::post()
        .uri("/api/sends")
        .set_json(json!({
            "leads": [{"email": "ada@example.com"}, {"email": "grace@example.com"}]
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["provider"], "instantly");
    let outcomes = body["data"]["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0]["email"], "ada@example.com");
    assert_eq!(outcomes[0]["result"]["status"], "new");
    assert_eq!(outcomes[1]["result"]["lead_id"], "lead-grace@example.com");
}

#[actix_web::test]
async fn test_send_without_configured_provider_is_unprocessable() {
    let app = app!(state(OutboundSettings::default()));

    let req = test::TestRequest::post()
        .uri("/api/sends")
        .set_json(json!({"leads": [{"email": "ada@example.com"}]}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 422);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Unprocessable Entity");
}

#[actix_web::test]
async fn test_send_with_unknown_provider_is_bad_request() {
    let app = app!(state(instantly_settings()));

    let req = test::TestRequest::post()
        .uri("/api/sends")
        .set_json(json!({"provider": "mailchimp", "leads": [{"email": "ada@example.com"}]}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_limiter_status() {
    let app = app!(state(instantly_settings()));

    let req = test::TestRequest::get()
        .uri("/api/limiters/Instantly")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["provider"], "instantly");
    assert_eq!(body["data"]["status"]["queue_length"], 0);

    let req = test::TestRequest::get()
        .uri("/api/limiters/smartlead")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_abort_rejects_until_reset() {
    let app = app!(state(instantly_settings()));
    let batch = json!({"leads": [{"email": "ada@example.com"}]});

    let req = test::TestRequest::post()
        .uri("/api/limiters/instantly/abort")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::post()
        .uri("/api/sends")
        .set_json(&batch)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(
        body["data"]["outcomes"][0]["error"],
        "Send aborted before dispatch"
    );

    let req = test::TestRequest::post()
        .uri("/api/limiters/instantly/reset")
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/sends")
        .set_json(&batch)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["outcomes"][0]["result"]["success"], true);
}

#[actix_web::test]
async fn test_history_limit() {
    let app = app!(state(instantly_settings()));

    let req = test::TestRequest::get()
        .uri("/api/history?limit=5")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    assert!(body["data"].as_array().unwrap().is_empty());
}
