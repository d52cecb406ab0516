// Lockwatch HTTP API
//
// Confirmation intake (device update + click correlation), liveness, and
// read-only campaign reporting.

pub mod campaigns;
pub mod common;
pub mod config;
pub mod confirmation;
pub mod health;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use lockwatch_core::{
    CampaignStats, ClickCorrelator, DeviceRegistry, EventStore, EventType, OverallPerformance,
    Reporter, UserEngagement,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::common::{ErrorResponse, ListResponse};
use crate::confirmation::{BatteryCheckedRequest, BatteryCheckedResponse};
use crate::health::HealthResponse;

pub use config::ApiConfig;

/// App state shared across routes
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<dyn DeviceRegistry>,
    pub correlator: Arc<ClickCorrelator>,
    pub reporter: Arc<Reporter>,
}

impl AppState {
    pub fn new(registry: Arc<dyn DeviceRegistry>, store: Arc<dyn EventStore>) -> Self {
        Self {
            registry,
            correlator: Arc::new(ClickCorrelator::new(store.clone())),
            reporter: Arc::new(Reporter::new(store)),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        confirmation::battery_checked,
        health::health,
        campaigns::list_campaigns,
        campaigns::overall_performance,
        campaigns::get_campaign,
        campaigns::user_engagement,
    ),
    components(
        schemas(
            BatteryCheckedRequest, BatteryCheckedResponse,
            HealthResponse, ErrorResponse,
            CampaignStats, OverallPerformance, UserEngagement, EventType,
            ListResponse<CampaignStats>,
            ListResponse<UserEngagement>,
        )
    ),
    tags(
        (name = "confirmations", description = "Battery-check confirmations from the app"),
        (name = "campaigns", description = "Campaign and user engagement reporting"),
        (name = "health", description = "Liveness")
    ),
    info(
        title = "Lockwatch API",
        version = "0.1.0",
        description = "Battery-check confirmations and notification campaign reporting",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

/// Full application router
pub fn build_router(state: AppState, confirmation_path: &str) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            confirmation_path,
            post(confirmation::battery_checked).with_state(state.clone()),
        )
        .merge(campaigns::routes(state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::{Duration, Utc};
    use http_body_util::BodyExt;
    use lockwatch_core::memory::{InMemoryDeviceRegistry, InMemoryEventStore};
    use lockwatch_core::NewSentEvent;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct Harness {
        registry: InMemoryDeviceRegistry,
        store: InMemoryEventStore,
        app: Router,
    }

    fn harness_with_path(path: &str) -> Harness {
        let registry = InMemoryDeviceRegistry::new();
        let store = InMemoryEventStore::new();
        let state = AppState::new(Arc::new(registry.clone()), Arc::new(store.clone()));
        Harness {
            registry,
            store,
            app: build_router(state, path),
        }
    }

    fn harness() -> Harness {
        harness_with_path(config::DEFAULT_CONFIRMATION_PATH)
    }

    fn sent(user: &str, lock: &str, campaign: &str) -> NewSentEvent {
        NewSentEvent {
            user_id: user.to_string(),
            lock_id: lock.to_string(),
            campaign_name: campaign.to_string(),
            batch_id: None,
        }
    }

    async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_lock_id_is_bad_request_without_writes() {
        let h = harness();
        h.store.record_sent(sent("u1", "l1", "c")).await.unwrap();

        let (status, body) = call(
            &h.app,
            post_json("/api/battery-checked", json!({ "user_id": "u1", "campaign_id": "c" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "lock_id is required" }));
        assert_eq!(h.registry.checks_recorded(), 0);
        assert!(!h.store.events().await[0].clicked);
    }

    #[tokio::test]
    async fn test_blank_lock_id_is_bad_request() {
        let h = harness();
        let (status, _) = call(&h.app, post_json("/api/battery-checked", json!({ "lock_id": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(h.registry.checks_recorded(), 0);
    }

    #[tokio::test]
    async fn test_lock_id_is_used_verbatim() {
        let h = harness();
        let (status, body) =
            call(&h.app, post_json("/api/battery-checked", json!({ "lock_id": " l1 " }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lock_id"], json!(" l1 "));
        assert!(h.registry.last_checked(" l1 ").await.is_some());
        assert!(h.registry.last_checked("l1").await.is_none());
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let h = harness();
        let request = Request::builder()
            .method("POST")
            .uri("/api/battery-checked")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = call(&h.app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_lock_only_updates_device_without_correlation() {
        let h = harness();
        h.store.record_sent(sent("u1", "l1", "c")).await.unwrap();

        let (status, body) =
            call(&h.app, post_json("/api/battery-checked", json!({ "lock_id": "l1" }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["lock_id"], json!("l1"));
        assert!(body["updated_at"].as_str().unwrap().ends_with('Z'));
        assert_eq!(h.registry.checks_recorded(), 1);
        assert!(h.registry.last_checked("l1").await.is_some());
        assert!(!h.store.events().await[0].clicked);
    }

    #[tokio::test]
    async fn test_full_confirmation_marks_newest_send_clicked() {
        let h = harness();
        let base = Utc::now() - Duration::hours(2);
        let older = h.store.seed_sent(sent("u1", "l1", "battery_low_alert"), base).await;
        let newer = h
            .store
            .seed_sent(sent("u1", "l1", "battery_low_alert"), base + Duration::hours(1))
            .await;

        let (status, _) = call(
            &h.app,
            post_json(
                "/api/battery-checked",
                json!({ "resourceId": "l1", "userId": "u1", "campaignName": "battery_low_alert" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let events = h.store.events().await;
        assert!(events.iter().any(|e| e.id == newer.id && e.clicked));
        assert!(events.iter().any(|e| e.id == older.id && !e.clicked));
    }

    #[tokio::test]
    async fn test_unmatched_correlation_still_succeeds() {
        let h = harness();
        let (status, body) = call(
            &h.app,
            post_json(
                "/api/battery-checked",
                json!({ "lock_id": "l1", "user_id": "u1", "campaign_id": "battery_low_alert" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_registry_failure_is_server_error_and_skips_correlation() {
        let h = harness();
        h.store.record_sent(sent("u1", "l1", "c")).await.unwrap();
        h.registry.set_unavailable(true);

        let (status, body) = call(
            &h.app,
            post_json(
                "/api/battery-checked",
                json!({ "lock_id": "l1", "user_id": "u1", "campaign_id": "c" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], json!("Failed to update battery check"));
        assert!(body["details"].is_string());
        assert!(!h.store.events().await[0].clicked);
    }

    #[tokio::test]
    async fn test_event_store_failure_does_not_fail_confirmation() {
        let h = harness();
        h.store.set_unavailable(true);

        let (status, body) = call(
            &h.app,
            post_json(
                "/api/battery-checked",
                json!({ "lock_id": "l1", "user_id": "u1", "campaign_id": "c" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
        assert_eq!(h.registry.checks_recorded(), 1);
    }

    #[tokio::test]
    async fn test_confirmation_path_is_configurable() {
        let h = harness_with_path("/hooks/battery");

        let (status, _) = call(&h.app, post_json("/hooks/battery", json!({ "lock_id": "l1" }))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) =
            call(&h.app, post_json("/api/battery-checked", json!({ "lock_id": "l1" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_health_ignores_store_state() {
        let h = harness();
        h.registry.set_unavailable(true);
        h.store.set_unavailable(true);

        let (status, body) = call(&h.app, get("/health")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("ok"));
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_campaign_reporting_endpoints() {
        let h = harness();
        h.store.record_sent(sent("u1", "l1", "battery_low_alert")).await.unwrap();
        h.store.record_sent(sent("u1", "l1", "battery_low_alert")).await.unwrap();
        call(
            &h.app,
            post_json(
                "/api/battery-checked",
                json!({ "lock_id": "l1", "user_id": "u1", "campaign_id": "battery_low_alert" }),
            ),
        )
        .await;

        let (status, body) = call(&h.app, get("/v1/campaigns/battery_low_alert")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sent_count"], json!(2));
        assert_eq!(body["clicked_count"], json!(1));
        assert_eq!(body["click_through_rate"], json!(50.0));

        let (status, body) = call(&h.app, get("/v1/campaigns")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, body) = call(&h.app, get("/v1/overall")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_sent"], json!(2));
        assert_eq!(body["campaign_count"], json!(1));

        let (status, body) = call(&h.app, get("/v1/users/u1/engagement")).await;
        assert_eq!(status, StatusCode::OK);
        let history = body["data"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["clicked"], json!(true));
        assert_eq!(history[1]["clicked"], json!(false));
    }

    #[tokio::test]
    async fn test_campaign_named_overall_is_reachable() {
        let h = harness();
        h.store.record_sent(sent("u1", "l1", "overall")).await.unwrap();

        let (status, body) = call(&h.app, get("/v1/campaigns/overall")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["campaign_name"], json!("overall"));
        assert_eq!(body["sent_count"], json!(1));
    }

    #[tokio::test]
    async fn test_unknown_campaign_is_not_found() {
        let h = harness();
        let (status, body) = call(&h.app, get("/v1/campaigns/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_reporting_store_failure_is_server_error() {
        let h = harness();
        h.store.set_unavailable(true);
        let (status, body) = call(&h.app, get("/v1/campaigns")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], json!("Internal server error"));
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let h = harness();
        let (status, body) = call(&h.app, get("/api-doc/openapi.json")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/v1/campaigns"].is_object());
        assert!(body["paths"]["/v1/overall"].is_object());
        assert!(body["paths"]["/api/battery-checked"].is_object());
    }
}
