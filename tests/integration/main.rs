// tests/integration/main.rs

mod employees;
mod events;
mod throttling;
mod transfer;

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use employee_directory::config::AppConfig;
use employee_directory::employee_service::EmployeeService;
use employee_directory::events::EventHub;
use employee_directory::projection::FieldProjector;
use employee_directory::rate_limit::AdmissionController;
use employee_directory::store::MemoryStore;
use employee_directory::web::{self, AppState};

/// Роутер с демо-данными и заданным лимитом запросов
pub fn test_router(max_requests: u32) -> Router {
    let config = AppConfig::default();
    let service = Arc::new(EmployeeService::new(
        Arc::new(MemoryStore::new()),
        FieldProjector::new(Arc::new(config.org_columns.clone())),
        Arc::new(EventHub::new()),
    ));
    service.seed_demo_data().unwrap();

    let limiter = Arc::new(AdmissionController::new(Duration::from_secs(60), max_requests));
    web::create_router(AppState::new(service, limiter).with_server_config(&config))
}

pub fn get(uri: &str, org: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(org) = org {
        builder = builder.header("X-Org-Id", org);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, org: &str, payload: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("X-Org-Id", org)
        .header("Content-Type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
