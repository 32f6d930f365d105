// src/web.rs

pub mod transfer;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::employee_service::EmployeeService;
use crate::error::ServiceError;
use crate::middleware::{ApiError, RequestContext};
use crate::models::{NewEmployee, OptionalField};
use crate::projection::ProjectedEmployee;
use crate::query::EmployeeQuery;
use crate::rate_limit::AdmissionController;

/// Состояние приложения
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EmployeeService>,
    pub limiter: Arc<AdmissionController>,
    pub trust_forwarded_for: bool,
    pub max_request_size: usize,
}

impl AppState {
    pub fn new(service: Arc<EmployeeService>, limiter: Arc<AdmissionController>) -> Self {
        Self {
            service,
            limiter,
            trust_forwarded_for: false,
            max_request_size: 10 * 1024 * 1024,
        }
    }

    pub fn with_server_config(mut self, config: &AppConfig) -> Self {
        self.trust_forwarded_for = config.server.trust_forwarded_for;
        self.max_request_size = config.server.max_request_size;
        self
    }
}

/// Параметры поиска в строке запроса.
///
/// Многозначные фильтры передаются через запятую:
/// `?statuses=Active,Not%20started&locations=Singapore`.
/// Номер и размер страницы разбираются мягко: мусор и значения ≤ 0
/// заменяются значениями по умолчанию.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub search: Option<String>,
    pub statuses: Option<String>,
    pub locations: Option<String>,
    pub companies: Option<String>,
    pub departments: Option<String>,
    pub positions: Option<String>,
    pub include_terminated: Option<String>,
    pub columns: Option<String>,
}

fn split_comma_separated(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn lenient_number(value: Option<&str>) -> i64 {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("true" | "1" | "yes" | "on")
    )
}

impl SearchParams {
    pub fn to_query(&self) -> EmployeeQuery {
        EmployeeQuery {
            search: self.search.clone(),
            statuses: split_comma_separated(self.statuses.as_deref()),
            locations: split_comma_separated(self.locations.as_deref()),
            companies: split_comma_separated(self.companies.as_deref()),
            departments: split_comma_separated(self.departments.as_deref()),
            positions: split_comma_separated(self.positions.as_deref()),
            include_terminated: parse_flag(self.include_terminated.as_deref()),
            page: lenient_number(self.page.as_deref()),
            page_size: lenient_number(self.page_size.as_deref()),
        }
    }

    /// Запрошенные колонки; неизвестные имена просто отбрасываются
    pub fn requested_columns(&self) -> Option<Vec<OptionalField>> {
        self.columns.as_deref().map(|raw| {
            split_comma_separated(Some(raw))
                .iter()
                .filter_map(|name| name.parse().ok())
                .collect()
        })
    }
}

#[derive(Serialize)]
pub struct PagedEmployees {
    pub items: Vec<ProjectedEmployee>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_employees(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(params): Query<SearchParams>,
) -> Result<Json<PagedEmployees>, ApiError> {
    ctx.admit(&state, "employees")?;

    let columns = params.requested_columns();
    let page = state
        .service
        .search(&ctx.organization_id, &params.to_query(), columns.as_deref())?;

    Ok(Json(PagedEmployees {
        items: page.items,
        total: page.total,
        page: page.page,
        page_size: page.page_size,
    }))
}

async fn filter_values(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<impl IntoResponse, ApiError> {
    ctx.admit(&state, "filters")?;
    let options = state.service.filter_options(&ctx.organization_id)?;
    Ok(Json(options))
}

async fn create_employee(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<NewEmployee>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // тело разбираем только после лимитера, иначе кривые запросы его обходят
    ctx.admit(&state, "employees:create")?;
    let Json(payload) = payload.map_err(|e| ServiceError::Validation(e.body_text()))?;
    let created = state
        .service
        .create(&ctx.organization_id, payload, Some(ctx.client.clone()))?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub fn create_router(state: AppState) -> Router {
    let cors = tower_http::cors::CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let body_limit = state.max_request_size;

    Router::new()
        .route("/health", get(health))
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/filters", get(filter_values))
        .route("/employees/import", post(transfer::import_employees))
        .route("/employees/export", get(transfer::export_employees))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(tower_http::trace::TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
}

/// Периодическая очистка окон лимитера
pub fn spawn_limiter_sweeper(
    limiter: Arc<AdmissionController>,
    every: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = limiter.sweep(Instant::now());
            debug!(evicted, tracked = limiter.tracked_keys(), "limiter sweep");
        }
    })
}

pub async fn run_web_server(state: AppState, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 Web API запущен на http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
