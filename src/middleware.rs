// src/middleware.rs

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{error, warn};

use crate::audit_log;
use crate::error::ServiceError;
use crate::rate_limit::{Decision, RateLimitKey};
use crate::web::AppState;

pub const ORG_HEADER: &str = "X-Org-Id";
const FORWARDED_FOR: &str = "X-Forwarded-For";

/// Ошибка HTTP-слоя; тело всегда `{"error": ...}`
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ServiceError::MissingOrganization | ServiceError::Upload(_) => StatusCode::BAD_REQUEST,
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Throttled { .. } => StatusCode::TOO_MANY_REQUESTS,
            ServiceError::Storage(e) => {
                error!(error = %e, "storage failure");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self.0 {
            ServiceError::Storage(_) => "Internal error".to_string(),
            other => other.to_string(),
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();
        if let ServiceError::Throttled { retry_after } = &self.0 {
            // округляем вверх, чтобы клиент не пришёл раньше времени
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            if let Ok(value) = HeaderValue::from_str(&secs.max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

/// Контекст запроса: организация и адрес клиента
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub organization_id: String,
    pub client: String,
}

/// Извлечение `RequestContext` из заголовков и адреса соединения
#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let organization_id = parts
            .headers
            .get(ORG_HEADER)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|org| !org.is_empty())
            .ok_or(ApiError(ServiceError::MissingOrganization))?
            .to_string();

        let forwarded = state
            .trust_forwarded_for
            .then(|| {
                parts
                    .headers
                    .get(FORWARDED_FOR)
                    .and_then(|h| h.to_str().ok())
                    .and_then(|h| h.split(',').next())
                    .map(str::trim)
                    .filter(|ip| !ip.is_empty())
                    .map(str::to_string)
            })
            .flatten();

        let client = forwarded
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        Ok(Self {
            organization_id,
            client,
        })
    }
}

impl RequestContext {
    /// Проверить лимит для эндпоинта; при отказе сразу 429
    pub fn admit(&self, state: &AppState, endpoint: &str) -> Result<(), ApiError> {
        let key = RateLimitKey::new(&self.client, &self.organization_id, endpoint);
        match state.limiter.check(&key, Instant::now()) {
            Decision::Allowed { .. } => Ok(()),
            Decision::Denied { retry_after } => {
                warn!(
                    client = %self.client,
                    org = %self.organization_id,
                    endpoint,
                    "rate limit exceeded"
                );
                audit_log!(
                    state.service.events(),
                    "rate_limit.denied",
                    self.organization_id,
                    Some(self.client.clone()),
                    "endpoint" => endpoint
                );
                Err(ApiError(ServiceError::Throttled { retry_after }))
            }
        }
    }
}
