// src/web/transfer.rs

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::error::ServiceError;
use crate::middleware::{ApiError, RequestContext};
use crate::web::AppState;

const UPLOAD_FIELD: &str = "file";

/// Импорт сотрудников из CSV (multipart, поле `file`).
///
/// Ожидаемые колонки (порядок не важен):
/// first_name,last_name,department,position,location,status,company
pub async fn import_employees(
    State(state): State<AppState>,
    ctx: RequestContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    ctx.admit(&state, "employees:import")?;
    let mut multipart = multipart.map_err(|e| ServiceError::Upload(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::Upload(format!("invalid multipart payload: {e}")))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ServiceError::Upload(format!("failed to read upload: {e}")))?;
            upload = Some(bytes);
            break;
        }
    }

    let bytes = upload.ok_or_else(|| ServiceError::Upload("missing 'file' field".to_string()))?;
    let summary = state
        .service
        .import_csv(&ctx.organization_id, &bytes, Some(ctx.client.clone()))?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// Выгрузка всех сотрудников организации в CSV
pub async fn export_employees(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<impl IntoResponse, ApiError> {
    ctx.admit(&state, "employees:export")?;

    let body = state
        .service
        .export_csv(&ctx.organization_id, Some(ctx.client.clone()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"employees.csv\"",
            ),
        ],
        body,
    ))
}
