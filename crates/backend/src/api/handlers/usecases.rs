use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::shared::config;
use crate::shared::shopee::ShopeeClient;
use crate::usecases;

// ============================================================================
// UseCase u601: Export from Shopee
// ============================================================================

static EXPORT_EXECUTOR: Lazy<Arc<usecases::u601_export_from_shopee::ExportExecutor>> =
    Lazy::new(|| {
        let cfg = config::get();
        let gateway = Arc::new(ShopeeClient::new(cfg.shopee.clone()));
        let tracker = usecases::u601_export_from_shopee::ExportJobTracker::new();
        Arc::new(usecases::u601_export_from_shopee::ExportExecutor::new(
            gateway,
            tracker,
            cfg.export.clone(),
        ))
    });

/// Уборка завершенных заданий; дергается фоновой задачей из main
pub fn cleanup_export_jobs(max_age_hours: i64) {
    EXPORT_EXECUTOR.cleanup_old_jobs(max_age_hours);
}

/// POST /api/u601/export/start
///
/// Ошибки валидации приходят внутри ответа статусом Failed, HTTP всегда 200
pub async fn u601_start_export(
    Json(request): Json<contracts::usecases::u601_export_from_shopee::ExportRequest>,
) -> Json<contracts::usecases::u601_export_from_shopee::ExportResponse> {
    Json(EXPORT_EXECUTOR.start_export(request))
}

/// GET /api/u601/export/:job_id/progress
pub async fn u601_get_progress(
    Path(job_id): Path<String>,
) -> Result<Json<contracts::usecases::u601_export_from_shopee::ExportProgress>, StatusCode> {
    match EXPORT_EXECUTOR.tracker().get_progress(&job_id) {
        Some(progress) => Ok(Json(progress)),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// POST /api/u601/export/:job_id/cancel
pub async fn u601_cancel_export(Path(job_id): Path<String>) -> StatusCode {
    if EXPORT_EXECUTOR.tracker().request_cancel(&job_id) {
        StatusCode::ACCEPTED
    } else {
        StatusCode::NOT_FOUND
    }
}

/// GET /api/u601/export/:job_id/download
///
/// Файл отдается один раз: после скачивания задание удаляется из памяти
pub async fn u601_download(Path(job_id): Path<String>) -> Result<impl IntoResponse, StatusCode> {
    let file = EXPORT_EXECUTOR
        .tracker()
        .take_file(&job_id)
        .ok_or(StatusCode::NOT_FOUND)?;

    tracing::info!("Export file {} downloaded, job {} evicted", file.filename, job_id);
    let headers = [
        (
            header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
        ),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.filename),
        ),
    ];
    Ok((headers, file.bytes))
}
