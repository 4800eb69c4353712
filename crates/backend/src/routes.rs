use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::api::handlers;

/// Конфигурация всех роутов приложения
pub fn configure_routes() -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // A001 Shops: OAuth и реестр магазинов
        // ========================================
        .route("/api/shops", get(handlers::shops::list))
        .route("/api/shops/authorize", get(handlers::shops::authorize))
        .route("/api/shops/callback", get(handlers::shops::callback))
        .route("/api/shops/:shop_id", delete(handlers::shops::disconnect))
        // ========================================
        // UseCase u601: Export from Shopee
        // ========================================
        .route(
            "/api/u601/export/start",
            post(handlers::usecases::u601_start_export),
        )
        .route(
            "/api/u601/export/:job_id/progress",
            get(handlers::usecases::u601_get_progress),
        )
        .route(
            "/api/u601/export/:job_id/cancel",
            post(handlers::usecases::u601_cancel_export),
        )
        .route(
            "/api/u601/export/:job_id/download",
            get(handlers::usecases::u601_download),
        )
}
