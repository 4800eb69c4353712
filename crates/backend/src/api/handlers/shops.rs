use std::sync::Arc;

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::Redirect;
use axum::Json;
use chrono::{DateTime, Utc};
use contracts::domain::a001_shop::Shop;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::a001_shop::{repository, service};
use crate::shared::config;
use crate::shared::shopee::ShopeeClient;

/// Общий клиент Shopee для OAuth-роутов
pub static SHOPEE_CLIENT: Lazy<Arc<ShopeeClient>> =
    Lazy::new(|| Arc::new(ShopeeClient::new(config::get().shopee.clone())));

/// Магазин для фронтенда: без токенов
#[derive(Debug, Serialize)]
pub struct ShopView {
    pub shop_id: String,
    pub shop_name: String,
    pub connected_at: DateTime<Utc>,
    pub token_expires_at: DateTime<Utc>,
    /// Access token есть и еще не истек
    pub token_valid: bool,
    /// Пара токенов сброшена, нужен повторный проход OAuth
    pub needs_reauth: bool,
}

impl From<Shop> for ShopView {
    fn from(shop: Shop) -> Self {
        Self {
            token_valid: shop.is_token_valid(),
            needs_reauth: shop.access_token.is_empty(),
            shop_id: shop.shop_id,
            shop_name: shop.shop_name,
            connected_at: shop.connected_at,
            token_expires_at: shop.expires_at,
        }
    }
}

/// GET /api/shops
pub async fn list() -> Json<Vec<ShopView>> {
    Json(repository::list().into_iter().map(ShopView::from).collect())
}

/// GET /api/shops/authorize — редирект на страницу авторизации Shopee
pub async fn authorize() -> Redirect {
    Redirect::temporary(&SHOPEE_CLIENT.authorize_url())
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    pub shop_id: String,
}

/// GET /api/shops/callback — сюда Shopee возвращает одноразовый код
pub async fn callback(Query(query): Query<CallbackQuery>) -> Result<Redirect, StatusCode> {
    match service::connect_shop(&SHOPEE_CLIENT, &query.code, &query.shop_id).await {
        Ok(_) => Ok(Redirect::temporary("/")),
        Err(e) => {
            tracing::error!("Shop connection failed for {}: {:#}", query.shop_id, e);
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

/// DELETE /api/shops/:shop_id
pub async fn disconnect(Path(shop_id): Path<String>) -> StatusCode {
    if service::disconnect_shop(&shop_id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shop(expire_in_secs: i64) -> Shop {
        Shop::new(
            "123456".to_string(),
            "Test Shop".to_string(),
            "access".to_string(),
            "refresh".to_string(),
            expire_in_secs,
        )
    }

    #[test]
    fn view_of_connected_shop_reports_valid_token() {
        let view = ShopView::from(shop(14400));
        assert!(view.token_valid);
        assert!(!view.needs_reauth);
    }

    #[test]
    fn view_of_expired_shop_reports_invalid_token() {
        let view = ShopView::from(shop(-10));
        assert!(!view.token_valid);
        assert!(!view.needs_reauth);
    }

    #[test]
    fn view_of_cleared_shop_requires_reauth() {
        let mut s = shop(14400);
        s.access_token.clear();
        s.refresh_token.clear();
        let view = ShopView::from(s);
        assert!(!view.token_valid);
        assert!(view.needs_reauth);
    }
}
