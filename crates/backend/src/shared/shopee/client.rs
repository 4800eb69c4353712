use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use contracts::domain::a001_shop::Shop;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::domain::a001_shop::repository;
use crate::shared::config::ShopeeConfig;

use super::error::ShopeeApiError;
use super::gateway::ShopeeGateway;
use super::models::{
    ApiEnvelope, ItemInfo, ItemInfoResponse, ItemListResponse, OrderDetail, OrderDetailResponse,
    OrderListResponse, ReturnListResponse, ShopInfoResponse, TokenResponse,
    TrackingNumberResponse,
};
use super::sign::sign_request;

/// Optional-поля деталей заказа, которые нужны для выгрузки
const ORDER_DETAIL_FIELDS: &str = "buyer_username,recipient_address,item_list,payment_method,total_amount,shipping_carrier,cancel_reason,cancel_by";

/// HTTP-клиент Shopee Open Platform v2.
///
/// Каждый вызов подписывается заново (timestamp входит в подпись),
/// 429 и сетевые сбои повторяются с экспоненциальным backoff,
/// бизнес-ошибки из конверта не повторяются никогда.
pub struct ShopeeClient {
    http: reqwest::Client,
    cfg: ShopeeConfig,
}

impl ShopeeClient {
    pub fn new(cfg: ShopeeConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();
        Self { http, cfg }
    }

    /// Подписанный вызов API. Возвращает весь JSON тела ответа:
    /// у обычных эндпоинтов данные лежат в `response`, у токенных — на
    /// верхнем уровне, поэтому распаковку делают обертки.
    async fn call(
        &self,
        method: Method,
        path: &str,
        auth: Option<(&str, &str)>,
        extra_query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, ShopeeApiError> {
        let mut attempt: u32 = 0;
        let mut retry_delay_ms: u64 = 1000;

        loop {
            let timestamp = Utc::now().timestamp();
            let (access_token, shop_id) = match auth {
                Some((token, shop)) => (Some(token), Some(shop)),
                None => (None, None),
            };
            let sign = sign_request(
                self.cfg.partner_id,
                &self.cfg.partner_key,
                path,
                timestamp,
                access_token,
                shop_id,
            );

            let mut query: Vec<(&str, String)> = vec![
                ("partner_id", self.cfg.partner_id.to_string()),
                ("timestamp", timestamp.to_string()),
                ("sign", sign),
            ];
            if let Some((token, shop)) = auth {
                query.push(("access_token", token.to_string()));
                query.push(("shop_id", shop.to_string()));
            }
            for (key, value) in extra_query {
                query.push((key, value.clone()));
            }

            let url = format!("{}{}", self.cfg.base_url, path);
            let mut request = self.http.request(method.clone(), &url).query(&query);
            if let Some(json) = body {
                request = request.json(json);
            }

            let started = Instant::now();
            let response = match request.send().await {
                Ok(response) => response,
                Err(err) => {
                    if attempt < self.cfg.max_retries {
                        attempt += 1;
                        tracing::warn!(
                            "Shopee request {} failed ({}), retry {}/{} in {}ms",
                            path,
                            err,
                            attempt,
                            self.cfg.max_retries,
                            retry_delay_ms
                        );
                        tokio::time::sleep(Duration::from_millis(retry_delay_ms)).await;
                        retry_delay_ms = (retry_delay_ms * 2).min(8000);
                        continue;
                    }
                    return Err(ShopeeApiError::Network {
                        attempts: attempt + 1,
                        message: err.to_string(),
                    });
                }
            };

            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt < self.cfg.max_retries {
                    // Shopee иногда присылает Retry-After, иначе 2^attempt секунд
                    let wait_secs = response
                        .headers()
                        .get("Retry-After")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(1 << attempt.min(4));
                    attempt += 1;
                    tracing::warn!(
                        "Shopee rate limit on {}, retry {}/{} in {}s",
                        path,
                        attempt,
                        self.cfg.max_retries,
                        wait_secs
                    );
                    tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                    continue;
                }
                return Err(ShopeeApiError::RateLimited {
                    attempts: attempt + 1,
                });
            }

            if status.is_server_error() {
                if attempt < self.cfg.max_retries {
                    attempt += 1;
                    tracing::warn!(
                        "Shopee returned HTTP {} on {}, retry {}/{} in {}ms",
                        status.as_u16(),
                        path,
                        attempt,
                        self.cfg.max_retries,
                        retry_delay_ms
                    );
                    tokio::time::sleep(Duration::from_millis(retry_delay_ms)).await;
                    retry_delay_ms = (retry_delay_ms * 2).min(8000);
                    continue;
                }
                return Err(ShopeeApiError::Network {
                    attempts: attempt + 1,
                    message: format!("HTTP {}", status.as_u16()),
                });
            }

            let body_value: serde_json::Value = response
                .json()
                .await
                .map_err(|e| ShopeeApiError::Decode(e.to_string()))?;

            let envelope: ApiEnvelope = serde_json::from_value(body_value.clone())
                .map_err(|e| ShopeeApiError::Decode(e.to_string()))?;
            if !envelope.error.is_empty() {
                tracing::error!(
                    "Shopee API error on {}: {} ({}), request_id={:?}",
                    path,
                    envelope.error,
                    envelope.message,
                    envelope.request_id
                );
                return Err(ShopeeApiError::Business {
                    error: envelope.error,
                    message: envelope.message,
                });
            }

            tracing::debug!(
                "Shopee {} {} -> {} in {}ms, {} item(s)",
                method,
                path,
                status.as_u16(),
                started.elapsed().as_millis(),
                response_item_count(&body_value)
            );
            return Ok(body_value);
        }
    }

    /// Достать поле `response`; null/отсутствие трактуется как пустой результат
    fn parse_response<T: DeserializeOwned + Default>(
        body: serde_json::Value,
    ) -> Result<T, ShopeeApiError> {
        match body.get("response") {
            Some(value) if !value.is_null() => serde_json::from_value(value.clone())
                .map_err(|e| ShopeeApiError::Decode(e.to_string())),
            _ => Ok(T::default()),
        }
    }

    // ========================================================================
    // OAuth: подключение магазина и жизнь токенов
    // ========================================================================

    /// Ссылка на страницу авторизации Shopee для подключения магазина
    pub fn authorize_url(&self) -> String {
        let path = "/api/v2/shop/auth_partner";
        let timestamp = Utc::now().timestamp();
        let sign = sign_request(
            self.cfg.partner_id,
            &self.cfg.partner_key,
            path,
            timestamp,
            None,
            None,
        );
        let redirect = format!("{}/api/shops/callback", self.cfg.redirect_domain);
        format!(
            "{}{}?partner_id={}&timestamp={}&sign={}&redirect={}",
            self.cfg.base_url,
            path,
            self.cfg.partner_id,
            timestamp,
            sign,
            urlencoding::encode(&redirect)
        )
    }

    /// Обмен одноразового кода из callback на пару токенов
    pub async fn exchange_code(
        &self,
        code: &str,
        shop_id: &str,
    ) -> Result<TokenResponse, ShopeeApiError> {
        let shop_id_num: i64 = shop_id
            .parse()
            .map_err(|_| ShopeeApiError::Config(format!("shop_id '{shop_id}' is not numeric")))?;
        let body = serde_json::json!({
            "code": code,
            "shop_id": shop_id_num,
            "partner_id": self.cfg.partner_id,
        });
        let body_value = self
            .call(Method::POST, "/api/v2/auth/token/get", None, &[], Some(&body))
            .await?;
        serde_json::from_value(body_value).map_err(|e| ShopeeApiError::Decode(e.to_string()))
    }

    /// Обновление access_token по refresh_token
    pub async fn refresh_access_token(
        &self,
        shop_id: &str,
        refresh_token: &str,
    ) -> Result<TokenResponse, ShopeeApiError> {
        let shop_id_num: i64 = shop_id
            .parse()
            .map_err(|_| ShopeeApiError::Config(format!("shop_id '{shop_id}' is not numeric")))?;
        let body = serde_json::json!({
            "refresh_token": refresh_token,
            "shop_id": shop_id_num,
            "partner_id": self.cfg.partner_id,
        });
        let body_value = self
            .call(
                Method::POST,
                "/api/v2/auth/access_token/get",
                None,
                &[],
                Some(&body),
            )
            .await?;
        serde_json::from_value(body_value).map_err(|e| ShopeeApiError::Decode(e.to_string()))
    }

    pub async fn get_shop_info(
        &self,
        access_token: &str,
        shop_id: &str,
    ) -> Result<ShopInfoResponse, ShopeeApiError> {
        let body = self
            .call(
                Method::GET,
                "/api/v2/shop/get_shop_info",
                Some((access_token, shop_id)),
                &[],
                None,
            )
            .await?;
        Self::parse_response(body)
    }

    /// Магазин из реестра с гарантированно живым access_token.
    ///
    /// Если токен истекает в ближайшую минуту — прозрачно обновляет его
    /// и сохраняет новую пару в реестр до выполнения вызова.
    pub async fn ensure_fresh_token(&self, shop_id: &str) -> Result<Shop, ShopeeApiError> {
        let shop = repository::get(shop_id)
            .ok_or_else(|| ShopeeApiError::ShopNotFound(shop_id.to_string()))?;
        if !shop.token_expires_within(60) {
            return Ok(shop);
        }

        tracing::info!("Access token for shop {} is about to expire, refreshing", shop_id);
        let tokens = self.refresh_access_token(shop_id, &shop.refresh_token).await?;
        repository::update_tokens(
            shop_id,
            &tokens.access_token,
            &tokens.refresh_token,
            tokens.expire_in,
        );

        repository::get(shop_id)
            .ok_or_else(|| ShopeeApiError::ShopNotFound(shop_id.to_string()))
    }
}

/// Число записей в известных списочных полях ответа — для лога вызова
fn response_item_count(body: &serde_json::Value) -> usize {
    body.get("response")
        .map(|r| {
            ["order_list", "return", "item", "item_list"]
                .iter()
                .filter_map(|k| r.get(k).and_then(|v| v.as_array()).map(|a| a.len()))
                .sum::<usize>()
        })
        .unwrap_or(0)
}

// ============================================================================
// Реализация шва для конвейера экспорта
// ============================================================================

#[async_trait]
impl ShopeeGateway for ShopeeClient {
    async fn order_list(
        &self,
        shop_id: &str,
        time_from: i64,
        time_to: i64,
        cursor: &str,
        page_size: u32,
    ) -> Result<OrderListResponse, ShopeeApiError> {
        let shop = self.ensure_fresh_token(shop_id).await?;
        let mut query = vec![
            ("time_range_field", "create_time".to_string()),
            ("time_from", time_from.to_string()),
            ("time_to", time_to.to_string()),
            ("page_size", page_size.to_string()),
            ("response_optional_fields", "order_status".to_string()),
        ];
        if !cursor.is_empty() {
            query.push(("cursor", cursor.to_string()));
        }
        let body = self
            .call(
                Method::GET,
                "/api/v2/order/get_order_list",
                Some((&shop.access_token, shop_id)),
                &query,
                None,
            )
            .await?;
        Self::parse_response(body)
    }

    async fn order_detail(
        &self,
        shop_id: &str,
        order_sn_list: &[String],
    ) -> Result<Vec<OrderDetail>, ShopeeApiError> {
        let shop = self.ensure_fresh_token(shop_id).await?;
        let query = vec![
            ("order_sn_list", order_sn_list.join(",")),
            ("response_optional_fields", ORDER_DETAIL_FIELDS.to_string()),
        ];
        let body = self
            .call(
                Method::GET,
                "/api/v2/order/get_order_detail",
                Some((&shop.access_token, shop_id)),
                &query,
                None,
            )
            .await?;
        let parsed: OrderDetailResponse = Self::parse_response(body)?;
        Ok(parsed.order_list)
    }

    async fn return_list(
        &self,
        shop_id: &str,
        time_from: i64,
        time_to: i64,
        page_no: u32,
        page_size: u32,
    ) -> Result<ReturnListResponse, ShopeeApiError> {
        let shop = self.ensure_fresh_token(shop_id).await?;
        let query = vec![
            ("create_time_from", time_from.to_string()),
            ("create_time_to", time_to.to_string()),
            ("page_no", page_no.to_string()),
            ("page_size", page_size.to_string()),
        ];
        let body = self
            .call(
                Method::GET,
                "/api/v2/returns/get_return_list",
                Some((&shop.access_token, shop_id)),
                &query,
                None,
            )
            .await?;
        Self::parse_response(body)
    }

    async fn item_list(
        &self,
        shop_id: &str,
        offset: i64,
        page_size: u32,
    ) -> Result<ItemListResponse, ShopeeApiError> {
        let shop = self.ensure_fresh_token(shop_id).await?;
        let query = vec![
            ("offset", offset.to_string()),
            ("page_size", page_size.to_string()),
            ("item_status", "NORMAL".to_string()),
            ("item_status", "UNLIST".to_string()),
        ];
        let body = self
            .call(
                Method::GET,
                "/api/v2/product/get_item_list",
                Some((&shop.access_token, shop_id)),
                &query,
                None,
            )
            .await?;
        Self::parse_response(body)
    }

    async fn item_base_info(
        &self,
        shop_id: &str,
        item_ids: &[i64],
    ) -> Result<Vec<ItemInfo>, ShopeeApiError> {
        let shop = self.ensure_fresh_token(shop_id).await?;
        let id_list = item_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let query = vec![("item_id_list", id_list)];
        let body = self
            .call(
                Method::GET,
                "/api/v2/product/get_item_base_info",
                Some((&shop.access_token, shop_id)),
                &query,
                None,
            )
            .await?;
        let parsed: ItemInfoResponse = Self::parse_response(body)?;
        Ok(parsed.item_list)
    }

    async fn tracking_number(
        &self,
        shop_id: &str,
        order_sn: &str,
    ) -> Result<Option<String>, ShopeeApiError> {
        let shop = self.ensure_fresh_token(shop_id).await?;
        let query = vec![("order_sn", order_sn.to_string())];
        let body = self
            .call(
                Method::GET,
                "/api/v2/logistics/get_tracking_number",
                Some((&shop.access_token, shop_id)),
                &query,
                None,
            )
            .await?;
        let parsed: TrackingNumberResponse = Self::parse_response(body)?;
        Ok(parsed.tracking_number.filter(|t| !t.is_empty()))
    }
}
