use serde::{Deserialize, Serialize};

// ============================================================================
// Общий конверт ответа Shopee API v2
// ============================================================================

/// Все v2-эндпоинты отвечают `{error, message, request_id, response}`.
/// Пустая строка в `error` означает успех.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub response: Option<serde_json::Value>,
}

// ============================================================================
// Авторизация
// ============================================================================

/// Ответ /auth/token/get и /auth/access_token/get.
/// ВАЖНО: токены приходят на верхнем уровне тела, не внутри response!
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Время жизни access_token в секундах (обычно 14400)
    pub expire_in: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShopInfoResponse {
    #[serde(default)]
    pub shop_name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

// ============================================================================
// Заказы: /order/get_order_list (курсорная пагинация) и /order/get_order_detail
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderListResponse {
    #[serde(default)]
    pub order_list: Vec<OrderSummary>,
    #[serde(default)]
    pub more: bool,
    #[serde(default)]
    pub next_cursor: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderSummary {
    pub order_sn: String,
    #[serde(default)]
    pub order_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderDetailResponse {
    #[serde(default)]
    pub order_list: Vec<OrderDetail>,
}

/// Полная запись заказа (запрошенные optional-поля включены)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order_sn: String,
    #[serde(default)]
    pub order_status: Option<String>,
    #[serde(default)]
    pub create_time: i64,
    #[serde(default)]
    pub update_time: Option<i64>,
    #[serde(default)]
    pub pay_time: Option<i64>,

    /// Наложенный платеж: из этого флага выводится способ оплаты
    #[serde(default)]
    pub cod: bool,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub buyer_username: Option<String>,
    #[serde(default)]
    pub recipient_address: Option<RecipientAddress>,
    #[serde(default)]
    pub shipping_carrier: Option<String>,
    /// Трек-номер, если Shopee вернул его прямо в деталях заказа
    #[serde(default)]
    pub tracking_no: Option<String>,

    #[serde(default)]
    pub cancel_reason: Option<String>,
    #[serde(default)]
    pub cancel_by: Option<String>,

    #[serde(default)]
    pub item_list: Vec<OrderItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipientAddress {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub full_address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub item_sku: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    /// SKU вариации — при наличии предпочитается SKU товара
    #[serde(default)]
    pub model_sku: Option<String>,
    #[serde(default)]
    pub model_quantity_purchased: i32,
    #[serde(default)]
    pub model_discounted_price: Option<f64>,
}

// ============================================================================
// Возвраты: /returns/get_return_list (page_no-пагинация)
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReturnListResponse {
    /// В ответе Shopee поле называется "return"
    #[serde(default, rename = "return")]
    pub returns: Vec<ReturnRecord>,
    #[serde(default)]
    pub more: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnRecord {
    pub return_sn: String,
    /// Ключ кросс-ссылки на заказ
    #[serde(default)]
    pub order_sn: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub text_reason: Option<String>,
    #[serde(default)]
    pub create_time: i64,
    #[serde(default)]
    pub update_time: Option<i64>,
    #[serde(default)]
    pub refund_amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub user: Option<ReturnUser>,
    #[serde(default)]
    pub item: Vec<ReturnItem>,
    #[serde(default)]
    pub due_date: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnUser {
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub item_sku: Option<String>,
    /// SKU вариации — при наличии предпочитается SKU товара
    #[serde(default)]
    pub variation_sku: Option<String>,
    #[serde(default)]
    pub amount: i32,
    #[serde(default)]
    pub item_price: Option<f64>,
}

// ============================================================================
// Товары: /product/get_item_list (offset) и /product/get_item_base_info
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemListResponse {
    #[serde(default)]
    pub item: Vec<ItemSummary>,
    #[serde(default)]
    pub total_count: Option<i64>,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub next_offset: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemSummary {
    pub item_id: i64,
    #[serde(default)]
    pub item_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemInfoResponse {
    #[serde(default)]
    pub item_list: Vec<ItemInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemInfo {
    pub item_id: i64,
    #[serde(default)]
    pub item_name: String,
    #[serde(default)]
    pub item_sku: Option<String>,
    #[serde(default)]
    pub item_status: Option<String>,
    #[serde(default)]
    pub create_time: i64,
    #[serde(default)]
    pub update_time: Option<i64>,
    #[serde(default)]
    pub price_info: Vec<PriceInfo>,
    #[serde(default)]
    pub stock_info_v2: Option<StockInfoV2>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceInfo {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub current_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockInfoV2 {
    #[serde(default)]
    pub summary_info: Option<StockSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StockSummary {
    #[serde(default)]
    pub total_available_stock: Option<i64>,
    #[serde(default)]
    pub total_reserved_stock: Option<i64>,
}

// ============================================================================
// Логистика: /logistics/get_tracking_number (по одному заказу)
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackingNumberResponse {
    #[serde(default)]
    pub tracking_number: Option<String>,
}
