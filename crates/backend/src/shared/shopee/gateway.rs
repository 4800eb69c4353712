use async_trait::async_trait;

use super::error::ShopeeApiError;
use super::models::{
    ItemInfo, ItemListResponse, OrderDetail, OrderListResponse, ReturnListResponse,
};

/// Шов между конвейером экспорта и HTTP-клиентом Shopee.
///
/// Реальная реализация — `ShopeeClient` (подпись, повторы, refresh токена);
/// в тестах конвейер гоняется против считающих вызовы заглушек.
#[async_trait]
pub trait ShopeeGateway: Send + Sync {
    /// Список заказов за период, курсорная пагинация
    async fn order_list(
        &self,
        shop_id: &str,
        time_from: i64,
        time_to: i64,
        cursor: &str,
        page_size: u32,
    ) -> Result<OrderListResponse, ShopeeApiError>;

    /// Детали заказов, не более 50 order_sn за вызов
    async fn order_detail(
        &self,
        shop_id: &str,
        order_sn_list: &[String],
    ) -> Result<Vec<OrderDetail>, ShopeeApiError>;

    /// Список возвратов за период, page_no-пагинация (страницы с 1)
    async fn return_list(
        &self,
        shop_id: &str,
        time_from: i64,
        time_to: i64,
        page_no: u32,
        page_size: u32,
    ) -> Result<ReturnListResponse, ShopeeApiError>;

    /// Список товаров, offset-пагинация (дат не принимает)
    async fn item_list(
        &self,
        shop_id: &str,
        offset: i64,
        page_size: u32,
    ) -> Result<ItemListResponse, ShopeeApiError>;

    /// Детали товаров, не более 50 item_id за вызов
    async fn item_base_info(
        &self,
        shop_id: &str,
        item_ids: &[i64],
    ) -> Result<Vec<ItemInfo>, ShopeeApiError>;

    /// Трек-номер одного заказа (batch-эндпоинта у Shopee нет)
    async fn tracking_number(
        &self,
        shop_id: &str,
        order_sn: &str,
    ) -> Result<Option<String>, ShopeeApiError>;
}
