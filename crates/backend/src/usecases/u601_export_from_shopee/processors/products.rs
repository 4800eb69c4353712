use crate::shared::shopee::models::ItemInfo;
use crate::usecases::u601_export_from_shopee::rows::{
    format_money, format_opt_timestamp, format_timestamp,
};

/// Развертка каталога товаров: одна строка на товар
pub fn flatten_products(items: &[ItemInfo]) -> Vec<Vec<String>> {
    items
        .iter()
        .map(|item| {
            let price = item.price_info.first();
            let stock = item
                .stock_info_v2
                .as_ref()
                .and_then(|s| s.summary_info.as_ref());
            vec![
                item.item_id.to_string(),
                item.item_name.clone(),
                item.item_sku.clone().unwrap_or_default(),
                item.item_status.clone().unwrap_or_default(),
                price.and_then(|p| p.currency.clone()).unwrap_or_default(),
                format_money(price.and_then(|p| p.original_price)),
                format_money(price.and_then(|p| p.current_price)),
                stock
                    .and_then(|s| s.total_available_stock)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                stock
                    .and_then(|s| s.total_reserved_stock)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                format_timestamp(item.create_time),
                format_opt_timestamp(item.update_time),
            ]
        })
        .collect()
}
