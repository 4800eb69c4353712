use std::collections::HashMap;

use crate::shared::shopee::models::{OrderDetail, ReturnRecord};
use crate::usecases::u601_export_from_shopee::rows::{
    format_money, format_opt_timestamp, format_timestamp, payment_method, NO_ITEM_PLACEHOLDER,
};

/// Развертка возвратов в строки отчета.
///
/// Возврат с M позициями дает M строк с одинаковой шапкой; возврат
/// без позиций дает одну строку-заглушку — запись не теряется.
/// Шапка дополняется полями заказа из `order_details` (статус, способ
/// оплаты, трек-номер); возврат без найденной детали получает пустые
/// значения.
pub fn flatten_returns(
    records: &[ReturnRecord],
    order_details: &HashMap<String, OrderDetail>,
) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    for record in records {
        let detail = order_details.get(&record.order_sn);
        let base = |rows: &mut Vec<Vec<String>>, item: [String; 4]| {
            let mut row = vec![
                record.return_sn.clone(),
                record.order_sn.clone(),
                record.status.clone().unwrap_or_default(),
                record.reason.clone().unwrap_or_default(),
                record.text_reason.clone().unwrap_or_default(),
                record
                    .user
                    .as_ref()
                    .and_then(|u| u.username.clone())
                    .unwrap_or_default(),
                format_money(record.refund_amount),
                record.currency.clone().unwrap_or_default(),
                format_timestamp(record.create_time),
                format_opt_timestamp(record.update_time),
                detail
                    .and_then(|d| d.order_status.clone())
                    .unwrap_or_default(),
                detail
                    .map(|d| payment_method(d.cod, d.payment_method.as_deref()))
                    .unwrap_or_default(),
                detail
                    .and_then(|d| d.tracking_no.clone())
                    .unwrap_or_default(),
            ];
            row.extend(item);
            rows.push(row);
        };

        if record.item.is_empty() {
            base(
                &mut rows,
                [
                    NO_ITEM_PLACEHOLDER.to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                ],
            );
            continue;
        }

        for item in &record.item {
            let sku = item
                .variation_sku
                .clone()
                .filter(|s| !s.is_empty())
                .or_else(|| item.item_sku.clone())
                .unwrap_or_default();
            base(
                &mut rows,
                [
                    item.name.clone().unwrap_or_default(),
                    sku,
                    item.amount.to_string(),
                    format_money(item.item_price),
                ],
            );
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::shopee::models::{ReturnItem, ReturnUser};
    use crate::usecases::u601_export_from_shopee::rows::RETURN_COLUMNS;

    fn record_with_items(return_sn: &str, items: Vec<ReturnItem>) -> ReturnRecord {
        ReturnRecord {
            return_sn: return_sn.to_string(),
            order_sn: "O-1".to_string(),
            status: Some("ACCEPTED".to_string()),
            reason: Some("NOT_RECEIPT".to_string()),
            refund_amount: Some(25.0),
            currency: Some("SGD".to_string()),
            create_time: 1700000000,
            user: Some(ReturnUser {
                username: Some("buyer1".to_string()),
            }),
            item: items,
            ..ReturnRecord::default()
        }
    }

    #[test]
    fn each_item_becomes_a_row_with_shared_header() {
        let record = record_with_items(
            "R-1",
            vec![
                ReturnItem {
                    name: Some("Mug".to_string()),
                    item_sku: Some("MUG-1".to_string()),
                    variation_sku: Some("MUG-1-RED".to_string()),
                    amount: 2,
                    item_price: Some(5.0),
                },
                ReturnItem {
                    name: Some("Plate".to_string()),
                    item_sku: Some("PLATE-1".to_string()),
                    variation_sku: None,
                    amount: 1,
                    item_price: Some(15.0),
                },
            ],
        );

        let rows = flatten_returns(&[record], &HashMap::new());
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.len(), RETURN_COLUMNS.len());
            assert_eq!(row[0], "R-1");
            assert_eq!(row[1], "O-1");
        }
        // SKU вариации предпочтительнее SKU товара
        assert_eq!(rows[0][14], "MUG-1-RED");
        assert_eq!(rows[1][14], "PLATE-1");
        assert_eq!(rows[0][15], "2");
    }

    #[test]
    fn return_without_items_keeps_one_placeholder_row() {
        let rows = flatten_returns(&[record_with_items("R-2", vec![])], &HashMap::new());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][13], NO_ITEM_PLACEHOLDER);
        assert_eq!(rows[0][15], "");
    }

    #[test]
    fn order_detail_fields_are_cross_referenced() {
        let mut details = HashMap::new();
        details.insert(
            "O-1".to_string(),
            OrderDetail {
                order_sn: "O-1".to_string(),
                order_status: Some("COMPLETED".to_string()),
                cod: true,
                tracking_no: Some("TRK-9".to_string()),
                ..OrderDetail::default()
            },
        );

        let rows = flatten_returns(&[record_with_items("R-1", vec![])], &details);
        assert_eq!(rows[0][10], "COMPLETED");
        assert_eq!(rows[0][11], "Cash on Delivery");
        assert_eq!(rows[0][12], "TRK-9");
    }

    #[test]
    fn missing_order_detail_leaves_order_fields_empty() {
        let rows = flatten_returns(&[record_with_items("R-1", vec![])], &HashMap::new());
        assert_eq!(rows[0][10], "");
        assert_eq!(rows[0][11], "");
        assert_eq!(rows[0][12], "");
    }

    #[test]
    fn flattening_is_idempotent() {
        let records = vec![record_with_items("R-3", vec![])];
        assert_eq!(
            flatten_returns(&records, &HashMap::new()),
            flatten_returns(&records, &HashMap::new())
        );
    }
}
