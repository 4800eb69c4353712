use std::collections::HashMap;

use crate::shared::shopee::models::{OrderDetail, ReturnRecord};
use crate::usecases::u601_export_from_shopee::rows::{
    format_money, format_timestamp, is_failed_delivery, payment_method, NO_ITEM_PLACEHOLDER,
};

pub const RECORD_TYPE_RETURN: &str = "return";
pub const RECORD_TYPE_CANCELLED: &str = "cancelled_order";
pub const RECORD_TYPE_FAILED_DELIVERY: &str = "failed_delivery";

/// Сводный отчет: возвраты плюс отмененные заказы.
///
/// Обе половины несут поля заказа: возвраты берут их из
/// `return_details` по order_sn (нет детали — пустые значения),
/// отмененные заказы — из собственной детали. Отмена по вине
/// логистики помечается отдельным типом записи, чтобы в отчете она
/// не смешивалась с отменами покупателей.
pub fn flatten_combined(
    returns: &[ReturnRecord],
    return_details: &HashMap<String, OrderDetail>,
    cancelled_orders: &[OrderDetail],
) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    for record in returns {
        let detail = return_details.get(&record.order_sn);
        let reason = record
            .text_reason
            .clone()
            .filter(|r| !r.is_empty())
            .or_else(|| record.reason.clone())
            .unwrap_or_default();
        let base = [
            RECORD_TYPE_RETURN.to_string(),
            record.return_sn.clone(),
            record.order_sn.clone(),
            record.status.clone().unwrap_or_default(),
            reason,
            record
                .user
                .as_ref()
                .and_then(|u| u.username.clone())
                .unwrap_or_default(),
            format_money(record.refund_amount),
            record.currency.clone().unwrap_or_default(),
            format_timestamp(record.create_time),
            detail
                .map(|d| payment_method(d.cod, d.payment_method.as_deref()))
                .unwrap_or_default(),
            detail
                .and_then(|d| d.tracking_no.clone())
                .unwrap_or_default(),
        ];

        if record.item.is_empty() {
            let mut row = base.to_vec();
            row.extend([NO_ITEM_PLACEHOLDER.to_string(), String::new(), String::new()]);
            rows.push(row);
            continue;
        }
        for item in &record.item {
            let mut row = base.to_vec();
            row.extend([
                item.name.clone().unwrap_or_default(),
                item.variation_sku
                    .clone()
                    .filter(|s| !s.is_empty())
                    .or_else(|| item.item_sku.clone())
                    .unwrap_or_default(),
                item.amount.to_string(),
            ]);
            rows.push(row);
        }
    }

    for order in cancelled_orders {
        let cancel_reason = order.cancel_reason.clone().unwrap_or_default();
        let record_type = if is_failed_delivery(&cancel_reason) {
            RECORD_TYPE_FAILED_DELIVERY
        } else {
            RECORD_TYPE_CANCELLED
        };
        let base = [
            record_type.to_string(),
            order.order_sn.clone(),
            order.order_sn.clone(),
            order.order_status.clone().unwrap_or_default(),
            cancel_reason,
            order.buyer_username.clone().unwrap_or_default(),
            format_money(order.total_amount),
            order.currency.clone().unwrap_or_default(),
            format_timestamp(order.create_time),
            payment_method(order.cod, order.payment_method.as_deref()),
            order.tracking_no.clone().unwrap_or_default(),
        ];

        if order.item_list.is_empty() {
            let mut row = base.to_vec();
            row.extend([NO_ITEM_PLACEHOLDER.to_string(), String::new(), String::new()]);
            rows.push(row);
            continue;
        }
        for item in &order.item_list {
            let mut row = base.to_vec();
            row.extend([
                item.item_name.clone(),
                item.model_sku
                    .clone()
                    .filter(|s| !s.is_empty())
                    .or_else(|| item.item_sku.clone())
                    .unwrap_or_default(),
                item.model_quantity_purchased.to_string(),
            ]);
            rows.push(row);
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::u601_export_from_shopee::rows::COMBINED_COLUMNS;

    #[test]
    fn failed_delivery_is_separated_from_buyer_cancellation() {
        let cancelled = vec![
            OrderDetail {
                order_sn: "O-1".to_string(),
                order_status: Some("CANCELLED".to_string()),
                cancel_reason: Some("Buyer changed mind".to_string()),
                ..OrderDetail::default()
            },
            OrderDetail {
                order_sn: "O-2".to_string(),
                order_status: Some("CANCELLED".to_string()),
                cancel_reason: Some("Courier unable to deliver parcel".to_string()),
                ..OrderDetail::default()
            },
        ];

        let rows = flatten_combined(&[], &HashMap::new(), &cancelled);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], RECORD_TYPE_CANCELLED);
        assert_eq!(rows[1][0], RECORD_TYPE_FAILED_DELIVERY);
        for row in &rows {
            assert_eq!(row.len(), COMBINED_COLUMNS.len());
            assert_eq!(row[11], NO_ITEM_PLACEHOLDER);
        }
    }

    #[test]
    fn returns_come_before_cancellations() {
        let returns = vec![ReturnRecord {
            return_sn: "R-1".to_string(),
            order_sn: "O-9".to_string(),
            reason: Some("NOT_RECEIPT".to_string()),
            create_time: 1700000000,
            ..ReturnRecord::default()
        }];
        let cancelled = vec![OrderDetail {
            order_sn: "O-1".to_string(),
            ..OrderDetail::default()
        }];

        let rows = flatten_combined(&returns, &HashMap::new(), &cancelled);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], RECORD_TYPE_RETURN);
        assert_eq!(rows[0][1], "R-1");
        assert_eq!(rows[0][2], "O-9");
        assert_eq!(rows[1][0], RECORD_TYPE_CANCELLED);
    }

    #[test]
    fn return_rows_pull_order_fields_from_details() {
        let returns = vec![ReturnRecord {
            return_sn: "R-1".to_string(),
            order_sn: "O-9".to_string(),
            create_time: 1700000000,
            ..ReturnRecord::default()
        }];
        let mut details = HashMap::new();
        details.insert(
            "O-9".to_string(),
            OrderDetail {
                order_sn: "O-9".to_string(),
                payment_method: Some("ShopeePay".to_string()),
                tracking_no: Some("TRK-9".to_string()),
                ..OrderDetail::default()
            },
        );
        let cancelled = vec![OrderDetail {
            order_sn: "O-1".to_string(),
            cod: true,
            tracking_no: Some("TRK-1".to_string()),
            ..OrderDetail::default()
        }];

        let rows = flatten_combined(&returns, &details, &cancelled);
        assert_eq!(rows[0][9], "ShopeePay");
        assert_eq!(rows[0][10], "TRK-9");
        assert_eq!(rows[1][9], "Cash on Delivery");
        assert_eq!(rows[1][10], "TRK-1");
    }
}
