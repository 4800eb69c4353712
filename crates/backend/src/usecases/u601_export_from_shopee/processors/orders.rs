use crate::shared::shopee::models::OrderDetail;
use crate::usecases::u601_export_from_shopee::rows::{
    format_money, format_opt_timestamp, format_timestamp, payment_method, NO_ITEM_PLACEHOLDER,
};

/// Развертка заказов в строки отчета: M позиций — M строк,
/// заказ без позиций — одна строка-заглушка.
pub fn flatten_orders(orders: &[OrderDetail]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    for order in orders {
        let recipient = order.recipient_address.as_ref();
        let base = |rows: &mut Vec<Vec<String>>, item: [String; 5]| {
            let mut row = vec![
                order.order_sn.clone(),
                order.order_status.clone().unwrap_or_default(),
                format_timestamp(order.create_time),
                format_opt_timestamp(order.pay_time),
                payment_method(order.cod, order.payment_method.as_deref()),
                format_money(order.total_amount),
                order.currency.clone().unwrap_or_default(),
                order.buyer_username.clone().unwrap_or_default(),
                recipient.and_then(|r| r.name.clone()).unwrap_or_default(),
                recipient.and_then(|r| r.phone.clone()).unwrap_or_default(),
                recipient.and_then(|r| r.city.clone()).unwrap_or_default(),
                recipient.and_then(|r| r.state.clone()).unwrap_or_default(),
                order.shipping_carrier.clone().unwrap_or_default(),
                order.tracking_no.clone().unwrap_or_default(),
                order.cancel_reason.clone().unwrap_or_default(),
                order.cancel_by.clone().unwrap_or_default(),
            ];
            row.extend(item);
            rows.push(row);
        };

        if order.item_list.is_empty() {
            base(
                &mut rows,
                [
                    NO_ITEM_PLACEHOLDER.to_string(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                ],
            );
            continue;
        }

        for item in &order.item_list {
            let sku = item
                .model_sku
                .clone()
                .filter(|s| !s.is_empty())
                .or_else(|| item.item_sku.clone())
                .unwrap_or_default();
            base(
                &mut rows,
                [
                    item.item_name.clone(),
                    sku,
                    item.model_name.clone().unwrap_or_default(),
                    item.model_quantity_purchased.to_string(),
                    format_money(item.model_discounted_price),
                ],
            );
        }
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::shopee::models::{OrderItem, RecipientAddress};
    use crate::usecases::u601_export_from_shopee::rows::ORDER_COLUMNS;

    fn order(order_sn: &str, items: Vec<OrderItem>) -> OrderDetail {
        OrderDetail {
            order_sn: order_sn.to_string(),
            order_status: Some("COMPLETED".to_string()),
            create_time: 1700000000,
            cod: true,
            total_amount: Some(30.0),
            currency: Some("SGD".to_string()),
            buyer_username: Some("buyer1".to_string()),
            recipient_address: Some(RecipientAddress {
                name: Some("Alex".to_string()),
                city: Some("Singapore".to_string()),
                ..RecipientAddress::default()
            }),
            tracking_no: Some("TRK-9".to_string()),
            item_list: items,
            ..OrderDetail::default()
        }
    }

    #[test]
    fn items_expand_into_rows() {
        let rows = flatten_orders(&[order(
            "O-1",
            vec![
                OrderItem {
                    item_name: "Mug".to_string(),
                    item_sku: Some("MUG-1".to_string()),
                    model_sku: Some("MUG-1-RED".to_string()),
                    model_quantity_purchased: 3,
                    ..OrderItem::default()
                },
                OrderItem {
                    item_name: "Plate".to_string(),
                    item_sku: Some("PLATE-1".to_string()),
                    model_sku: Some(String::new()),
                    model_quantity_purchased: 1,
                    ..OrderItem::default()
                },
            ],
        )]);

        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.len(), ORDER_COLUMNS.len());
            assert_eq!(row[0], "O-1");
            assert_eq!(row[4], "Cash on Delivery");
            assert_eq!(row[13], "TRK-9");
        }
        assert_eq!(rows[0][17], "MUG-1-RED");
        // Пустой SKU вариации откатывается на SKU товара
        assert_eq!(rows[1][17], "PLATE-1");
        assert_eq!(rows[0][19], "3");
    }

    #[test]
    fn order_without_items_keeps_one_placeholder_row() {
        let rows = flatten_orders(&[order("O-2", vec![])]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][16], NO_ITEM_PLACEHOLDER);
    }
}
