use chrono::DateTime;
use contracts::usecases::u601_export_from_shopee::DataType;

/// Заглушка для записей без товарных позиций: строка в отчете
/// появляется всегда, даже если API не вернул состав.
pub const NO_ITEM_PLACEHOLDER: &str = "no item data";

pub const RETURN_COLUMNS: &[&str] = &[
    "Return SN",
    "Order SN",
    "Status",
    "Reason",
    "Detailed Reason",
    "Buyer",
    "Refund Amount",
    "Currency",
    "Created",
    "Updated",
    "Order Status",
    "Payment Method",
    "Tracking Number",
    "Item Name",
    "Item SKU",
    "Quantity",
    "Item Price",
];

pub const ORDER_COLUMNS: &[&str] = &[
    "Order SN",
    "Status",
    "Created",
    "Paid",
    "Payment Method",
    "Total Amount",
    "Currency",
    "Buyer",
    "Recipient",
    "Phone",
    "City",
    "State",
    "Shipping Carrier",
    "Tracking Number",
    "Cancel Reason",
    "Cancelled By",
    "Item Name",
    "Item SKU",
    "Model",
    "Quantity",
    "Item Price",
];

pub const PRODUCT_COLUMNS: &[&str] = &[
    "Item ID",
    "Item Name",
    "Item SKU",
    "Status",
    "Currency",
    "Original Price",
    "Current Price",
    "Available Stock",
    "Reserved Stock",
    "Created",
    "Updated",
];

pub const COMBINED_COLUMNS: &[&str] = &[
    "Record Type",
    "Reference SN",
    "Order SN",
    "Status",
    "Reason",
    "Buyer",
    "Amount",
    "Currency",
    "Date",
    "Payment Method",
    "Tracking Number",
    "Item Name",
    "Item SKU",
    "Quantity",
];

pub fn columns_for(data_type: DataType) -> &'static [&'static str] {
    match data_type {
        DataType::Returns => RETURN_COLUMNS,
        DataType::Orders => ORDER_COLUMNS,
        DataType::Products => PRODUCT_COLUMNS,
        DataType::Combined => COMBINED_COLUMNS,
    }
}

/// Причины отмены, по которым отмененный заказ считается неудачной доставкой
const FAILED_DELIVERY_KEYWORDS: &[&str] = &[
    "courier",
    "delivery failed",
    "failed delivery",
    "unable to deliver",
    "logistics",
];

/// Неудачная доставка: отмена по вине логистики, не покупателя
pub fn is_failed_delivery(cancel_reason: &str) -> bool {
    let reason = cancel_reason.to_lowercase();
    FAILED_DELIVERY_KEYWORDS.iter().any(|kw| reason.contains(kw))
}

/// Unix-время в читаемую строку; 0 и отрицательные значения — пусто
pub fn format_timestamp(ts: i64) -> String {
    if ts <= 0 {
        return String::new();
    }
    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

pub fn format_opt_timestamp(ts: Option<i64>) -> String {
    ts.map(format_timestamp).unwrap_or_default()
}

pub fn format_money(amount: Option<f64>) -> String {
    amount.map(|a| format!("{a:.2}")).unwrap_or_default()
}

/// Способ оплаты: явное значение из API, иначе выводится из флага COD
pub fn payment_method(cod: bool, explicit: Option<&str>) -> String {
    match explicit {
        Some(method) if !method.is_empty() => method.to_string(),
        _ if cod => "Cash on Delivery".to_string(),
        _ => "Online Payment".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_delivery_matches_keywords_case_insensitively() {
        assert!(is_failed_delivery("Courier was unable to reach the buyer"));
        assert!(is_failed_delivery("FAILED DELIVERY"));
        assert!(is_failed_delivery("Logistics issue"));
        assert!(!is_failed_delivery("Buyer changed mind"));
        assert!(!is_failed_delivery(""));
    }

    #[test]
    fn timestamps_format_or_stay_empty() {
        assert_eq!(format_timestamp(1700000000), "2023-11-14 22:13:20");
        assert_eq!(format_timestamp(0), "");
        assert_eq!(format_timestamp(-5), "");
        assert_eq!(format_opt_timestamp(None), "");
    }

    #[test]
    fn payment_method_prefers_explicit_value() {
        assert_eq!(payment_method(true, Some("ShopeePay")), "ShopeePay");
        assert_eq!(payment_method(true, Some("")), "Cash on Delivery");
        assert_eq!(payment_method(true, None), "Cash on Delivery");
        assert_eq!(payment_method(false, None), "Online Payment");
    }

    #[test]
    fn money_is_rendered_with_two_decimals() {
        assert_eq!(format_money(Some(12.5)), "12.50");
        assert_eq!(format_money(None), "");
    }
}
