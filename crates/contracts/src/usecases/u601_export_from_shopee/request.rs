use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Запрос на экспорт данных магазина Shopee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRequest {
    /// ID подключенного магазина
    pub shop_id: String,

    /// Какие данные выгружать
    pub data_type: DataType,

    /// Начало периода (включительно)
    pub date_from: NaiveDate,

    /// Конец периода (включительно)
    pub date_to: NaiveDate,
}

/// Тип выгружаемых данных
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Возвраты и запросы на возврат средств
    Returns,

    /// Заказы
    Orders,

    /// Товары (список товаров не фильтруется по датам на стороне Shopee)
    Products,

    /// Сводный отчет: возвраты + отмененные заказы + неудачные доставки
    Combined,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Returns => "returns",
            Self::Orders => "orders",
            Self::Products => "products",
            Self::Combined => "combined",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Returns => "Возвраты",
            Self::Orders => "Заказы",
            Self::Products => "Товары",
            Self::Combined => "Сводный отчет",
        }
    }
}
